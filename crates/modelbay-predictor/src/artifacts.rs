//! Artifact acquisition with checksum-keyed caching
//!
//! Artifacts are content-addressed: an on-disk file whose hash matches the
//! manifest checksum is the artifact, regardless of how it got there. A
//! stale or corrupted file is re-fetched; a manifest without a checksum is
//! refused outright rather than trusted.

use modelbay_core::error::{Error, Result};
use modelbay_core::manifest::ModelManifest;
use modelbay_core::transport::ArtifactTransport;
use modelbay_telemetry::{MetricsCollector, TraceEvent, TraceSink};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Local paths of a model's acquired artifacts.
///
/// Populated once by [`ArtifactStore::acquire`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Serialized graph definition
    pub graph_path: PathBuf,

    /// Label list, one label per line
    pub features_path: PathBuf,
}

/// Acquires and verifies a model's artifacts under a work directory
pub struct ArtifactStore {
    metrics: MetricsCollector,
}

impl ArtifactStore {
    /// Create a store with its own metrics collector
    pub fn new() -> Self {
        Self {
            metrics: MetricsCollector::new(),
        }
    }

    /// Create a store reporting into a shared metrics collector
    pub fn with_metrics(metrics: MetricsCollector) -> Self {
        Self { metrics }
    }

    /// Metrics collected by this store
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Resolve the manifest's required files to verified local paths.
    ///
    /// The work directory is assumed exclusive to one model instance;
    /// concurrent acquisition into a shared directory is a caller concern.
    pub async fn acquire(
        &self,
        manifest: &ModelManifest,
        work_dir: &Path,
        transport: &dyn ArtifactTransport,
        sink: &dyn TraceSink,
    ) -> Result<ArtifactSet> {
        let graph_path = manifest.graph_path(work_dir)?;
        let features_path = manifest.features_path(work_dir)?;

        sink.record_event(
            TraceEvent::start("Download")
                .with_attribute("graph_url", manifest.graph_url().unwrap_or(""))
                .with_attribute("target_graph_file", graph_path.display().to_string())
                .with_attribute("feature_url", manifest.features_url().unwrap_or(""))
                .with_attribute("target_feature_file", features_path.display().to_string()),
        );

        let result = self
            .acquire_inner(manifest, work_dir, &graph_path, &features_path, transport)
            .await;

        sink.record_event(TraceEvent::end("Download"));
        result
    }

    async fn acquire_inner(
        &self,
        manifest: &ModelManifest,
        work_dir: &Path,
        graph_path: &Path,
        features_path: &Path,
        transport: &dyn ArtifactTransport,
    ) -> Result<ArtifactSet> {
        if manifest.is_archive() {
            let base_url = manifest.base_url()?;
            tracing::info!("downloading model archive from {}", base_url);
            transport.fetch_and_extract(base_url, work_dir).await?;
            self.metrics.record_download();
            return Ok(ArtifactSet {
                graph_path: graph_path.to_path_buf(),
                features_path: features_path.to_path_buf(),
            });
        }

        let graph_checksum = manifest.graph_checksum()?;
        self.fetch_verified(manifest.graph_url()?, graph_path, graph_checksum, transport)
            .await?;

        let features_checksum = manifest.features_checksum()?;
        self.fetch_verified(
            manifest.features_url()?,
            features_path,
            features_checksum,
            transport,
        )
        .await?;

        Ok(ArtifactSet {
            graph_path: graph_path.to_path_buf(),
            features_path: features_path.to_path_buf(),
        })
    }

    /// Fetch one file unless a copy with the expected checksum already
    /// exists, and verify the checksum after any fetch.
    async fn fetch_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_checksum: &str,
        transport: &dyn ArtifactTransport,
    ) -> Result<()> {
        if matches_checksum(dest, expected_checksum).await? {
            tracing::debug!("checksum cache hit for {}", dest.display());
            self.metrics.record_cache_hit();
            return Ok(());
        }

        tracing::info!("downloading {} -> {}", url, dest.display());
        transport.fetch_file(url, dest).await?;
        self.metrics.record_download();

        if !matches_checksum(dest, expected_checksum).await? {
            return Err(Error::artifact_fetch(
                url,
                format!(
                    "checksum mismatch after fetch, expected {} at {}",
                    expected_checksum,
                    dest.display()
                ),
            ));
        }
        Ok(())
    }
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the file at `path` exists with the expected SHA-256 hex digest
async fn matches_checksum(path: &Path, expected: &str) -> Result<bool> {
    match tokio::fs::read(path).await {
        Ok(contents) => {
            let mut hasher = Sha256::new();
            hasher.update(&contents);
            let digest = format!("{:x}", hasher.finalize());
            Ok(digest.eq_ignore_ascii_case(expected))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// SHA-256 hex digest of a byte buffer, the checksum format manifests carry
pub fn checksum_of(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}
