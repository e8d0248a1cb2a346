//! Artifact transport boundary
//!
//! Everything beneath "fetch this URL to this path" lives behind
//! [`ArtifactTransport`]: HTTP client choice, retries, timeouts. The
//! predictor inherits whatever policy the transport implements and layers
//! nothing on top; cancellation propagates by dropping the returned future.

use crate::error::{Error, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Boundary for acquiring remote model artifacts
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    /// Fetch a single file to `dest`, replacing any existing content
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()>;

    /// Fetch a gzipped tar archive and extract it into `dest_dir`
    async fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()>;
}

/// HTTP transport backed by reqwest
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport around a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_bytes_to(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::artifact_fetch(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::artifact_fetch(url, e.to_string()))?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream through a temp file so a failed fetch never leaves a
        // truncated artifact at the destination path.
        let tmp = dest.with_extension("partial");
        let mut file = tokio::fs::File::create(&tmp).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::artifact_fetch(url, e.to_string()))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, dest).await?;
        Ok(())
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactTransport for HttpTransport {
    async fn fetch_file(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::debug!("fetching {} -> {}", url, dest.display());
        self.fetch_bytes_to(url, dest).await
    }

    async fn fetch_and_extract(&self, url: &str, dest_dir: &Path) -> Result<()> {
        tracing::debug!("fetching archive {} -> {}", url, dest_dir.display());
        tokio::fs::create_dir_all(dest_dir).await?;

        let archive_path = dest_dir.join(".artifact-download.tar.gz");
        self.fetch_bytes_to(url, &archive_path).await?;

        // Tar extraction is synchronous; hand it to the blocking pool.
        let url_owned = url.to_string();
        let dir = dest_dir.to_path_buf();
        let archive = archive_path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = std::fs::File::open(&archive)?;
            let decompressor = flate2::read::GzDecoder::new(file);
            let mut tar = tar::Archive::new(decompressor);
            tar.unpack(&dir)
                .map_err(|e| Error::artifact_fetch(&url_owned, e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::artifact_fetch(url, e.to_string()))??;

        tokio::fs::remove_file(&archive_path).await.ok();
        Ok(())
    }
}
