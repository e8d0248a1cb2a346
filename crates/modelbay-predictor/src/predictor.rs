//! Image predictor lifecycle
//!
//! One [`ImagePredictor`] owns one loaded model: its artifacts, its label
//! table, and the engine handle behind it. The lifecycle is a strict linear
//! progression (unloaded, loaded/idle, closed) and every external boundary
//! (transport, filesystem, engine) may fail without corrupting it:
//! a failed load leaves the predictor unloaded with no engine held, a failed
//! predict leaves it idle and reusable.
//!
//! `&mut self` on `load`/`predict`/`close` makes serialized use of the
//! single-threaded engine handle a compile-time property; independent
//! predictor instances share nothing and may run fully in parallel.

use crate::artifacts::{ArtifactSet, ArtifactStore};
use crate::decode::decode_batch;
use crate::preprocess::{PreprocessOptions, DEFAULT_OUTPUT_LAYER};
use crate::profiling::ProfilingCapture;
use modelbay_core::engine::{EngineHandle, InferenceEngine};
use modelbay_core::error::{Error, Result};
use modelbay_core::features::FeatureList;
use modelbay_core::manifest::{FrameworkManifest, ModelManifest};
use modelbay_core::transport::ArtifactTransport;
use modelbay_telemetry::{MetricsCollector, TraceEvent, TraceLevel, TraceSink};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Explicit, immutable predictor configuration.
///
/// Every recognized option is a named field; nothing is smuggled through
/// variadic option lists or process-global flags.
#[derive(Debug, Clone, Default)]
pub struct PredictorConfig {
    /// Output layer override; manifest value, then the framework default,
    /// apply when absent
    pub output_layer: Option<String>,

    /// Work directory override; a cache-rooted per-model directory applies
    /// when absent
    pub work_dir: Option<PathBuf>,

    /// Capture framework-level engine profiles around predict calls
    pub framework_profiling: bool,

    /// Active trace granularity; profiling requires at least
    /// [`TraceLevel::Framework`]
    pub trace_level: TraceLevel,
}

impl PredictorConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the evaluated output layer
    pub fn with_output_layer(mut self, layer: impl Into<String>) -> Self {
        self.output_layer = Some(layer.into());
        self
    }

    /// Override the artifact work directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Enable framework profiling capture
    pub fn with_framework_profiling(mut self, enable: bool) -> Self {
        self.framework_profiling = enable;
        self
    }

    /// Set the active trace level
    pub fn with_trace_level(mut self, level: TraceLevel) -> Self {
        self.trace_level = level;
        self
    }
}

/// Shared identity and configuration of one predictor instance
#[derive(Debug, Clone)]
pub struct BaseModel {
    framework: FrameworkManifest,
    manifest: ModelManifest,
    work_dir: PathBuf,
    config: PredictorConfig,
}

impl BaseModel {
    fn new(manifest: ModelManifest, config: PredictorConfig) -> Self {
        let framework = manifest.framework.clone();
        let work_dir = config
            .work_dir
            .clone()
            .unwrap_or_else(|| default_work_dir(&framework, &manifest));
        Self {
            framework,
            manifest,
            work_dir,
            config,
        }
    }
}

/// Per-model artifact directory under the user cache when none is supplied
fn default_work_dir(framework: &FrameworkManifest, manifest: &ModelManifest) -> PathBuf {
    let cache = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    cache
        .join("modelbay")
        .join(framework.name.to_lowercase())
        .join(&manifest.name)
        .join(&manifest.version)
}

/// Observable lifecycle state of a predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, nothing acquired, no engine held
    Unloaded,
    /// Loaded and ready to predict
    Idle,
    /// Closed, terminal
    Closed,
}

/// Predictor for models with a single image input
pub struct ImagePredictor {
    base: BaseModel,
    artifacts: Option<ArtifactSet>,
    labels: Vec<String>,
    input_dims: Vec<u32>,
    handle: Option<Box<dyn EngineHandle>>,
    closed: bool,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for ImagePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePredictor")
            .field("base", &self.base)
            .field("artifacts", &self.artifacts)
            .field("labels", &self.labels)
            .field("input_dims", &self.input_dims)
            .field("handle", &self.handle.as_ref().map(|_| "EngineHandle"))
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ImagePredictor {
    /// Validate the manifest and construct an unloaded predictor.
    ///
    /// The manifest must declare exactly one input of type "image"; anything
    /// else is rejected here, before the filesystem is ever touched.
    pub fn new(manifest: ModelManifest, config: PredictorConfig) -> Result<Self> {
        if manifest.inputs.len() != 1 {
            return Err(Error::unsupported_input(format!(
                "number of inputs not supported: {}",
                manifest.inputs.len()
            )));
        }
        if !manifest.inputs[0].kind.eq_ignore_ascii_case("image") {
            return Err(Error::unsupported_input(format!(
                "input type not supported: {}",
                manifest.inputs[0].kind
            )));
        }

        Ok(Self {
            base: BaseModel::new(manifest, config),
            artifacts: None,
            labels: Vec::new(),
            input_dims: Vec::new(),
            handle: None,
            closed: false,
            metrics: MetricsCollector::new(),
        })
    }

    /// Framework identity this predictor serves
    pub fn framework(&self) -> &FrameworkManifest {
        &self.base.framework
    }

    /// The manifest this predictor was built from
    pub fn manifest(&self) -> &ModelManifest {
        &self.base.manifest
    }

    /// Work directory artifacts are acquired into
    pub fn work_dir(&self) -> &Path {
        &self.base.work_dir
    }

    /// Loaded label table; empty before load
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Acquired artifact paths; `None` before load
    pub fn artifacts(&self) -> Option<&ArtifactSet> {
        self.artifacts.as_ref()
    }

    /// Metrics collected by this predictor
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        if self.closed {
            LifecycleState::Closed
        } else if self.handle.is_some() {
            LifecycleState::Idle
        } else {
            LifecycleState::Unloaded
        }
    }

    /// Preprocessing the caller must apply before predict.
    ///
    /// Derived from the manifest on demand; available before load so
    /// compatibility can be checked without committing to a download.
    pub fn preprocess_options(&self) -> Result<PreprocessOptions> {
        PreprocessOptions::describe(&self.base.manifest)
    }

    /// Output layer to evaluate: config override, then manifest, then the
    /// framework default
    pub fn output_layer(&self) -> &str {
        self.base
            .config
            .output_layer
            .as_deref()
            .or_else(|| self.base.manifest.output_layer_name())
            .unwrap_or(DEFAULT_OUTPUT_LAYER)
    }

    /// Acquire artifacts, read the label table, and open the engine.
    ///
    /// On any failure the predictor stays unloaded and holds no engine;
    /// artifacts already on disk are left in place for a retry.
    pub async fn load(
        &mut self,
        engine: &dyn InferenceEngine,
        transport: &dyn ArtifactTransport,
        sink: &dyn TraceSink,
    ) -> Result<()> {
        match self.state() {
            LifecycleState::Closed => return Err(Error::Closed),
            LifecycleState::Idle => return Err(Error::AlreadyLoaded),
            LifecycleState::Unloaded => {}
        }

        let store = ArtifactStore::with_metrics(self.metrics.clone());
        let artifacts = store
            .acquire(&self.base.manifest, &self.base.work_dir, transport, sink)
            .await?;

        // Validates mean/scale/dimension metadata before the engine is
        // involved.
        PreprocessOptions::describe(&self.base.manifest)?;

        sink.record_event(
            TraceEvent::start("LoadPredictor")
                .with_attribute("graph_path", artifacts.graph_path.display().to_string()),
        );
        let result = self.load_engine(engine, &artifacts).await;
        sink.record_event(TraceEvent::end("LoadPredictor"));

        result?;
        self.artifacts = Some(artifacts);
        info!(
            model = %self.base.manifest.name,
            labels = self.labels.len(),
            "predictor loaded"
        );
        Ok(())
    }

    async fn load_engine(
        &mut self,
        engine: &dyn InferenceEngine,
        artifacts: &ArtifactSet,
    ) -> Result<()> {
        let labels = read_label_table(&artifacts.features_path).await?;
        let input_dims = self.base.manifest.image_dimensions()?;

        let handle = engine
            .open(&artifacts.graph_path, self.output_layer())
            .await?;

        // The handle is the last thing assigned, so no engine resource can
        // outlive a failed load.
        self.labels = labels;
        self.input_dims = input_dims;
        self.handle = Some(handle);
        Ok(())
    }

    /// Run batched inference and decode per-sample ranked features.
    ///
    /// `batch` is an ordered sequence of per-sample flattened image tensors,
    /// already preprocessed per [`Self::preprocess_options`]. Sample order
    /// determines output order. Engine failures propagate unchanged and
    /// leave the predictor idle.
    pub async fn predict(
        &mut self,
        batch: &[Vec<f32>],
        sink: &dyn TraceSink,
    ) -> Result<Vec<FeatureList>> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.handle.is_none() {
            return Err(Error::NotLoaded);
        }
        if batch.is_empty() {
            return Err(Error::prediction("empty batch"));
        }

        let output_layer = self.output_layer().to_string();
        let handle = self.handle.as_mut().ok_or(Error::NotLoaded)?;

        let mut flat = Vec::with_capacity(batch.iter().map(Vec::len).sum());
        for sample in batch {
            flat.extend_from_slice(sample);
        }

        sink.record_event(
            TraceEvent::start("Predict")
                .with_attribute("model", self.base.manifest.name.clone())
                .with_attribute("batch_size", batch.len().to_string())
                .with_attribute("output_layer", output_layer.clone()),
        );

        let capture = ProfilingCapture::begin(
            handle.as_mut(),
            &self.base.framework.name,
            self.base.config.framework_profiling,
            self.base.config.trace_level,
        );

        let started = Instant::now();
        let prediction = handle
            .predict(&flat, &output_layer, &self.input_dims)
            .await;

        capture.finish(handle.as_mut(), sink, &self.metrics);
        sink.record_event(TraceEvent::end("Predict"));

        let flat_output = prediction?;
        let decoded = decode_batch(&flat_output, batch.len(), &self.labels)?;
        self.metrics
            .record_prediction(started.elapsed().as_micros() as u64);
        Ok(decoded)
    }

    /// Release the engine handle. Safe to call more than once; calls after
    /// the first are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(mut handle) = self.handle.take() {
            handle.close()?;
        }
        Ok(())
    }
}

impl Drop for ImagePredictor {
    fn drop(&mut self) {
        // Last-resort release for callers that never closed explicitly.
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.close() {
                tracing::warn!(error = %e, "engine close failed during drop");
            }
        }
    }
}

/// Read the label table: one label per line, blank lines skipped
async fn read_label_table(path: &Path) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::artifact_fetch(
            path.display().to_string(),
            format!("cannot read features file: {}", e),
        )
    })?;
    Ok(contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
