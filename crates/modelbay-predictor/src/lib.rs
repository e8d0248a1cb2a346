//! ModelBay Predictor
//!
//! Image predictor plugin for the ModelBay serving platform: acquires a
//! model's artifacts with checksum verification, loads them into an
//! external inference engine, runs batched predictions, and decodes the
//! flat engine output back into per-sample ranked features.
//!
//! The numerical engine and the artifact transport are consumed through the
//! boundary traits in `modelbay-core`; this crate owns everything around
//! them: the lifecycle state machine, the caching discipline, the batch
//! bookkeeping, and best-effort profiling capture.

pub mod artifacts;
pub mod decode;
pub mod predictor;
pub mod preprocess;
pub mod profiling;
pub mod registry;

pub use artifacts::{ArtifactSet, ArtifactStore};
pub use decode::decode_batch;
pub use predictor::{BaseModel, ImagePredictor, LifecycleState, PredictorConfig};
pub use preprocess::{PreprocessOptions, DEFAULT_OUTPUT_LAYER};
pub use profiling::{profiling_enabled, ProfilingCapture};
pub use registry::{
    ImagePredictorFactory, PredictorFactory, PredictorRegistry, SharedPredictorRegistry,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactSet, ArtifactStore};
    pub use crate::predictor::{ImagePredictor, LifecycleState, PredictorConfig};
    pub use crate::preprocess::PreprocessOptions;
    pub use crate::registry::{ImagePredictorFactory, PredictorRegistry};
    pub use modelbay_core::prelude::*;
}
