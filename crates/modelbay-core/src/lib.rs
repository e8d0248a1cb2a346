//! ModelBay Core
//!
//! Shared types and boundary traits for the ModelBay predictor platform.
//!
//! This crate provides:
//! - The model-manifest data model with fallible named accessors
//! - Error types and result handling
//! - The inference-engine and artifact-transport boundary traits
//! - Ranked feature types returned by predictors

pub mod engine;
pub mod error;
pub mod features;
pub mod manifest;
pub mod transport;

pub use engine::{EngineHandle, InferenceEngine};
pub use error::{Error, Result};
pub use features::{Feature, FeatureList};
pub use manifest::{
    ColorMode, FrameworkManifest, MeanSpec, ModelInput, ModelManifest, PixelLayout,
};
pub use transport::{ArtifactTransport, HttpTransport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{EngineHandle, InferenceEngine};
    pub use crate::error::{Error, Result};
    pub use crate::features::{Feature, FeatureList};
    pub use crate::manifest::{ColorMode, FrameworkManifest, ModelManifest, PixelLayout};
    pub use crate::transport::{ArtifactTransport, HttpTransport};
}
