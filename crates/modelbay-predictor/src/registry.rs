//! Predictor registry
//!
//! Hosts construct one registry at startup and register each framework's
//! predictor factory explicitly. Registration is an ordinary call on an
//! ordinary value, not a side effect of linking a module, so a host can see
//! and test exactly which frameworks it serves.

use crate::predictor::{ImagePredictor, PredictorConfig};
use modelbay_core::error::{Error, Result};
use modelbay_core::manifest::{FrameworkManifest, ModelManifest};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructs predictors for one framework
pub trait PredictorFactory: Send + Sync {
    /// Build an unloaded predictor for a manifest
    fn new_predictor(
        &self,
        manifest: ModelManifest,
        config: PredictorConfig,
    ) -> Result<ImagePredictor>;
}

/// Default factory for the image predictor in this crate
pub struct ImagePredictorFactory;

impl PredictorFactory for ImagePredictorFactory {
    fn new_predictor(
        &self,
        manifest: ModelManifest,
        config: PredictorConfig,
    ) -> Result<ImagePredictor> {
        ImagePredictor::new(manifest, config)
    }
}

/// Process-wide registry of predictor factories keyed by framework
pub struct PredictorRegistry {
    factories: HashMap<String, Arc<dyn PredictorFactory>>,
}

impl PredictorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under a framework identity.
    ///
    /// A second registration for the same framework replaces the first.
    pub fn register(&mut self, framework: FrameworkManifest, factory: Arc<dyn PredictorFactory>) {
        tracing::info!(framework = %framework.key(), "registering predictor");
        self.factories.insert(framework.key(), factory);
    }

    /// Look up the factory for a framework name/version
    pub fn get(&self, name: &str, version: &str) -> Option<Arc<dyn PredictorFactory>> {
        let key = FrameworkManifest::new(name, version).key();
        self.factories.get(&key).cloned()
    }

    /// Build a predictor for a manifest using its declared framework
    pub fn new_predictor(
        &self,
        manifest: ModelManifest,
        config: PredictorConfig,
    ) -> Result<ImagePredictor> {
        let factory = self
            .get(&manifest.framework.name, &manifest.framework.version)
            .ok_or_else(|| {
                Error::unsupported_input(format!(
                    "no predictor registered for framework {}",
                    manifest.framework.key()
                ))
            })?;
        factory.new_predictor(manifest, config)
    }

    /// Registered framework keys
    pub fn frameworks(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Number of registered frameworks
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for PredictorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared registry handle for passing across threads after startup
#[derive(Clone)]
pub struct SharedPredictorRegistry {
    registry: Arc<PredictorRegistry>,
}

impl SharedPredictorRegistry {
    /// Freeze a fully-registered registry for sharing
    pub fn new(registry: PredictorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Access the underlying registry
    pub fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }
}
