//! Error types for ModelBay

/// Result type alias using ModelBay's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ModelBay operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest declares an input shape this predictor cannot serve
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Manifest omits the checksum for a required artifact
    #[error("missing checksum for {artifact} in the model manifest")]
    MissingChecksum { artifact: String },

    /// Manifest omits a metadata field with no documented default
    #[error("missing manifest metadata: {field}")]
    MissingMetadata { field: String },

    /// Network or filesystem failure while acquiring artifacts
    #[error("failed to fetch artifact from {url}: {reason}")]
    ArtifactFetch { url: String, reason: String },

    /// Native engine refused the graph at load time
    #[error("engine failed to open graph: {0}")]
    EngineOpen(String),

    /// Predict was called before a successful load
    #[error("predictor is not loaded")]
    NotLoaded,

    /// Load was called on a predictor that already holds an engine
    #[error("predictor is already loaded")]
    AlreadyLoaded,

    /// Predict was called after close
    #[error("predictor is closed")]
    Closed,

    /// Engine-level failure during prediction
    #[error("prediction error: {0}")]
    Prediction(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest deserialization errors
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new unsupported-input error
    pub fn unsupported_input(msg: impl Into<String>) -> Self {
        Self::UnsupportedInput(msg.into())
    }

    /// Create a new missing-checksum error for an artifact
    pub fn missing_checksum(artifact: impl Into<String>) -> Self {
        Self::MissingChecksum {
            artifact: artifact.into(),
        }
    }

    /// Create a new missing-metadata error for a manifest field
    pub fn missing_metadata(field: impl Into<String>) -> Self {
        Self::MissingMetadata {
            field: field.into(),
        }
    }

    /// Create a new artifact-fetch error
    pub fn artifact_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArtifactFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new engine-open error
    pub fn engine_open(msg: impl Into<String>) -> Self {
        Self::EngineOpen(msg.into())
    }

    /// Create a new prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }
}
