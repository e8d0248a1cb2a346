//! Ranked prediction features

use serde::{Deserialize, Serialize};

/// One ranked class prediction for a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Label index in the model's label table
    pub index: i64,

    /// Label name
    pub name: String,

    /// Class probability reported by the engine
    pub probability: f32,
}

impl Feature {
    /// Create a new feature entry
    pub fn new(index: i64, name: impl Into<String>, probability: f32) -> Self {
        Self {
            index,
            name: name.into(),
            probability,
        }
    }
}

/// Ranked features for one sample, ordered by label index.
///
/// Insertion order is label order, never probability order. Sorting and
/// top-k selection are a caller concern.
pub type FeatureList = Vec<Feature>;
