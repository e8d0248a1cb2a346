//! Model manifest data model and accessors
//!
//! Manifests are declarative YAML descriptions of a model published by an
//! external catalog: where its artifacts live, how its input must be
//! preprocessed, and which framework serves it. All accessors that read a
//! field the catalog may omit are fallible and name the missing field.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity of the framework a model runs on, used as the registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameworkManifest {
    /// Framework name (e.g. "cntk")
    pub name: String,

    /// Framework version (e.g. "2.3")
    pub version: String,
}

impl FrameworkManifest {
    /// Create a new framework identity
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Canonical lowercase registry key for this framework
    pub fn key(&self) -> String {
        format!("{}/{}", self.name.to_lowercase(), self.version.to_lowercase())
    }
}

/// Channel order expected by a model's graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Blue-green-red channel order
    Bgr,
    /// Red-green-blue channel order
    Rgb,
}

/// Memory layout of a decoded image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    /// Height-width-channel (interleaved)
    Hwc,
    /// Channel-height-width (planar)
    Chw,
}

/// Mean image specification: a single scalar or one value per channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeanSpec {
    Scalar(f32),
    PerChannel(Vec<f32>),
}

impl MeanSpec {
    /// Expand to a per-channel vector for the given channel count
    pub fn to_channels(&self, channels: usize) -> Vec<f32> {
        match self {
            Self::Scalar(v) => vec![*v; channels],
            Self::PerChannel(vs) => vs.clone(),
        }
    }
}

/// Preprocessing parameters attached to a model input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputParameters {
    /// Mean image subtracted before inference
    #[serde(default)]
    pub mean: Option<MeanSpec>,

    /// Multiplicative scale applied after mean subtraction
    #[serde(default)]
    pub scale: Option<f32>,

    /// Channel order the graph expects
    #[serde(default)]
    pub color_mode: Option<ColorMode>,

    /// Tensor layout the graph expects
    #[serde(default)]
    pub layout: Option<PixelLayout>,
}

/// One declared model input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    /// Input kind (this predictor serves only "image")
    #[serde(rename = "type")]
    pub kind: String,

    /// Input dimensions, channel/height/width
    #[serde(default)]
    pub dimensions: Option<Vec<u32>>,

    /// Preprocessing parameters
    #[serde(default)]
    pub parameters: InputParameters,
}

/// Artifact locations and integrity metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResources {
    /// Base URL, used as the archive location for archive-packaged models
    #[serde(default)]
    pub base_url: Option<String>,

    /// URL of the serialized graph definition
    #[serde(default)]
    pub graph_url: Option<String>,

    /// URL of the label/feature list, one label per line
    #[serde(default)]
    pub features_url: Option<String>,

    /// Content hash of the graph file
    #[serde(default)]
    pub graph_checksum: Option<String>,

    /// Content hash of the features file
    #[serde(default)]
    pub features_checksum: Option<String>,

    /// Whether the model is packaged as a single archive at base_url
    #[serde(default)]
    pub is_archive: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Name of the graph node to evaluate; framework default when absent
    #[serde(default)]
    pub layer_name: Option<String>,
}

/// Serving attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelAttributes {
    /// Number of samples per inference call
    #[serde(default)]
    pub batch_size: Option<u32>,
}

/// Declarative description of a servable model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name
    pub name: String,

    /// Model version
    #[serde(default)]
    pub version: String,

    /// Framework this model runs on
    pub framework: FrameworkManifest,

    /// Declared inputs
    #[serde(default)]
    pub inputs: Vec<ModelInput>,

    /// Artifact locations
    #[serde(default)]
    pub model: ModelResources,

    /// Output configuration
    #[serde(default)]
    pub output: ModelOutput,

    /// Serving attributes
    #[serde(default)]
    pub attributes: ModelAttributes,
}

impl ModelManifest {
    /// Parse a manifest from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a manifest from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// The single image input this predictor serves
    fn image_input(&self) -> Result<&ModelInput> {
        self.inputs
            .first()
            .ok_or_else(|| Error::missing_metadata("inputs"))
    }

    /// URL of the graph definition
    pub fn graph_url(&self) -> Result<&str> {
        self.model
            .graph_url
            .as_deref()
            .ok_or_else(|| Error::missing_metadata("model.graph_url"))
    }

    /// URL of the features file
    pub fn features_url(&self) -> Result<&str> {
        self.model
            .features_url
            .as_deref()
            .ok_or_else(|| Error::missing_metadata("model.features_url"))
    }

    /// Declared content hash of the graph file
    pub fn graph_checksum(&self) -> Result<&str> {
        match self.model.graph_checksum.as_deref() {
            Some(c) if !c.is_empty() => Ok(c),
            _ => Err(Error::missing_checksum("graph")),
        }
    }

    /// Declared content hash of the features file
    pub fn features_checksum(&self) -> Result<&str> {
        match self.model.features_checksum.as_deref() {
            Some(c) if !c.is_empty() => Ok(c),
            _ => Err(Error::missing_checksum("features")),
        }
    }

    /// Whether the model ships as a single archive
    pub fn is_archive(&self) -> bool {
        self.model.is_archive
    }

    /// Base URL, the archive location for archive-packaged models
    pub fn base_url(&self) -> Result<&str> {
        self.model
            .base_url
            .as_deref()
            .ok_or_else(|| Error::missing_metadata("model.base_url"))
    }

    /// Mean image expanded to one value per channel
    pub fn mean_image(&self) -> Result<Vec<f32>> {
        let input = self.image_input()?;
        let mean = input
            .parameters
            .mean
            .as_ref()
            .ok_or_else(|| Error::missing_metadata("inputs[0].parameters.mean"))?;
        let channels = self
            .image_dimensions()
            .map(|dims| dims[0] as usize)
            .unwrap_or(3);
        Ok(mean.to_channels(channels))
    }

    /// Multiplicative input scale
    pub fn scale(&self) -> Result<f32> {
        self.image_input()?
            .parameters
            .scale
            .ok_or_else(|| Error::missing_metadata("inputs[0].parameters.scale"))
    }

    /// Input dimensions, always channel/height/width
    pub fn image_dimensions(&self) -> Result<Vec<u32>> {
        let dims = self
            .image_input()?
            .dimensions
            .clone()
            .ok_or_else(|| Error::missing_metadata("inputs[0].dimensions"))?;
        if dims.len() != 3 {
            return Err(Error::unsupported_input(format!(
                "expected 3 input dimensions, manifest declares {}",
                dims.len()
            )));
        }
        Ok(dims)
    }

    /// Declared channel order, if any
    pub fn color_mode(&self) -> Option<ColorMode> {
        self.inputs.first().and_then(|i| i.parameters.color_mode)
    }

    /// Declared tensor layout, if any
    pub fn layout(&self) -> Option<PixelLayout> {
        self.inputs.first().and_then(|i| i.parameters.layout)
    }

    /// Declared output layer name, if any
    pub fn output_layer_name(&self) -> Option<&str> {
        self.output.layer_name.as_deref()
    }

    /// Samples per inference call, defaulting to 1
    pub fn batch_size(&self) -> u32 {
        self.attributes.batch_size.unwrap_or(1).max(1)
    }

    /// Local path of the graph file under a work directory
    pub fn graph_path(&self, work_dir: &Path) -> Result<PathBuf> {
        Ok(work_dir.join(file_name_of(self.graph_url()?, "graph.bin")))
    }

    /// Local path of the features file under a work directory
    pub fn features_path(&self, work_dir: &Path) -> Result<PathBuf> {
        Ok(work_dir.join(file_name_of(self.features_url()?, "features.txt")))
    }
}

/// Last path segment of a URL, or a fallback for opaque URLs
fn file_name_of(url: &str, fallback: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
