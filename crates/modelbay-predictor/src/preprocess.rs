//! Preprocessing descriptor derived from manifest metadata

use modelbay_core::error::Result;
use modelbay_core::manifest::{ColorMode, ModelManifest, PixelLayout};

/// Output layer evaluated when the manifest does not name one
pub const DEFAULT_OUTPUT_LAYER: &str = "z";

/// Everything a caller must apply to an image before prediction.
///
/// Pure derived data: recomputed from the manifest on demand, never cached
/// across manifest changes. Deriving this before [`crate::ImagePredictor::load`]
/// lets a caller validate preprocessing compatibility without committing to
/// a download.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOptions {
    /// Per-channel mean subtracted from the input
    pub mean_image: Vec<f32>,

    /// Multiplicative scale applied after mean subtraction
    pub scale: f32,

    /// Target (height, width) the image must be resized to
    pub target_size: (u32, u32),

    /// Channel order the graph expects
    pub color_mode: ColorMode,

    /// Tensor layout the graph expects
    pub layout: PixelLayout,
}

impl PreprocessOptions {
    /// Derive preprocessing options from a manifest.
    ///
    /// Mean image, scale, and dimensions must be declared; color mode and
    /// layout fall back to the documented defaults (BGR, HWC).
    pub fn describe(manifest: &ModelManifest) -> Result<Self> {
        let mean_image = manifest.mean_image()?;
        let scale = manifest.scale()?;
        let dims = manifest.image_dimensions()?;

        Ok(Self {
            mean_image,
            scale,
            target_size: (dims[1], dims[2]),
            color_mode: manifest.color_mode().unwrap_or(ColorMode::Bgr),
            layout: manifest.layout().unwrap_or(PixelLayout::Hwc),
        })
    }
}
