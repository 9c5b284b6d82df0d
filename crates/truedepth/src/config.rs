use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;
use truedepth_image::ImageSize;
use truedepth_imgproc::depth::DepthRange;

/// The configuration of an [`crate::RgbdPipeline`].
///
/// Keys are camelCase when read from JSON and every key is optional, missing keys
/// take the default value.
///
/// # Example
///
/// ```
/// use truedepth::PipelineConfig;
///
/// let config = PipelineConfig::from_json(r#"{ "maxDepth": 0.8 }"#).unwrap();
/// assert_eq!(config.width, 640);
/// assert_eq!(config.max_depth, 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// The width of the frames and of the undistortion map.
    pub width: usize,
    /// The height of the frames and of the undistortion map.
    pub height: usize,
    /// The exclusive lower bound of valid depth, in meters.
    pub min_depth: f32,
    /// The exclusive upper bound of valid depth, in meters.
    pub max_depth: f32,
    /// Convert point colors from sRGB to linear intensity.
    pub linearize_color: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            min_depth: 0.1,
            max_depth: 0.5,
            linearize_color: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The frame size.
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// The accepted depth range.
    pub fn depth_range(&self) -> Result<DepthRange, PipelineError> {
        Ok(DepthRange::new(self.min_depth, self.max_depth)?)
    }

    /// Check that the configuration describes a usable pipeline.
    ///
    /// # Errors
    ///
    /// Fails with [`PipelineError::InvalidConfig`] if the frame size is empty, and with
    /// [`PipelineError::DepthError`] if the depth range is invalid.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "frame size must not be empty, got {}x{}",
                self.width, self.height
            )));
        }
        self.depth_range()?;
        Ok(())
    }
}
