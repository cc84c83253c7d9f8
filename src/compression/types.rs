use crate::config::settings::DEFAULT_COMPRESSION_QUALITY;
use crate::error::{Result, UploadError};

/// Bounding box and quality for image re-encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSpec {
    pub max_width: u32,
    pub max_height: u32,
    /// 0.0 to 1.0; only lossy formats honour it
    pub quality: f32,
}

impl Default for CompressionSpec {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: DEFAULT_COMPRESSION_QUALITY,
        }
    }
}

impl CompressionSpec {
    pub fn new(max_width: u32, max_height: u32, quality: f32) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }

    /// Square bound used for previews
    pub fn thumbnail(size: u32, quality: f32) -> Self {
        Self::new(size, size, quality)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(UploadError::invalid_parameter(
                "max_dimensions",
                "Maximum width and height must be greater than 0",
            ));
        }

        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(UploadError::invalid_parameter(
                "quality",
                format!("Quality must be within (0, 1], got {}", self.quality),
            ));
        }

        Ok(())
    }

    /// Quality on the 1..=100 scale lossy encoders expect
    pub fn encoder_quality(&self) -> u8 {
        ((self.quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
    }
}
