use crate::compression::CompressionSpec;
use crate::config::UploadConfig;
use crate::error::{Result, UploadError};
use crate::validation::guess_content_type;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One file being uploaded: its bytes plus the declared name and content type
#[derive(Clone, PartialEq, Eq)]
pub struct UploadUnit {
    name: String,
    content_type: String,
    data: Bytes,
}

impl UploadUnit {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a unit from disk, guessing the content type from the extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::invalid_parameter(
                    "path",
                    format!("Path has no file name: {}", path.display()),
                )
            })?
            .to_string();

        let data = tokio::fs::read(path).await?;
        let content_type = guess_content_type(&name);

        Ok(Self::new(name, content_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Same name and declared type, new contents
    pub fn with_data(&self, data: impl Into<Bytes>) -> Self {
        Self {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            data: data.into(),
        }
    }
}

impl std::fmt::Debug for UploadUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadUnit")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

fn default_success() -> bool {
    true
}

/// Server acknowledgement of a stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(default = "default_success")]
    pub success: bool,
    pub file_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl UploadResult {
    pub fn new(file_url: impl Into<String>, unit: &UploadUnit) -> Self {
        Self {
            success: true,
            file_url: file_url.into(),
            file_name: unit.name().to_string(),
            file_size: unit.size(),
            file_type: unit.content_type().to_string(),
            uploaded_at: Utc::now(),
            thumbnail_url: None,
        }
    }

    pub fn uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }

    pub fn thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

/// Options for [`crate::UploadPipeline::upload_image`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageUploadOptions {
    pub compress: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
}

impl Default for ImageUploadOptions {
    fn default() -> Self {
        let spec = CompressionSpec::default();
        Self {
            compress: false,
            max_width: spec.max_width,
            max_height: spec.max_height,
            quality: spec.quality,
        }
    }
}

impl ImageUploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the configured compression quality
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new().quality(config.compression_quality)
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn max_dimensions(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn compression_spec(&self) -> CompressionSpec {
        CompressionSpec::new(self.max_width, self.max_height, self.quality)
    }
}
