//! Upload configuration

use crate::config::logging::LogLevel;
use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024; // 5 MiB
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 20 * 1024 * 1024; // 20 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_COMPRESSION_QUALITY: f32 = 0.8;
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 200;
pub const DEFAULT_PROGRESS_CAPACITY: usize = 256;

pub const DEFAULT_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

pub const DEFAULT_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "application/zip",
    "application/x-rar-compressed",
];

/// Configuration shared by every pipeline built from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UploadConfig {
    /// Base URL every endpoint is appended to (default: http://localhost:3000/api)
    pub api_url: String,

    /// Maximum size of a general upload in bytes (default: 10 MiB)
    pub max_file_size: u64,

    /// Maximum size of an image upload in bytes (default: 5 MiB)
    pub max_image_size: u64,

    /// Maximum size of a document upload in bytes (default: 20 MiB)
    pub max_document_size: u64,

    /// Content types accepted by image uploads
    pub allowed_image_types: Vec<String>,

    /// Content types accepted by document uploads
    pub allowed_document_types: Vec<String>,

    /// Chunk size for large-file transfers (default: 1 MiB)
    pub chunk_size: usize,

    /// Re-encode quality for compressed images, 0.0 to 1.0 (default: 0.8)
    pub compression_quality: f32,

    /// Longest edge of generated previews in pixels (default: 200)
    pub thumbnail_size: u32,

    /// Number of progress records buffered per subscriber (default: 256)
    pub progress_capacity: usize,

    /// Log level used by binaries (default: info)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            allowed_image_types: DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            allowed_document_types: DEFAULT_DOCUMENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression_quality: DEFAULT_COMPRESSION_QUALITY,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            log_level: Some(LogLevel::Info),
        }
    }
}

impl UploadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from the defaults overlaid with `UPLOAD_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`UploadConfig::from_env`] but reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("UPLOAD_API_URL") {
            config.api_url = url.trim().to_string();
        }
        if let Some(v) = var("UPLOAD_MAX_FILE_SIZE") {
            config.max_file_size = parse_var("UPLOAD_MAX_FILE_SIZE", &v)?;
        }
        if let Some(v) = var("UPLOAD_MAX_IMAGE_SIZE") {
            config.max_image_size = parse_var("UPLOAD_MAX_IMAGE_SIZE", &v)?;
        }
        if let Some(v) = var("UPLOAD_MAX_DOCUMENT_SIZE") {
            config.max_document_size = parse_var("UPLOAD_MAX_DOCUMENT_SIZE", &v)?;
        }
        if let Some(v) = var("UPLOAD_ALLOWED_IMAGE_TYPES") {
            config.allowed_image_types = split_list(&v);
        }
        if let Some(v) = var("UPLOAD_ALLOWED_DOCUMENT_TYPES") {
            config.allowed_document_types = split_list(&v);
        }
        if let Some(v) = var("UPLOAD_CHUNK_SIZE") {
            config.chunk_size = parse_var("UPLOAD_CHUNK_SIZE", &v)?;
        }
        if let Some(v) = var("UPLOAD_COMPRESSION_QUALITY") {
            config.compression_quality = parse_var("UPLOAD_COMPRESSION_QUALITY", &v)?;
        }
        if let Some(v) = var("UPLOAD_THUMBNAIL_SIZE") {
            config.thumbnail_size = parse_var("UPLOAD_THUMBNAIL_SIZE", &v)?;
        }
        if let Some(v) = var("UPLOAD_LOG_LEVEL") {
            config.log_level = Some(parse_var("UPLOAD_LOG_LEVEL", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base API URL
    pub fn api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the general maximum file size in bytes
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the image maximum size in bytes
    pub fn max_image_size(mut self, bytes: u64) -> Self {
        self.max_image_size = bytes;
        self
    }

    /// Set the document maximum size in bytes
    pub fn max_document_size(mut self, bytes: u64) -> Self {
        self.max_document_size = bytes;
        self
    }

    /// Set the chunk size for large-file transfers
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set the default compression quality
    pub fn compression_quality(mut self, quality: f32) -> Self {
        self.compression_quality = quality;
        self
    }

    /// Set the preview edge length
    pub fn thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    /// Set the progress buffer capacity
    pub fn progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = capacity;
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_url).map_err(|e| {
            UploadError::config_error(format!("invalid api url {}: {}", self.api_url, e))
        })?;

        for (name, value) in [
            ("max-file-size", self.max_file_size),
            ("max-image-size", self.max_image_size),
            ("max-document-size", self.max_document_size),
            ("chunk-size", self.chunk_size as u64),
            ("thumbnail-size", self.thumbnail_size as u64),
            ("progress-capacity", self.progress_capacity as u64),
        ] {
            if value == 0 {
                return Err(UploadError::config_error(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if !(self.compression_quality > 0.0 && self.compression_quality <= 1.0) {
            return Err(UploadError::config_error(format!(
                "compression-quality must be within (0, 1], got {}",
                self.compression_quality
            )));
        }

        Ok(())
    }

    /// Convert the configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(UploadError::from)
    }

    /// Create a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(UploadError::from)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| UploadError::config_error(format!("{}={}: {}", key, value, e)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
