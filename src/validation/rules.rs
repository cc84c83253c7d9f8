//! Validation rule sets and upload categories

use crate::config::UploadConfig;
use crate::config::settings::DEFAULT_MAX_FILE_SIZE;
use serde::{Deserialize, Serialize};

/// Limits applied to each unit before it is sent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Maximum byte length; `None` or 0 falls back to the general maximum
    pub max_size: Option<u64>,
    /// Allowed declared content types; `None` accepts any type
    pub allowed_types: Option<Vec<String>>,
    /// Maximum number of units in one multi-unit call
    pub max_files: Option<usize>,
    /// Image dimension bounds. Accepted but not enforced.
    pub min_image_width: Option<u32>,
    pub min_image_height: Option<u32>,
    pub max_image_width: Option<u32>,
    pub max_image_height: Option<u32>,
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image preset: image size limit and the configured image types
    pub fn image(config: &UploadConfig) -> Self {
        Self::new()
            .max_size(config.max_image_size)
            .allowed_types(config.allowed_image_types.clone())
    }

    /// Document preset: document size limit and the configured document types
    pub fn document(config: &UploadConfig) -> Self {
        Self::new()
            .max_size(config.max_document_size)
            .allowed_types(config.allowed_document_types.clone())
    }

    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_files(mut self, count: usize) -> Self {
        self.max_files = Some(count);
        self
    }

    pub fn image_dimensions(
        mut self,
        min_width: Option<u32>,
        min_height: Option<u32>,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Self {
        self.min_image_width = min_width;
        self.min_image_height = min_height;
        self.max_image_width = max_width;
        self.max_image_height = max_height;
        self
    }

    /// The size limit actually enforced
    pub fn effective_max_size(&self) -> u64 {
        self.effective_max_size_or(DEFAULT_MAX_FILE_SIZE)
    }

    /// `max_size`, or `default` when it is unset or zero
    pub fn effective_max_size_or(&self, default: u64) -> u64 {
        match self.max_size {
            Some(size) if size > 0 => size,
            _ => default,
        }
    }

    /// Copy of these rules with an unset or zero `max_size` replaced by `default`
    pub fn with_default_max_size(&self, default: u64) -> Self {
        Self {
            max_size: Some(self.effective_max_size_or(default)),
            ..self.clone()
        }
    }
}

/// Which family of files an upload surface accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadCategory {
    Image,
    Document,
    #[default]
    Any,
}

impl UploadCategory {
    /// Whether `content_type` belongs to this category under `config`
    pub fn accepts(&self, content_type: &str, config: &UploadConfig) -> bool {
        match self {
            UploadCategory::Image => is_image(content_type, config),
            UploadCategory::Document => is_document(content_type, config),
            UploadCategory::Any => true,
        }
    }

    /// Value for a file picker's `accept` filter
    pub fn accept_filter(&self) -> &'static str {
        match self {
            UploadCategory::Image => "image/*",
            UploadCategory::Document => ".pdf,.doc,.docx,.xls,.xlsx,.ppt,.pptx,.txt,.zip,.rar",
            UploadCategory::Any => "*/*",
        }
    }
}

impl std::fmt::Display for UploadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadCategory::Image => write!(f, "image"),
            UploadCategory::Document => write!(f, "document"),
            UploadCategory::Any => write!(f, "any"),
        }
    }
}

impl std::str::FromStr for UploadCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(UploadCategory::Image),
            "document" => Ok(UploadCategory::Document),
            "any" => Ok(UploadCategory::Any),
            other => Err(format!("unknown upload category '{}'", other)),
        }
    }
}

pub fn is_image(content_type: &str, config: &UploadConfig) -> bool {
    config.allowed_image_types.iter().any(|t| t == content_type)
}

pub fn is_document(content_type: &str, config: &UploadConfig) -> bool {
    config.allowed_document_types.iter().any(|t| t == content_type)
}
