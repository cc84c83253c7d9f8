use crate::compression::CompressionSpec;
use crate::config::UploadConfig;
use crate::config::settings::DEFAULT_MAX_FILE_SIZE;
use crate::upload::types::{ImageUploadOptions, UploadResult};
use crate::validation::UploadCategory;

/// Settings of one upload batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Picker hint: whether the file dialog offers multi-select. Units handed
    /// to the batch directly are limited by `max_files` only.
    pub multiple: bool,
    /// File-picker filter; follows `category` unless set explicitly
    pub accept: String,
    pub max_size: u64,
    pub max_files: usize,
    pub category: UploadCategory,
    pub auto_upload: bool,
    pub show_preview: bool,
    pub compress_images: bool,
    pub image_max_width: u32,
    pub image_max_height: u32,
    pub image_quality: f32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        let spec = CompressionSpec::default();
        Self {
            multiple: false,
            accept: UploadCategory::Any.accept_filter().to_string(),
            max_size: DEFAULT_MAX_FILE_SIZE,
            max_files: 10,
            category: UploadCategory::Any,
            auto_upload: true,
            show_preview: true,
            compress_images: false,
            image_max_width: spec.max_width,
            image_max_height: spec.max_height,
            image_quality: spec.quality,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the size limit and image quality taken from `config`
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_size: config.max_file_size,
            image_quality: config.compression_quality,
            ..Self::default()
        }
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    /// Also resets `accept` to the category's filter
    pub fn category(mut self, category: UploadCategory) -> Self {
        self.category = category;
        self.accept = category.accept_filter().to_string();
        self
    }

    pub fn auto_upload(mut self, auto_upload: bool) -> Self {
        self.auto_upload = auto_upload;
        self
    }

    pub fn show_preview(mut self, show_preview: bool) -> Self {
        self.show_preview = show_preview;
        self
    }

    pub fn compress_images(mut self, compress: bool) -> Self {
        self.compress_images = compress;
        self
    }

    pub fn image_limits(mut self, max_width: u32, max_height: u32, quality: f32) -> Self {
        self.image_max_width = max_width;
        self.image_max_height = max_height;
        self.image_quality = quality;
        self
    }

    pub fn image_upload_options(&self) -> ImageUploadOptions {
        ImageUploadOptions::new()
            .compress(true)
            .max_dimensions(self.image_max_width, self.image_max_height)
            .quality(self.image_quality)
    }
}

/// Notifications a batch sends to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Names of every selected unit, after new units were accepted
    FilesSelected(Vec<String>),
    /// Every selected unit completed; responses in completion order
    UploadComplete(Vec<UploadResult>),
    UploadError(String),
    /// URL of the removed file; empty if it was never uploaded
    FileRemoved(String),
}

/// An entry in the batch's file list
///
/// Preview entries exist before upload with `result.success == false` and an
/// empty `file_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub id: String,
    pub result: UploadResult,
    /// `data:` URL shown before and after upload
    pub local_url: Option<String>,
}

impl UploadedFile {
    pub fn is_uploaded(&self) -> bool {
        self.result.success && !self.result.file_url.is_empty()
    }
}
