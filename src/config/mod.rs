//! Configuration for the upload pipeline
//!
//! Defaults mirror the product's upload limits; every value can be
//! overridden through `UPLOAD_*` environment variables or the builder.

pub mod logging;
pub mod settings;

pub use logging::{init_logging, LogLevel};
pub use settings::{UploadConfig, DEFAULT_DOCUMENT_TYPES, DEFAULT_IMAGE_TYPES};
