//! Batch upload component
//!
//! An [`UploadBatch`] is the consumer side of the pipeline: it admits files
//! picked or dropped by a user, shows previews, uploads them and reports
//! when every selected file has completed.

pub mod operations;
pub mod types;

pub use operations::UploadBatch;
pub use types::{BatchEvent, BatchOptions, UploadedFile};
