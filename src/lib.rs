pub mod error;

pub mod batch;
pub mod compression;
pub mod config;
pub mod progress;
pub mod transport;
pub mod upload;
pub mod validation;

pub use batch::{BatchEvent, BatchOptions, UploadBatch, UploadedFile};

pub use compression::{compress_image, preview_data_url, target_dimensions, CompressionSpec};

pub use config::{init_logging, LogLevel, UploadConfig};

pub use error::{ErrorKind, NetworkFailureKind, Result, UploadError};

pub use progress::{
    ProgressChannel, ProgressRecord, ProgressSubscription, ProgressTracker, UploadState,
    UploadStatus,
};

pub use transport::{endpoints, HttpTransport, Transport};

pub use upload::{
    chunk_count, split_into_chunks, Chunk, ChunkedState, ChunkedUpload, ImageUploadOptions,
    UploadPipeline, UploadResult, UploadUnit,
};

pub use validation::{
    file_extension, format_file_size, is_document, is_image, validate_count, validate_unit,
    UploadCategory, ValidationRules,
};
