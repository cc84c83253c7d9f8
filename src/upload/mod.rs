//! Upload pipeline and chunked transfer
//!
//! This module provides the [`UploadPipeline`] that drives single, multi-file,
//! image, document and chunked uploads, plus the chunk splitting and session
//! state machine behind large-file transfers.

pub mod chunks;
pub mod operations;
pub mod session;
pub mod types;

pub use chunks::{chunk_count, chunk_percent, split_into_chunks, Chunk};
pub use operations::UploadPipeline;
pub use session::{ChunkedState, ChunkedUpload};
pub use types::{ImageUploadOptions, UploadResult, UploadUnit};
