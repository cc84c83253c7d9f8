//! Client-side image compression
//!
//! Images are decoded, shrunk to fit a bounding box and re-encoded in their
//! declared type before they reach the transport. Decoding and encoding run
//! on a blocking worker so the caller's task only waits on completion.

pub mod operations;
pub mod types;

pub use operations::{compress_image, preview_data_url, target_dimensions};
pub use types::CompressionSpec;
