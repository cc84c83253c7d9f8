//! Upload progress reporting
//!
//! The pipeline publishes a [`ProgressRecord`] on a [`ProgressChannel`] at
//! every state change of a unit. Observers subscribe to the channel and, if
//! they need per-file state, fold the records into a [`ProgressTracker`].

pub mod channel;
pub mod tracker;
pub mod types;

pub use channel::{ProgressChannel, ProgressSubscription};
pub use tracker::ProgressTracker;
pub use types::{ProgressRecord, UploadState, UploadStatus};
