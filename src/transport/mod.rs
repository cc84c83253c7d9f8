//! HTTP boundary of the upload pipeline
//!
//! The pipeline talks to storage through the [`Transport`] trait so that the
//! wire format lives in one place ([`HttpTransport`]) and tests can swap in
//! an in-memory implementation. Every response is decoded here, once: a
//! transport call either yields the typed payload or an already-classified
//! [`crate::UploadError::Network`].

pub mod http;

use crate::error::Result;
use crate::upload::chunks::Chunk;
use crate::upload::types::{UploadResult, UploadUnit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use http::HttpTransport;

/// Endpoint paths relative to the configured API URL
pub mod endpoints {
    pub const UPLOAD: &str = "/upload";
    pub const UPLOAD_MULTIPLE: &str = "/upload/multiple";
    pub const UPLOAD_IMAGE: &str = "/upload/image";
    pub const UPLOAD_DOCUMENT: &str = "/upload/document";
    pub const UPLOAD_CHUNK: &str = "/upload/chunk";
    pub const UPLOAD_FINALIZE: &str = "/upload/finalize";
    pub const UPLOAD_DELETE: &str = "/upload/delete";
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one whole unit to `endpoint`
    async fn send_unit(
        &self,
        endpoint: &str,
        unit: &UploadUnit,
        uploaded_at: DateTime<Utc>,
    ) -> Result<UploadResult>;

    /// Send several units in one request; results come back in request order
    async fn send_units(&self, endpoint: &str, units: &[UploadUnit]) -> Result<Vec<UploadResult>>;

    /// Send one chunk of a large unit
    async fn send_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Ask the server to assemble the chunks received for `file_name`
    async fn finalize(&self, file_name: &str) -> Result<UploadResult>;

    /// Remove a stored file
    async fn delete(&self, file_url: &str) -> Result<()>;
}
