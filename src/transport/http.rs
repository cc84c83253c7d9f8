//! reqwest-backed transport

use crate::config::UploadConfig;
use crate::error::{Result, UploadError};
use crate::transport::{endpoints, Transport};
use crate::upload::chunks::Chunk;
use crate::upload::types::{UploadResult, UploadUnit};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeRequest<'a> {
    file_name: &'a str,
}

/// Multipart/JSON client for the upload endpoints
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        Self::new(&config.api_url)
    }

    /// Use a preconfigured client, e.g. one with timeouts or default headers
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            UploadError::config_error(format!("invalid api url {}: {}", base_url, e))
        })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn unit_part(unit: &UploadUnit) -> Result<Part> {
        Part::bytes(unit.data().to_vec())
            .file_name(unit.name().to_string())
            .mime_str(unit.content_type())
            .map_err(|e| {
                UploadError::invalid_parameter(
                    "content_type",
                    format!("{}: {}", unit.content_type(), e),
                )
            })
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(UploadError::from_status(status.as_u16(), server_message(&body)));
        }
        serde_json::from_str(&body)
            .map_err(|e| UploadError::network(format!("Invalid upload response: {}", e)))
    }

    async fn send_empty(&self, req: reqwest::RequestBuilder) -> Result<()> {
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::from_status(status.as_u16(), server_message(&body)));
        }
        Ok(())
    }
}

/// `message` field of a JSON error body, if any
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_unit(
        &self,
        endpoint: &str,
        unit: &UploadUnit,
        uploaded_at: DateTime<Utc>,
    ) -> Result<UploadResult> {
        let form = Form::new()
            .part("file", Self::unit_part(unit)?)
            .text("fileType", unit.content_type().to_string())
            .text("fileSize", unit.size().to_string())
            .text(
                "uploadedAt",
                uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            );

        debug!("POST {} ({}, {} bytes)", endpoint, unit.name(), unit.size());
        self.send_json(self.http.post(self.url(endpoint)).multipart(form))
            .await
    }

    async fn send_units(&self, endpoint: &str, units: &[UploadUnit]) -> Result<Vec<UploadResult>> {
        let mut form = Form::new();
        for unit in units {
            form = form.part("files", Self::unit_part(unit)?);
        }

        debug!("POST {} ({} files)", endpoint, units.len());
        self.send_json(self.http.post(self.url(endpoint)).multipart(form))
            .await
    }

    async fn send_chunk(&self, chunk: &Chunk) -> Result<()> {
        let part = Part::bytes(chunk.data.to_vec())
            .file_name("blob")
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("chunk", part)
            .text("fileName", chunk.file_name.clone())
            .text("chunkIndex", chunk.index.to_string())
            .text("totalChunks", chunk.total.to_string());

        debug!(
            "POST {} ({} chunk {}/{})",
            endpoints::UPLOAD_CHUNK,
            chunk.file_name,
            chunk.index + 1,
            chunk.total
        );
        self.send_empty(
            self.http
                .post(self.url(endpoints::UPLOAD_CHUNK))
                .multipart(form),
        )
        .await
    }

    async fn finalize(&self, file_name: &str) -> Result<UploadResult> {
        debug!("POST {} ({})", endpoints::UPLOAD_FINALIZE, file_name);
        self.send_json(
            self.http
                .post(self.url(endpoints::UPLOAD_FINALIZE))
                .json(&FinalizeRequest { file_name }),
        )
        .await
    }

    async fn delete(&self, file_url: &str) -> Result<()> {
        debug!("DELETE {} ({})", endpoints::UPLOAD_DELETE, file_url);
        self.send_empty(
            self.http
                .delete(self.url(endpoints::UPLOAD_DELETE))
                .query(&[("fileUrl", file_url)]),
        )
        .await
    }
}
