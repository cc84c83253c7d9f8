//! In-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketplace_upload::{
    Chunk, ProgressRecord, ProgressSubscription, Result, Transport, UploadError, UploadResult,
    UploadUnit,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const CDN: &str = "https://cdn.example.com/files";

/// A transport call as the server would have seen it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Unit { endpoint: String, file_name: String, size: u64 },
    Units { endpoint: String, file_names: Vec<String> },
    Chunk { file_name: String, index: usize, total: usize, size: usize },
    Finalize { file_name: String },
    Delete { file_url: String },
}

/// Records every call and answers with canned results or configured failures
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    received: Mutex<HashMap<String, u64>>,
    unit_failure: Option<UploadError>,
    units_failure: Option<UploadError>,
    chunk_failure: Option<(usize, UploadError)>,
    finalize_failure: Option<UploadError>,
    delays: HashMap<String, Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_unit_with(mut self, err: UploadError) -> Self {
        self.unit_failure = Some(err);
        self
    }

    pub fn fail_units_with(mut self, err: UploadError) -> Self {
        self.units_failure = Some(err);
        self
    }

    pub fn fail_chunk_at(mut self, index: usize, err: UploadError) -> Self {
        self.chunk_failure = Some((index, err));
        self
    }

    pub fn fail_finalize_with(mut self, err: UploadError) -> Self {
        self.finalize_failure = Some(err);
        self
    }

    /// Hold the response for `file_name` back by `millis`
    pub fn delay(mut self, file_name: &str, millis: u64) -> Self {
        self.delays
            .insert(file_name.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { file_url } => Some(file_url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn url_for(file_name: &str) -> String {
        format!("{}/{}", CDN, file_name)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_unit(
        &self,
        endpoint: &str,
        unit: &UploadUnit,
        uploaded_at: DateTime<Utc>,
    ) -> Result<UploadResult> {
        self.record(Call::Unit {
            endpoint: endpoint.to_string(),
            file_name: unit.name().to_string(),
            size: unit.size(),
        });

        if let Some(delay) = self.delays.get(unit.name()) {
            tokio::time::sleep(*delay).await;
        }

        match &self.unit_failure {
            Some(err) => Err(err.clone()),
            None => {
                Ok(UploadResult::new(Self::url_for(unit.name()), unit).uploaded_at(uploaded_at))
            }
        }
    }

    async fn send_units(&self, endpoint: &str, units: &[UploadUnit]) -> Result<Vec<UploadResult>> {
        self.record(Call::Units {
            endpoint: endpoint.to_string(),
            file_names: units.iter().map(|u| u.name().to_string()).collect(),
        });

        match &self.units_failure {
            Some(err) => Err(err.clone()),
            None => Ok(units
                .iter()
                .map(|u| UploadResult::new(Self::url_for(u.name()), u))
                .collect()),
        }
    }

    async fn send_chunk(&self, chunk: &Chunk) -> Result<()> {
        self.record(Call::Chunk {
            file_name: chunk.file_name.clone(),
            index: chunk.index,
            total: chunk.total,
            size: chunk.data.len(),
        });

        if let Some((index, err)) = &self.chunk_failure {
            if *index == chunk.index {
                return Err(err.clone());
            }
        }

        *self
            .received
            .lock()
            .unwrap()
            .entry(chunk.file_name.clone())
            .or_default() += chunk.data.len() as u64;
        Ok(())
    }

    async fn finalize(&self, file_name: &str) -> Result<UploadResult> {
        self.record(Call::Finalize {
            file_name: file_name.to_string(),
        });

        if let Some(err) = &self.finalize_failure {
            return Err(err.clone());
        }

        let size = self
            .received
            .lock()
            .unwrap()
            .get(file_name)
            .copied()
            .unwrap_or(0);
        Ok(UploadResult {
            success: true,
            file_url: Self::url_for(file_name),
            file_name: file_name.to_string(),
            file_size: size,
            file_type: "application/octet-stream".to_string(),
            uploaded_at: Utc::now(),
            thumbnail_url: None,
        })
    }

    async fn delete(&self, file_url: &str) -> Result<()> {
        self.record(Call::Delete {
            file_url: file_url.to_string(),
        });
        Ok(())
    }
}

pub fn text_unit(name: &str, size: usize) -> UploadUnit {
    UploadUnit::new(name, "text/plain", vec![b'x'; size])
}

/// A real PNG of the given dimensions
pub fn png_unit(name: &str, width: u32, height: u32) -> UploadUnit {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    UploadUnit::new(name, "image/png", buf)
}

pub fn drain(subscription: &mut ProgressSubscription) -> Vec<ProgressRecord> {
    subscription.drain()
}

/// Records for one file, oldest first
pub fn records_for<'a>(records: &'a [ProgressRecord], file_name: &str) -> Vec<&'a ProgressRecord> {
    records
        .iter()
        .filter(|r| r.file_name == file_name)
        .collect()
}
