//! Upload pipeline
//!
//! [`UploadPipeline`] validates units, optionally compresses images, hands
//! them to a [`Transport`] and publishes a [`ProgressRecord`] at every state
//! change. It is built explicitly from its parts so several independent
//! pipelines can coexist.

use crate::compression::{compress_image, preview_data_url};
use crate::config::UploadConfig;
use crate::error::{Result, UploadError};
use crate::progress::{ProgressChannel, ProgressRecord, ProgressSubscription};
use crate::transport::{endpoints, Transport};
use crate::upload::session::ChunkedUpload;
use crate::upload::types::{ImageUploadOptions, UploadResult, UploadUnit};
use crate::validation::{validate_count, validate_unit, ValidationRules};
use chrono::Utc;
use log::{debug, info, warn};

/// Error text for a unit the server's multi-file response left unanswered
pub const MISSING_RESULT_MESSAGE: &str = "No upload result returned for file";

pub struct UploadPipeline<T: Transport> {
    config: UploadConfig,
    transport: T,
    progress: ProgressChannel,
}

impl<T: Transport> UploadPipeline<T> {
    pub fn new(config: UploadConfig, transport: T, progress: ProgressChannel) -> Self {
        Self {
            config,
            transport,
            progress,
        }
    }

    /// Pipeline with its own channel sized from `config`
    pub fn with_config(config: UploadConfig, transport: T) -> Self {
        let progress = ProgressChannel::new(config.progress_capacity);
        Self::new(config, transport, progress)
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        self.progress.subscribe()
    }

    /// `rules` with an unset or zero size limit taken from the configured
    /// general maximum
    pub fn effective_rules(&self, rules: &ValidationRules) -> ValidationRules {
        rules.with_default_max_size(self.config.max_file_size)
    }

    fn reject(&self, unit: &UploadUnit, err: UploadError) -> UploadError {
        warn!("Rejected {}: {}", unit.name(), err);
        self.progress.publish(ProgressRecord::error(unit.name(), err.to_string()));
        err
    }

    /// Upload one unit to the generic endpoint
    ///
    /// # Arguments
    ///
    /// * `unit` - The unit to upload
    /// * `rules` - Validation rules applied before anything is sent
    ///
    /// # Returns
    ///
    /// The server's [`UploadResult`]
    ///
    /// # Errors
    ///
    /// Returns the validation error (after publishing an error record) if the
    /// unit is rejected, or the classified network error if the request fails
    pub async fn upload_unit(
        &self,
        unit: &UploadUnit,
        rules: &ValidationRules,
    ) -> Result<UploadResult> {
        self.upload_unit_to(endpoints::UPLOAD, unit, rules).await
    }

    /// Upload one unit to `endpoint`
    ///
    /// A size limit missing from `rules` falls back to `max_file_size` from
    /// the pipeline's config.
    pub async fn upload_unit_to(
        &self,
        endpoint: &str,
        unit: &UploadUnit,
        rules: &ValidationRules,
    ) -> Result<UploadResult> {
        if let Err(err) = validate_unit(unit, &self.effective_rules(rules)) {
            return Err(self.reject(unit, err));
        }

        self.progress.publish(ProgressRecord::uploading(unit.name(), 0));

        match self.transport.send_unit(endpoint, unit, Utc::now()).await {
            Ok(result) => {
                info!("Uploaded {} to {}", unit.name(), result.file_url);
                self.progress.publish(ProgressRecord::completed(unit.name(), result.clone()));
                Ok(result)
            }
            Err(err) => {
                warn!("Upload of {} failed: {}", unit.name(), err);
                self.progress.publish(ProgressRecord::error(unit.name(), err.to_string()));
                Err(err)
            }
        }
    }

    /// Upload several units in one request
    ///
    /// The unit count is checked against `rules.max_files` before anything
    /// else. Units failing validation get an error record and are left out of
    /// the request; the rest are sent together and matched to the response by
    /// position.
    ///
    /// # Errors
    ///
    /// * `TooManyFiles` - more units than `rules.max_files`; nothing is published
    /// * `NoValidUnits` - every unit failed validation
    /// * the network error, after every surviving unit got an error record
    pub async fn upload_multiple_units(
        &self,
        units: &[UploadUnit],
        rules: &ValidationRules,
    ) -> Result<Vec<UploadResult>> {
        validate_count(units.len(), rules)?;

        let rules = self.effective_rules(rules);
        let mut surviving = Vec::with_capacity(units.len());
        for unit in units {
            match validate_unit(unit, &rules) {
                Ok(()) => surviving.push(unit.clone()),
                Err(err) => {
                    self.reject(unit, err);
                }
            }
        }

        if surviving.is_empty() {
            return Err(UploadError::NoValidUnits);
        }

        for unit in &surviving {
            self.progress.publish(ProgressRecord::uploading(unit.name(), 0));
        }

        let results = match self
            .transport
            .send_units(endpoints::UPLOAD_MULTIPLE, &surviving)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                warn!("Upload of {} files failed: {}", surviving.len(), err);
                for unit in &surviving {
                    self.progress.publish(ProgressRecord::error(unit.name(), err.to_string()));
                }
                return Err(err);
            }
        };

        if results.len() != surviving.len() {
            warn!(
                "Server returned {} results for {} files",
                results.len(),
                surviving.len()
            );
        }

        for (position, unit) in surviving.iter().enumerate() {
            match results.get(position) {
                Some(result) => self
                    .progress
                    .publish(ProgressRecord::completed(unit.name(), result.clone())),
                None => self
                    .progress
                    .publish(ProgressRecord::error(unit.name(), MISSING_RESULT_MESSAGE)),
            }
        }

        info!("Uploaded {} files", results.len());
        Ok(results)
    }

    /// Upload an image, shrinking it first if `options.compress` is set
    ///
    /// The original unit is checked against the image preset rules. A
    /// compressed unit keeps the original name and declared type.
    pub async fn upload_image(
        &self,
        unit: &UploadUnit,
        options: ImageUploadOptions,
    ) -> Result<UploadResult> {
        let rules = ValidationRules::image(&self.config);
        if let Err(err) = validate_unit(unit, &rules) {
            return Err(self.reject(unit, err));
        }

        let unit = if options.compress {
            match compress_image(unit.clone(), options.compression_spec()).await {
                Ok(compressed) => compressed,
                Err(err) => return Err(self.reject(unit, err)),
            }
        } else {
            unit.clone()
        };

        self.upload_unit_to(endpoints::UPLOAD_IMAGE, &unit, &rules).await
    }

    /// Upload a document under the document preset rules
    pub async fn upload_document(&self, unit: &UploadUnit) -> Result<UploadResult> {
        let rules = ValidationRules::document(&self.config);
        self.upload_unit_to(endpoints::UPLOAD_DOCUMENT, unit, &rules).await
    }

    /// Upload `unit` in sequential chunks, then finalize it
    ///
    /// No size or type validation is applied. Progress advances once per
    /// acknowledged chunk.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a zero `chunk_size`, or the first chunk
    /// or finalize error; remaining chunks are not sent after a failure
    pub async fn upload_large_unit(
        &self,
        unit: &UploadUnit,
        chunk_size: usize,
    ) -> Result<UploadResult> {
        ChunkedUpload::new(&self.transport, &self.progress, unit, chunk_size)?
            .run()
            .await
    }

    /// Chunked upload using the configured chunk size
    pub async fn upload_large_unit_default(&self, unit: &UploadUnit) -> Result<UploadResult> {
        self.upload_large_unit(unit, self.config.chunk_size).await
    }

    /// Delete a stored file by its URL
    pub async fn delete_file(&self, file_url: &str) -> Result<()> {
        if file_url.is_empty() {
            return Err(UploadError::invalid_parameter(
                "file_url",
                "File URL cannot be empty",
            ));
        }

        self.transport.delete(file_url).await?;
        debug!("Deleted {}", file_url);
        Ok(())
    }

    /// `data:` URL for showing an image unit locally
    pub fn preview(&self, unit: &UploadUnit) -> Result<String> {
        preview_data_url(unit)
    }
}
