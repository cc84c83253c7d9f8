//! Upload batch: file selection, previews, uploads and completion

use crate::batch::types::{BatchEvent, BatchOptions, UploadedFile};
use crate::compression::{compress_image, preview_data_url, CompressionSpec};
use crate::error::{Result, UploadError};
use crate::progress::{ProgressRecord, ProgressSubscription, ProgressTracker};
use crate::transport::Transport;
use crate::upload::operations::{UploadPipeline, MISSING_RESULT_MESSAGE};
use crate::upload::types::{UploadResult, UploadUnit};
use crate::validation::{
    format_file_size, is_image, validate_unit, UploadCategory, ValidationRules,
};
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

fn next_file_id() -> String {
    format!("file-{}", NEXT_FILE_ID.fetch_add(1, Ordering::SeqCst))
}

/// A set of files selected for upload together
///
/// The batch subscribes to the pipeline's progress channel when created and
/// releases the subscription when dropped. Requests already in flight when a
/// batch future is dropped are not guaranteed to be aborted.
pub struct UploadBatch<T: Transport> {
    pipeline: Arc<UploadPipeline<T>>,
    options: BatchOptions,
    subscription: ProgressSubscription,
    events: mpsc::UnboundedSender<BatchEvent>,
    selected: Vec<UploadUnit>,
    uploaded: Vec<UploadedFile>,
    tracker: ProgressTracker,
    drag_over: bool,
    uploading: bool,
    completion_reported: bool,
}

impl<T: Transport> UploadBatch<T> {
    /// Create a batch and the receiver for its events
    pub fn new(
        pipeline: Arc<UploadPipeline<T>>,
        options: BatchOptions,
    ) -> (Self, mpsc::UnboundedReceiver<BatchEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let subscription = pipeline.subscribe();

        let batch = Self {
            pipeline,
            options,
            subscription,
            events,
            selected: Vec::new(),
            uploaded: Vec::new(),
            tracker: ProgressTracker::new(),
            drag_over: false,
            uploading: false,
            completion_reported: false,
        };
        (batch, receiver)
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn selected(&self) -> &[UploadUnit] {
        &self.selected
    }

    pub fn uploaded(&self) -> &[UploadedFile] {
        &self.uploaded
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    fn emit(&self, event: BatchEvent) {
        let _ = self.events.send(event);
    }

    fn rules(&self) -> ValidationRules {
        ValidationRules::new()
            .max_size(self.options.max_size)
            .max_files(self.options.max_files)
    }

    pub fn on_drag_over(&mut self) {
        self.drag_over = true;
    }

    pub fn on_drag_leave(&mut self) {
        self.drag_over = false;
    }

    pub async fn on_drop(&mut self, units: Vec<UploadUnit>) {
        self.drag_over = false;
        self.handle_files(units).await;
    }

    /// Admit newly picked or dropped units
    ///
    /// Each unit is checked against the batch's size limit and category; a
    /// rejected unit produces an `UploadError` event and is skipped. If the
    /// accepted units would push the selection past `max_files`, none of them
    /// are added. Accepted images get a preview entry when previews are on,
    /// and the accepted units are uploaded right away when auto upload is on.
    pub async fn handle_files(&mut self, units: Vec<UploadUnit>) {
        let valid: Vec<UploadUnit> = units.into_iter().filter(|u| self.accepts(u)).collect();
        if valid.is_empty() {
            return;
        }

        if self.selected.len() + valid.len() > self.options.max_files {
            self.emit(BatchEvent::UploadError(format!(
                "Maximum {} files allowed",
                self.options.max_files
            )));
            return;
        }

        self.selected.extend(valid.iter().cloned());
        self.completion_reported = false;
        self.emit(BatchEvent::FilesSelected(
            self.selected.iter().map(|u| u.name().to_string()).collect(),
        ));

        if self.options.show_preview {
            for unit in &valid {
                if !is_image(unit.content_type(), self.pipeline.config()) {
                    continue;
                }
                match self.preview(unit).await {
                    Ok(local_url) => self.uploaded.push(UploadedFile {
                        id: next_file_id(),
                        result: UploadResult {
                            success: false,
                            file_url: String::new(),
                            ..UploadResult::new("", unit)
                        },
                        local_url: Some(local_url),
                    }),
                    Err(err) => warn!("Error generating preview for {}: {}", unit.name(), err),
                }
            }
        }

        if self.options.auto_upload {
            self.upload_files(Some(valid)).await;
        }
    }

    fn accepts(&self, unit: &UploadUnit) -> bool {
        if unit.size() > self.options.max_size {
            self.emit(BatchEvent::UploadError(format!(
                "{} exceeds maximum size of {}",
                unit.name(),
                format_file_size(self.options.max_size)
            )));
            return false;
        }

        let config = self.pipeline.config();
        match self.options.category {
            UploadCategory::Image
                if !UploadCategory::Image.accepts(unit.content_type(), config) =>
            {
                self.emit(BatchEvent::UploadError(format!(
                    "{} is not a valid image file",
                    unit.name()
                )));
                false
            }
            UploadCategory::Document
                if !UploadCategory::Document.accepts(unit.content_type(), config) =>
            {
                self.emit(BatchEvent::UploadError(format!(
                    "{} is not a valid document file",
                    unit.name()
                )));
                false
            }
            _ => true,
        }
    }

    /// Thumbnail-sized preview, or the full image if it cannot be shrunk
    async fn preview(&self, unit: &UploadUnit) -> Result<String> {
        let config = self.pipeline.config();
        let spec = CompressionSpec::thumbnail(config.thumbnail_size, config.compression_quality);
        match compress_image(unit.clone(), spec).await {
            Ok(thumbnail) => preview_data_url(&thumbnail),
            Err(err) => {
                debug!("Thumbnail of {} unavailable: {}", unit.name(), err);
                self.pipeline.preview(unit)
            }
        }
    }

    /// Upload `units`, or every selected unit when `None`
    ///
    /// Images in an image batch with compression on are compressed and sent
    /// concurrently, one request each. Otherwise a single unit goes through
    /// the single-file endpoint and several units share one request.
    pub async fn upload_files(&mut self, units: Option<Vec<UploadUnit>>) {
        let to_upload = units.unwrap_or_else(|| self.selected.clone());
        if to_upload.is_empty() {
            return;
        }

        self.uploading = true;
        self.completion_reported = false;
        for unit in &to_upload {
            self.tracker.apply(ProgressRecord::pending(unit.name()));
        }

        let rules = self.rules();
        let outcomes: Vec<(&UploadUnit, Result<UploadResult>)> =
            if self.options.category == UploadCategory::Image && self.options.compress_images {
                let pipeline = &self.pipeline;
                let options = self.options.image_upload_options();
                join_all(to_upload.iter().map(|unit| async move {
                    (unit, pipeline.upload_image(unit, options).await)
                }))
                .await
            } else if let [unit] = to_upload.as_slice() {
                vec![(unit, self.pipeline.upload_unit(unit, &rules).await)]
            } else {
                self.upload_together(&to_upload, &rules).await
            };

        self.sync_progress();

        for (unit, outcome) in outcomes {
            match outcome {
                Ok(result) => self.handle_upload_success(result, unit),
                Err(err) => self.handle_upload_error(&err, unit),
            }
        }

        self.check_upload_complete();
    }

    /// Send `units` in one request and pair each with its own outcome
    ///
    /// The response lines up with the units that passed validation, so those
    /// are matched by position and rejected units keep their validation error.
    async fn upload_together<'u>(
        &self,
        units: &'u [UploadUnit],
        rules: &ValidationRules,
    ) -> Vec<(&'u UploadUnit, Result<UploadResult>)> {
        let (mut results, failure) = match self.pipeline.upload_multiple_units(units, rules).await {
            Ok(results) => (results.into_iter(), None),
            Err(err) => (Vec::new().into_iter(), Some(err)),
        };

        // nothing was validated or sent
        if let Some(err @ UploadError::TooManyFiles { .. }) = &failure {
            return units.iter().map(|unit| (unit, Err(err.clone()))).collect();
        }

        let rules = self.pipeline.effective_rules(rules);
        units
            .iter()
            .map(|unit| {
                let outcome = match (validate_unit(unit, &rules), &failure) {
                    (Err(err), _) => Err(err),
                    (Ok(()), Some(err)) => Err(err.clone()),
                    (Ok(()), None) => results
                        .next()
                        .ok_or_else(|| UploadError::network(MISSING_RESULT_MESSAGE)),
                };
                (unit, outcome)
            })
            .collect()
    }

    fn handle_upload_success(&mut self, result: UploadResult, unit: &UploadUnit) {
        match self
            .uploaded
            .iter_mut()
            .find(|f| f.result.file_name == unit.name())
        {
            Some(entry) => entry.result = result.clone(),
            None => self.uploaded.push(UploadedFile {
                id: next_file_id(),
                result: result.clone(),
                local_url: None,
            }),
        }

        self.tracker.apply(ProgressRecord::completed(unit.name(), result));
    }

    fn handle_upload_error(&mut self, err: &UploadError, unit: &UploadUnit) {
        let message = err.to_string();
        self.tracker.apply(ProgressRecord::error(unit.name(), message.clone()));
        self.emit(BatchEvent::UploadError(format!("{}: {}", unit.name(), message)));
    }

    /// Fold every record buffered on the progress channel into the tracker
    ///
    /// Returns how many records were applied.
    pub fn sync_progress(&mut self) -> usize {
        let records = self.subscription.drain();
        let applied = records.len();
        for record in records {
            self.tracker.apply(record);
        }
        if applied > 0 {
            self.check_upload_complete();
        }
        applied
    }

    fn check_upload_complete(&mut self) {
        if self.completion_reported {
            return;
        }

        if self
            .tracker
            .is_batch_complete(self.selected.iter().map(UploadUnit::name))
        {
            self.uploading = false;
            self.completion_reported = true;
            let responses = self.tracker.completed_in_arrival_order();
            info!("Batch complete: {} files uploaded", responses.len());
            self.emit(BatchEvent::UploadComplete(responses));
        }
    }

    /// Drop a file from the batch, deleting it remotely if it was uploaded
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns the delete request's error; local state is already updated
    pub async fn remove_file(&mut self, file_id: &str) -> Result<()> {
        let Some(position) = self.uploaded.iter().position(|f| f.id == file_id) else {
            return Ok(());
        };

        let file = self.uploaded.remove(position);
        if let Some(index) = self
            .selected
            .iter()
            .position(|u| u.name() == file.result.file_name)
        {
            self.selected.remove(index);
        }
        self.tracker.remove(&file.result.file_name);
        self.emit(BatchEvent::FileRemoved(file.result.file_url.clone()));

        if !file.result.file_url.is_empty() {
            self.pipeline.delete_file(&file.result.file_url).await?;
        }
        Ok(())
    }

    /// Upload a selected file again
    pub async fn retry_upload(&mut self, file_name: &str) {
        let unit = self.selected.iter().find(|u| u.name() == file_name).cloned();
        if let Some(unit) = unit {
            self.upload_files(Some(vec![unit])).await;
        }
    }

    /// Delete every uploaded file remotely and reset the batch
    ///
    /// Failed deletes are logged and do not stop the reset.
    pub async fn clear_all(&mut self) {
        for file in &self.uploaded {
            if file.result.file_url.is_empty() {
                continue;
            }
            if let Err(err) = self.pipeline.delete_file(&file.result.file_url).await {
                warn!("Failed to delete {}: {}", file.result.file_url, err);
            }
        }

        self.selected.clear();
        self.uploaded.clear();
        self.tracker.clear();
        self.uploading = false;
        self.completion_reported = false;
    }
}
