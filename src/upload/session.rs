//! Chunked upload session
//!
//! A session sends a unit's chunks strictly one after another, then asks the
//! server to assemble them. Any failure ends the session; chunks already sent
//! are not resent and nothing is cleaned up on the server.

use crate::error::{Result, UploadError};
use crate::progress::{ProgressChannel, ProgressRecord};
use crate::transport::Transport;
use crate::upload::chunks::{chunk_percent, split_into_chunks, Chunk};
use crate::upload::types::{UploadResult, UploadUnit};
use log::{debug, info, warn};

/// Where a session is
#[derive(Debug, Clone)]
pub enum ChunkedState {
    /// Next chunk to send
    SendingChunk(usize),
    Finalizing,
    Done(UploadResult),
    Failed(UploadError),
}

impl ChunkedState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkedState::Done(_) | ChunkedState::Failed(_))
    }
}

/// Sequential chunk upload of one unit
pub struct ChunkedUpload<'a, T: Transport + ?Sized> {
    transport: &'a T,
    progress: &'a ProgressChannel,
    file_name: String,
    chunks: Vec<Chunk>,
    state: ChunkedState,
}

impl<'a, T: Transport + ?Sized> ChunkedUpload<'a, T> {
    /// Prepare a session for `unit`
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `chunk_size` is 0
    pub fn new(
        transport: &'a T,
        progress: &'a ProgressChannel,
        unit: &UploadUnit,
        chunk_size: usize,
    ) -> Result<Self> {
        let chunks = split_into_chunks(unit, chunk_size)?;
        let state = if chunks.is_empty() {
            ChunkedState::Finalizing
        } else {
            ChunkedState::SendingChunk(0)
        };

        debug!(
            "Chunked upload of {}: {} bytes in {} chunks",
            unit.name(),
            unit.size(),
            chunks.len()
        );

        Ok(Self {
            transport,
            progress,
            file_name: unit.name().to_string(),
            chunks,
            state,
        })
    }

    pub fn state(&self) -> &ChunkedState {
        &self.state
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Advance by one transport call. Does nothing once terminal.
    pub async fn step(&mut self) {
        let next = match &self.state {
            ChunkedState::SendingChunk(index) => {
                let index = *index;
                match self.transport.send_chunk(&self.chunks[index]).await {
                    Ok(()) => {
                        let total = self.chunks.len();
                        self.progress.publish(ProgressRecord::uploading(
                            &self.file_name,
                            chunk_percent(index + 1, total),
                        ));
                        if index + 1 < total {
                            ChunkedState::SendingChunk(index + 1)
                        } else {
                            ChunkedState::Finalizing
                        }
                    }
                    Err(err) => ChunkedState::Failed(err),
                }
            }
            ChunkedState::Finalizing => match self.transport.finalize(&self.file_name).await {
                Ok(result) => ChunkedState::Done(result),
                Err(err) => ChunkedState::Failed(err),
            },
            ChunkedState::Done(_) | ChunkedState::Failed(_) => return,
        };

        match &next {
            ChunkedState::Done(result) => {
                info!("Chunked upload of {} finalized", self.file_name);
                self.progress.publish(ProgressRecord::completed(&self.file_name, result.clone()));
            }
            ChunkedState::Failed(err) => {
                warn!("Chunked upload of {} failed: {}", self.file_name, err);
                self.progress.publish(ProgressRecord::error(&self.file_name, err.to_string()));
            }
            _ => {}
        }

        self.state = next;
    }

    /// Drive the session to the end
    pub async fn run(mut self) -> Result<UploadResult> {
        self.progress.publish(ProgressRecord::uploading(&self.file_name, 0));

        loop {
            match &self.state {
                ChunkedState::Done(result) => return Ok(result.clone()),
                ChunkedState::Failed(err) => return Err(err.clone()),
                _ => self.step().await,
            }
        }
    }
}
