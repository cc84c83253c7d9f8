use crate::upload::types::UploadResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a unit is in its upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadState {
    Pending,
    Uploading,
    Completed { response: UploadResult },
    Error { error: String },
}

/// Payload-free view of [`UploadState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

impl UploadState {
    pub fn status(&self) -> UploadStatus {
        match self {
            UploadState::Pending => UploadStatus::Pending,
            UploadState::Uploading => UploadStatus::Uploading,
            UploadState::Completed { .. } => UploadStatus::Completed,
            UploadState::Error { .. } => UploadStatus::Error,
        }
    }
}

/// One observation of a unit's upload, keyed by file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub file_name: String,
    /// Percentage, 0 to 100
    pub progress: u8,
    #[serde(flatten)]
    pub state: UploadState,
}

impl ProgressRecord {
    pub fn pending(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            progress: 0,
            state: UploadState::Pending,
        }
    }

    pub fn uploading(file_name: impl Into<String>, progress: u8) -> Self {
        Self {
            file_name: file_name.into(),
            progress: progress.min(100),
            state: UploadState::Uploading,
        }
    }

    pub fn completed(file_name: impl Into<String>, response: UploadResult) -> Self {
        Self {
            file_name: file_name.into(),
            progress: 100,
            state: UploadState::Completed { response },
        }
    }

    pub fn error(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            progress: 0,
            state: UploadState::Error {
                error: error.into(),
            },
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.state.status()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, UploadState::Completed { .. })
    }

    /// Completed and error records end a unit's upload
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            UploadState::Completed { .. } | UploadState::Error { .. }
        )
    }

    pub fn response(&self) -> Option<&UploadResult> {
        match &self.state {
            UploadState::Completed { response } => Some(response),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            UploadState::Error { error } => Some(error),
            _ => None,
        }
    }
}
