//! Error handling for the upload pipeline
//!
//! This module defines the error type shared by validation, compression,
//! transport and progress tracking, plus the classification of transport
//! failures by HTTP status.

use thiserror::Error;

fn format_size(bytes: &u64) -> String {
    bytesize::ByteSize::b(*bytes).to_string()
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, UploadError>;

/// Sub-classification of a failed network round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailureKind {
    /// The server answered 413
    PayloadTooLarge,
    /// The server answered 415
    UnsupportedMediaType,
    /// Any other transport or server failure
    Generic,
}

impl NetworkFailureKind {
    /// Classify a transport status code
    pub fn from_status(status: u16) -> Self {
        match status {
            413 => NetworkFailureKind::PayloadTooLarge,
            415 => NetworkFailureKind::UnsupportedMediaType,
            _ => NetworkFailureKind::Generic,
        }
    }
}

/// Fieldless view of [`UploadError`] for callers that only need to branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SizeExceeded,
    TypeNotAllowed,
    TooManyFiles,
    CompressionFailed,
    NetworkFailure(NetworkFailureKind),
    NoValidUnits,
    PreviewUnavailable,
    InvalidParameter,
    Config,
    Io,
}

/// Error types that can occur while validating, compressing or uploading units
#[derive(Error, Debug)]
pub enum UploadError {
    /// Unit is larger than the configured maximum
    #[error("File size exceeds maximum allowed size of {}", format_size(.max_size))]
    SizeExceeded {
        file_name: String,
        size: u64,
        max_size: u64,
    },

    /// Declared content type is not in the allowed set
    #[error("File type {content_type} is not allowed")]
    TypeNotAllowed {
        file_name: String,
        content_type: String,
    },

    /// More units were offered than the rules permit
    #[error("Maximum {max_files} files allowed")]
    TooManyFiles { count: usize, max_files: usize },

    /// Image could not be decoded or re-encoded
    #[error("Failed to compress image {file_name}: {message}")]
    CompressionFailed { file_name: String, message: String },

    /// Network round trip failed
    #[error("{message}")]
    Network {
        kind: NetworkFailureKind,
        message: String,
    },

    /// Every unit of a multi-unit submission failed validation
    #[error("No valid files to upload")]
    NoValidUnits,

    /// Preview requested for a non-image unit
    #[error("File is not an image: {file_name}")]
    PreviewUnavailable { file_name: String },

    /// Invalid parameter
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploadError {
    /// Create a new size exceeded error
    pub fn size_exceeded(file_name: impl Into<String>, size: u64, max_size: u64) -> Self {
        UploadError::SizeExceeded {
            file_name: file_name.into(),
            size,
            max_size,
        }
    }

    /// Create a new type not allowed error
    pub fn type_not_allowed(file_name: impl Into<String>, content_type: impl Into<String>) -> Self {
        UploadError::TypeNotAllowed {
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a new too many files error
    pub fn too_many_files(count: usize, max_files: usize) -> Self {
        UploadError::TooManyFiles { count, max_files }
    }

    /// Create a new compression error
    pub fn compression_failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::CompressionFailed {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// Create a network error from a transport status and optional server message
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let kind = NetworkFailureKind::from_status(status);
        let message = match kind {
            NetworkFailureKind::PayloadTooLarge => "File is too large".to_string(),
            NetworkFailureKind::UnsupportedMediaType => "File type not supported".to_string(),
            NetworkFailureKind::Generic => {
                server_message.unwrap_or_else(|| "File upload failed".to_string())
            }
        };
        UploadError::Network { kind, message }
    }

    /// Create a generic network error
    pub fn network(message: impl Into<String>) -> Self {
        UploadError::Network {
            kind: NetworkFailureKind::Generic,
            message: message.into(),
        }
    }

    /// Create a new preview unavailable error
    pub fn preview_unavailable(file_name: impl Into<String>) -> Self {
        UploadError::PreviewUnavailable {
            file_name: file_name.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        UploadError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        UploadError::ConfigError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            UploadError::TypeNotAllowed { .. } => ErrorKind::TypeNotAllowed,
            UploadError::TooManyFiles { .. } => ErrorKind::TooManyFiles,
            UploadError::CompressionFailed { .. } => ErrorKind::CompressionFailed,
            UploadError::Network { kind, .. } => ErrorKind::NetworkFailure(*kind),
            UploadError::NoValidUnits => ErrorKind::NoValidUnits,
            UploadError::PreviewUnavailable { .. } => ErrorKind::PreviewUnavailable,
            UploadError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            UploadError::ConfigError { .. } => ErrorKind::Config,
            UploadError::Io(_) | UploadError::Json(_) => ErrorKind::Io,
        }
    }

    /// Whether this error came from local validation rather than the network
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::SizeExceeded { .. }
                | UploadError::TypeNotAllowed { .. }
                | UploadError::TooManyFiles { .. }
                | UploadError::NoValidUnits
        )
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => UploadError::from_status(status.as_u16(), None),
            None => UploadError::network(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for UploadError {
    fn from(err: tokio::task::JoinError) -> Self {
        UploadError::Io(std::io::Error::other(err))
    }
}

impl Clone for UploadError {
    fn clone(&self) -> Self {
        match self {
            UploadError::SizeExceeded {
                file_name,
                size,
                max_size,
            } => UploadError::size_exceeded(file_name.clone(), *size, *max_size),
            UploadError::TypeNotAllowed {
                file_name,
                content_type,
            } => UploadError::type_not_allowed(file_name.clone(), content_type.clone()),
            UploadError::TooManyFiles { count, max_files } => {
                UploadError::too_many_files(*count, *max_files)
            }
            UploadError::CompressionFailed { file_name, message } => {
                UploadError::compression_failed(file_name.clone(), message.clone())
            }
            UploadError::Network { kind, message } => UploadError::Network {
                kind: *kind,
                message: message.clone(),
            },
            UploadError::NoValidUnits => UploadError::NoValidUnits,
            UploadError::PreviewUnavailable { file_name } => {
                UploadError::preview_unavailable(file_name.clone())
            }
            UploadError::InvalidParameter { parameter, message } => {
                UploadError::invalid_parameter(parameter.clone(), message.clone())
            }
            UploadError::ConfigError { message } => UploadError::config_error(message.clone()),
            UploadError::Io(e) => UploadError::Io(std::io::Error::new(e.kind(), e.to_string())),
            UploadError::Json(e) => UploadError::network(format!("JSON error: {}", e)),
        }
    }
}
