//! Error types for the submission pipeline.
//!
//! [`ApiError`] is the request-level taxonomy used to decide whether an
//! attempt is retried. It never reaches UI code directly: services flatten it
//! into an [`ApiResponse`](crate::types::ApiResponse). [`SubmissionError`]
//! covers process-level failures such as bad configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a field-scoped failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Network,
    Server,
}

/// A single field-scoped failure. `field` is a dot-notation path such as
/// `teamMembers[0].email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: ErrorKind,
}

impl FieldError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: ErrorKind::Validation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Rejected field values, either by the local validator or by a 422 response.
    #[error("{message}")]
    Validation {
        message: String,
        field_messages: IndexMap<String, String>,
    },

    #[error("Request timeout")]
    Timeout,

    /// Connection-level failure; `detail` is for logs only.
    #[error("Network connection failed")]
    Network { detail: String },

    /// A completed 4xx/5xx response carrying a usable message.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// A response whose error body could not be decoded, or an unexpected status.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("An unexpected error occurred")]
    Unexpected { detail: String },
}

impl ApiError {
    /// Only transport-level failures are retried. Completed HTTP responses,
    /// 5xx included, are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Timeout | Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } | Self::Http { .. } | Self::Unexpected { .. } => ErrorKind::Server,
        }
    }

    /// Build a validation error from the validator's output. The first error
    /// becomes the top-level message; later errors for an already-seen field
    /// are dropped from the map.
    pub fn from_field_errors(errors: &[FieldError]) -> Self {
        let message = errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Validation failed".to_string());
        let mut field_messages = IndexMap::new();
        for error in errors {
            field_messages
                .entry(error.field.clone())
                .or_insert_with(|| error.message.clone());
        }
        Self::Validation {
            message,
            field_messages,
        }
    }

    /// Field messages to surface for form highlighting.
    pub fn field_messages(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Self::Validation { field_messages, .. } if !field_messages.is_empty() => {
                Some(field_messages)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SubmissionError>;
