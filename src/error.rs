//! Error types for the sync layer.
//!
//! Everything below the `Board` boundary returns [`SyncResult`]; the board turns
//! failures into [`crate::sync::Outcome`] values so callers never see an error
//! from a collection operation.

use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store returned status {0}")]
    Status(u16),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("remote store rejected the request: {0}")]
    Rejected(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SyncError {
    pub fn decode(message: impl Into<String>) -> Self {
        SyncError::Decode(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        SyncError::Rejected(message.into())
    }
}

/// A client-side rule violation, caught before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
