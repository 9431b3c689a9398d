//! Error types for the inference session manager.

use std::result;
use thiserror::Error;

use crate::session::RequestId;

/// A specialized Result type for session operations.
pub type Result<T> = result::Result<T, Error>;

/// The error type for session operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors, including a missing model artifact
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generation request is already streaming
    #[error("Generation already in flight (request {request_id})")]
    Busy { request_id: RequestId },

    /// Engine construction or start failures
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Missing model artifact at `path`.
    pub fn model_not_found(path: &std::path::Path) -> Self {
        Error::Config(format!("Model not found at path: {}", path.display()))
    }

    /// Whether the call was rejected only because another request is streaming.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy { .. })
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
