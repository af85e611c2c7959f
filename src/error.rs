//! Top-level error type for bootstrap, configuration and messaging failures.
//!
//! Per-message processing failures are not reported through this type; they are
//! classified as [`ProcessingError`](crate::processing::ProcessingError) so the
//! retry chain can route them.

use thiserror::Error;

use crate::messaging::MessagingError;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl ProcessorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker(message.into())
    }
}

impl From<reqwest::Error> for ProcessorError {
    fn from(err: reqwest::Error) -> Self {
        ProcessorError::HttpClient(err.to_string())
    }
}

impl From<config::ConfigError> for ProcessorError {
    fn from(err: config::ConfigError) -> Self {
        ProcessorError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
