//! # Failure Classification
//!
//! Every failure the processing handler can raise is either
//! [`Retryable`](ProcessingError::Retryable) or
//! [`NonRetryable`](ProcessingError::NonRetryable). The retry chain only ever
//! looks at [`FailureKind`], never at the cause.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Transient: upstream unavailable, 5xx, timeout
    #[error("Retryable processing failure: {message}")]
    Retryable {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Permanent: malformed data or a broken upstream contract
    #[error("Non-retryable processing failure: {message}")]
    NonRetryable {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Retryable,
    NonRetryable,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Retryable => "retryable",
            FailureKind::NonRetryable => "non_retryable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProcessingError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
            source: None,
        }
    }

    pub fn retryable_caused_by(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Retryable {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self::NonRetryable {
            message: message.into(),
            source: None,
        }
    }

    pub fn non_retryable_caused_by(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::NonRetryable {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Retryable { .. } => FailureKind::Retryable,
            Self::NonRetryable { .. } => FailureKind::NonRetryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Retryable
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Retryable { message, .. } | Self::NonRetryable { message, .. } => message,
        }
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
