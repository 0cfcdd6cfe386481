//! Error types for SQS client operations.
//!
//! Every failure surfaced by the client is a [`SqsError`]. Nothing in this crate
//! retries on its own; [`SqsError::is_transient`] exists so callers can build
//! their own retry policy on top.

use crate::model::DeleteMessageBatchEntry;
use crate::signer::SigningError;
use thiserror::Error;

/// Comprehensive error type for all client operations
#[derive(Debug, Error)]
pub enum SqsError {
    /// The queue ARN names a region other than the one the client is bound to.
    #[error("Region {queue_region} does not match {client_region}")]
    RegionMismatch {
        queue_region: String,
        client_region: String,
    },

    #[error("Invalid queue ARN '{arn}': {message}")]
    InvalidQueueArn { arn: String, message: String },

    /// A parameter had the wrong shape (e.g. a batch that is not a list).
    #[error("{message}")]
    InvalidArgument { message: String },

    /// Non-200 response. `message` is the best-effort extracted error text.
    #[error("{message}")]
    Protocol { status: u16, message: String },

    /// Connection, timeout or I/O failure reported by the transport.
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A delete batch chunk failed; `entries` were in flight and may have been
    /// partially applied by the service.
    #[error("Error {source}\n Deleting messages: {}", render_entries(.entries))]
    BatchPartialFailure {
        source: Box<SqsError>,
        entries: Vec<DeleteMessageBatchEntry>,
    },

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl SqsError {
    /// Build a transport error that keeps the underlying cause.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if error is transient and the request may succeed if repeated
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RegionMismatch { .. } => false,
            Self::InvalidQueueArn { .. } => false,
            Self::InvalidArgument { .. } => false,
            Self::Protocol { status, .. } => *status >= 500 || *status == 429,
            Self::Transport { .. } => true,
            Self::BatchPartialFailure { source, .. } => source.is_transient(),
            Self::Serialization(_) => false,
            Self::Signing(_) => false,
            Self::Configuration { .. } => false,
        }
    }

    /// HTTP status of the failing response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::BatchPartialFailure { source, .. } => source.status(),
            _ => None,
        }
    }
}

fn render_entries(entries: &[DeleteMessageBatchEntry]) -> String {
    serde_json::to_string(entries).unwrap_or_else(|_| format!("{:?}", entries))
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
