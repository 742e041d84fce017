//! Error types for the indexing schema.
//!
//! Every outcome of a store request other than success is a [`SchemaError`].
//! Errors travel through a [`Deferred`](crate::deferred::Deferred) handle and
//! may be observed by several waiters, so the type is `Clone` and keeps any
//! underlying source behind an `Arc`.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::sync::Arc;

use thiserror::Error;

/// Boxed error handed to [`ResponseCallback::failed`](crate::transport::ResponseCallback::failed).
pub type TransportFailure = Box<dyn std::error::Error + Send + Sync>;

/// The error type for all schema operations.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    /// Null or empty input detected before any network call.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A required setting is missing or malformed.
    #[error("missing config '{key}': {message}")]
    Configuration { key: String, message: String },

    /// The store answered with a non-2xx status.
    #[error("Unable to post meta data. Status code: {status} Content: {body}")]
    Store { status: u16, body: String },

    /// The transport failed, or the response could not be classified.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    /// The request was cancelled before the store answered.
    #[error("{message}")]
    Cancelled { message: String },

    /// A bounded wait on a handle elapsed before it was resolved.
    #[error("timed out after {timeout_ms}ms waiting for a result")]
    Timeout { timeout_ms: u64 },
}

impl SchemaError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        SchemaError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        SchemaError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for a cancelled request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SchemaError::Cancelled { .. })
    }

    /// Returns `true` when a bounded wait timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SchemaError::Timeout { .. })
    }

    /// Returns the HTTP status code of a store error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SchemaError::Store { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportFailure> for SchemaError {
    fn from(err: TransportFailure) -> Self {
        SchemaError::Transport {
            message: err.to_string(),
            source: Some(Arc::from(err)),
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Transport {
            message: format!("serialization failed: {}", err),
            source: Some(Arc::new(err)),
        }
    }
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
