//! Callback-to-deferred bridge.
//!
//! A [`ResponseBridge`] is handed to the transport with every request. Whichever
//! event the transport delivers, the bridge classifies it, updates the schema's
//! [`Counters`], and resolves the caller's [`Deferred`](crate::deferred::Deferred)
//! exactly once. It runs on the transport's thread, so nothing it does may
//! unwind into the caller of the event.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::deferred::Resolver;
use crate::error::{SchemaError, SchemaResult, TransportFailure};
use crate::transport::{ResponseCallback, StoreResponse};

/// Message used for every cancelled request, whatever the operation.
pub const CANCELLED_MESSAGE: &str = "Index call was cancelled.";

/// The write operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create or replace a document.
    Index,
    /// Remove a document.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Index => write!(f, "index"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Operational counters owned by one schema instance.
#[derive(Debug, Default)]
pub struct Counters {
    added: AtomicU64,
    deleted: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    /// Successfully indexed documents.
    pub fn added(&self) -> u64 {
        self.added.load(Ordering::Acquire)
    }

    /// Successfully deleted documents.
    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Acquire)
    }

    /// Requests that ended in any error.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Acquire)
    }

    pub(crate) fn success_counter(&self, operation: Operation) -> &AtomicU64 {
        match operation {
            Operation::Index => &self.added,
            Operation::Delete => &self.deleted,
        }
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::AcqRel);
    }
}

/// Releases the wrapped response when dropped, on every exit path.
struct ReleaseGuard {
    response: Box<dyn StoreResponse>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if let Err(e) = self.response.release() {
            tracing::warn!("Failed to release store response: {}", e);
        }
    }
}

/// Classifies a completed response.
///
/// A 2xx status bumps `success` and yields `true`; anything else bumps
/// `errors` and yields a store error carrying the body. A failure reading the
/// body is returned as a transport error and also counted. The response is
/// released before this returns, even if classification panics.
pub(crate) fn classify(
    response: Box<dyn StoreResponse>,
    success: &AtomicU64,
    errors: &AtomicU64,
) -> SchemaResult<bool> {
    let mut guard = ReleaseGuard { response };
    let status = guard.response.status();
    if (200..=299).contains(&status) {
        success.fetch_add(1, Ordering::AcqRel);
        return Ok(true);
    }

    errors.fetch_add(1, Ordering::AcqRel);
    match guard.response.body_text() {
        Ok(body) => {
            tracing::debug!("Store rejected request with status {}: {}", status, body);
            Err(SchemaError::Store { status, body })
        }
        Err(e) => {
            tracing::error!("Unexpected exception parsing content: {}", e);
            Err(e)
        }
    }
}

/// Adapts the transport's three-event callback to a single resolution.
pub struct ResponseBridge {
    resolver: Resolver<bool>,
    counters: Arc<Counters>,
    operation: Operation,
    delivered: bool,
}

impl ResponseBridge {
    /// Creates a bridge that resolves `resolver` and counts successes under
    /// `operation`.
    pub fn new(resolver: Resolver<bool>, counters: Arc<Counters>, operation: Operation) -> Self {
        Self {
            resolver,
            counters,
            operation,
            delivered: false,
        }
    }

    fn deliver<F>(&mut self, handle: F)
    where
        F: FnOnce(&Counters, Operation) -> SchemaResult<bool>,
    {
        self.delivered = true;
        let counters: &Counters = &self.counters;
        let operation = self.operation;
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handle(counters, operation)))
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Panic while handling {} response: {}", operation, message);
                Err(SchemaError::transport(format!(
                    "panic while handling response: {}",
                    message
                )))
            }
        };

        if !self.resolver.resolve(outcome) {
            tracing::warn!("Dropping duplicate outcome for {} request", operation);
        }
    }
}

impl ResponseCallback for ResponseBridge {
    fn completed(mut self: Box<Self>, response: Box<dyn StoreResponse>) {
        self.deliver(|counters, operation| {
            classify(
                response,
                counters.success_counter(operation),
                &counters.errors,
            )
        });
    }

    fn failed(mut self: Box<Self>, error: TransportFailure) {
        self.deliver(|counters, _| {
            counters.record_error();
            Err(SchemaError::from(error))
        });
    }

    fn cancelled(mut self: Box<Self>) {
        self.deliver(|counters, _| {
            counters.record_error();
            Err(SchemaError::Cancelled {
                message: CANCELLED_MESSAGE.to_string(),
            })
        });
    }
}

impl Drop for ResponseBridge {
    fn drop(&mut self) {
        if !self.delivered {
            tracing::warn!(
                "{} callback dropped without an outcome; treating as cancelled",
                self.operation
            );
            self.deliver(|counters, _| {
                counters.record_error();
                Err(SchemaError::Cancelled {
                    message: CANCELLED_MESSAGE.to_string(),
                })
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
