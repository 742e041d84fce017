//! Single-assignment result cell.
//!
//! A [`Deferred`] is the caller's view of a result that becomes available
//! later; its [`Resolver`] is the only writer. A handle is resolved at most
//! once and may be observed by any number of waiters, either by blocking
//! ([`Deferred::join`], [`Deferred::join_timeout`]), by registering a
//! continuation ([`Deferred::add_callback`]), or by awaiting it as a future.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tsmeta_search::deferred::Deferred;
//!
//! let (deferred, resolver) = Deferred::<bool>::pending();
//! assert!(deferred.join_timeout(Duration::from_millis(1)).unwrap_err().is_timeout());
//!
//! assert!(resolver.resolve(Ok(true)));
//! assert!(deferred.join().unwrap());
//! ```

use std::fmt::Debug;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{SchemaError, SchemaResult};

type Callback<T> = Box<dyn FnOnce(&SchemaResult<T>) + Send>;

struct State<T> {
    outcome: Option<SchemaResult<T>>,
    callbacks: Vec<Callback<T>>,
    wakers: Vec<Waker>,
}

struct Shared<T> {
    resolved: AtomicBool,
    state: Mutex<State<T>>,
    ready: Condvar,
}

/// Observer side of a single-assignment result.
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

/// Writer side of a single-assignment result.
pub struct Resolver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("resolved", &self.shared.resolved.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Deferred<T> {
    /// Creates an unresolved handle and the resolver that completes it.
    pub fn pending() -> (Deferred<T>, Resolver<T>) {
        let shared = Arc::new(Shared {
            resolved: AtomicBool::new(false),
            state: Mutex::new(State {
                outcome: None,
                callbacks: Vec::new(),
                wakers: Vec::new(),
            }),
            ready: Condvar::new(),
        });
        (
            Deferred {
                shared: Arc::clone(&shared),
            },
            Resolver { shared },
        )
    }

    /// Creates a handle that is already resolved with `outcome`.
    pub fn from_result(outcome: SchemaResult<T>) -> Deferred<T> {
        let (deferred, resolver) = Self::pending();
        resolver.resolve(outcome);
        deferred
    }

    /// Creates a handle that is already resolved with `error`.
    pub fn from_error(error: SchemaError) -> Deferred<T> {
        Self::from_result(Err(error))
    }

    /// Returns `true` once the handle has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.shared.state.lock().outcome.is_some()
    }

    /// Returns the outcome without waiting, if there is one.
    pub fn try_result(&self) -> Option<SchemaResult<T>> {
        self.shared.state.lock().outcome.clone()
    }

    /// Blocks the current thread until the handle is resolved.
    pub fn join(&self) -> SchemaResult<T> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            self.shared.ready.wait(&mut state);
        }
    }

    /// Blocks for at most `timeout`.
    ///
    /// An elapsed wait returns [`SchemaError::Timeout`] and leaves the handle
    /// untouched; a later wait still observes the eventual outcome. A timeout
    /// too large to represent as a deadline waits without bound.
    pub fn join_timeout(&self, timeout: Duration) -> SchemaResult<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.join();
        };
        let mut state = self.shared.state.lock();
        loop {
            if let Some(outcome) = &state.outcome {
                return outcome.clone();
            }
            if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                return match &state.outcome {
                    Some(outcome) => outcome.clone(),
                    None => Err(SchemaError::Timeout {
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }),
                };
            }
        }
    }

    /// Registers a continuation invoked with the outcome.
    ///
    /// Runs immediately on the calling thread if the handle is already
    /// resolved, otherwise on the thread that resolves it.
    pub fn add_callback<F>(&self, callback: F)
    where
        F: FnOnce(&SchemaResult<T>) + Send + 'static,
    {
        let outcome = {
            let mut state = self.shared.state.lock();
            match &state.outcome {
                Some(outcome) => outcome.clone(),
                None => {
                    state.callbacks.push(Box::new(callback));
                    return;
                }
            }
        };
        callback(&outcome);
    }
}

impl<T: Clone + Send + 'static> Future for Deferred<T> {
    type Output = SchemaResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock();
        if let Some(outcome) = &state.outcome {
            return Poll::Ready(outcome.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Resolves the handle.
    ///
    /// Returns `false` without touching the handle if it was already resolved.
    /// Waiters are woken before continuations run, and a panicking
    /// continuation is logged without reaching the caller.
    pub fn resolve(&self, outcome: SchemaResult<T>) -> bool {
        if self.shared.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }

        let (callbacks, wakers) = {
            let mut state = self.shared.state.lock();
            state.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.wakers),
            )
        };
        self.shared.ready.notify_all();
        for waker in wakers {
            waker.wake();
        }

        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))).is_err() {
                tracing::error!("Continuation panicked while handling a resolved result");
            }
        }
        true
    }

    /// Returns `true` once [`Resolver::resolve`] has been called.
    pub fn is_resolved(&self) -> bool {
        self.shared.resolved.load(Ordering::Acquire)
    }
}
