//! Cancellation plumbing and the per-search stream session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use crate::dispatch::Dispatcher;
use crate::reader::LineBuffer;

#[derive(Debug, Default)]
struct AbortState {
    aborted: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation signal for one search.
///
/// Clones share the same signal. Once aborted it stays aborted.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    state: Arc<AbortState>,
}

impl AbortHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.state.aborted.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once [`AbortHandle::abort`] has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent abort is not missed.
            let notified = self.state.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Tracks the single in-flight search of a [`crate::Discovery`].
///
/// Cloneable so another task can cancel the running search.
#[derive(Debug, Clone, Default)]
pub struct SearchController {
    current: Arc<Mutex<Option<AbortHandle>>>,
}

impl SearchController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts any running search and installs a fresh handle for the next one.
    #[must_use]
    pub fn begin(&self) -> AbortHandle {
        let handle = AbortHandle::new();
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.replace(handle.clone()) {
            tracing::debug!("cancelling previous in-flight search");
            previous.abort();
        }
        handle
    }

    /// Cancels the running search, if any.
    pub fn cancel(&self) {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = current.as_ref() {
            handle.abort();
        }
    }

    /// Clears the slot if `handle` is still the current search.
    pub fn finish(&self, handle: &AbortHandle) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|c| c.same_as(handle)) {
            *current = None;
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// State exclusively owned by the one in-flight search.
#[derive(Debug)]
pub struct StreamSession {
    pub abort: AbortHandle,
    pub lines: LineBuffer,
    pub dispatcher: Dispatcher,
}

impl StreamSession {
    #[must_use]
    pub fn new(abort: AbortHandle, dispatcher: Dispatcher) -> Self {
        Self {
            abort,
            lines: LineBuffer::new(),
            dispatcher,
        }
    }
}
