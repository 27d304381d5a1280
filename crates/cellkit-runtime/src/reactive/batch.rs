#![forbid(unsafe_code)]

//! Deferred notification for grouped writes.
//!
//! While a [`BatchScope`] is alive on the current thread, observables still
//! update their values immediately, but subscriber notification is queued.
//! When the outermost scope drops, each queued observable is notified exactly
//! once, with whatever value it holds at that moment.
//!
//! # Invariants
//!
//! 1. Nested scopes are allowed; only the outermost scope flushes.
//! 2. An observable written N times inside one batch is notified once.
//! 3. Flush order follows the order of each observable's first write.
//! 4. Writes made by callbacks during the flush notify immediately (the batch
//!    is already closed).

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

struct PendingNotify {
    key: usize,
    notify: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct BatchContext {
    depth: u32,
    pending: Vec<PendingNotify>,
}

thread_local! {
    static BATCH: RefCell<BatchContext> = RefCell::new(BatchContext::default());
}

/// Queue `notify` under `key` if a batch is open.
///
/// Returns `false` when no batch is open; the caller should notify directly.
pub(crate) fn defer(key: usize, notify: impl FnOnce() + 'static) -> bool {
    BATCH.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        if ctx.depth == 0 {
            return false;
        }
        if !ctx.pending.iter().any(|p| p.key == key) {
            ctx.pending.push(PendingNotify {
                key,
                notify: Box::new(notify),
            });
        }
        true
    })
}

/// Whether a batch is open on this thread.
#[must_use]
pub fn is_batching() -> bool {
    BATCH.with(|ctx| ctx.borrow().depth > 0)
}

/// Run `f` inside a batch and flush on return.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

/// RAII guard that defers observable notifications until dropped.
#[must_use = "notifications flush as soon as the scope is dropped"]
pub struct BatchScope {
    _not_send: PhantomData<Rc<()>>,
}

impl BatchScope {
    /// Open a batch (or nest inside the current one).
    pub fn new() -> Self {
        BATCH.with(|ctx| ctx.borrow_mut().depth += 1);
        Self {
            _not_send: PhantomData,
        }
    }

    /// Number of observables waiting to be notified.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        BATCH.with(|ctx| ctx.borrow().pending.len())
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let pending = BATCH.with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.depth = ctx.depth.saturating_sub(1);
            if ctx.depth == 0 {
                std::mem::take(&mut ctx.pending)
            } else {
                Vec::new()
            }
        });
        if !pending.is_empty() {
            tracing::trace!(message = "batch.flush", count = pending.len());
        }
        for entry in pending {
            (entry.notify)();
        }
    }
}

impl std::fmt::Debug for BatchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScope")
            .field("pending", &self.pending_count())
            .finish()
    }
}
