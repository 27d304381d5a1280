#![forbid(unsafe_code)]

//! Reactive cells, links and change notification.
//!
//! - [`State`]: an owned, version-tracked cell. Exactly one owner.
//! - [`Link`]: a non-owning two-way handle to a `State`; fails with
//!   [`CellError::DanglingReference`](crate::error::CellError) once the owner
//!   is gone.
//! - [`Projection`]: a mapped two-way view of a cell through a `Link`.
//! - [`Observable`]: a shared (multi-owner) observable value; the notification
//!   engine under `State` and the carrier for environment values.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Computed`]: lazily evaluated, memoized value derived from sources.
//! - [`Binding`] / [`TwoWayBinding`] / [`BindingScope`]: uncached derived
//!   reads, bidirectional sync and subscription lifetime management.
//! - [`BatchScope`]: defers notifications until the outermost scope exits.
//!
//! # Architecture
//!
//! Everything is single-threaded: `Rc<RefCell<..>>` storage, no `Send` or
//! `Sync`. Subscribers are held as `Weak` callbacks and pruned lazily during
//! notification. A `State` holds the only strong reference to its value;
//! links hold a weak reference plus a shared lifecycle flag, which the owner
//! flips before releasing the value.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per write that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. No stale reads: any read after a completed write sees that write.
//! 6. Within a `BatchScope`, values update immediately but notifications are
//!    deferred until the outermost scope exits.

pub mod batch;
pub mod binding;
pub mod computed;
pub mod observable;
pub mod source;
pub mod state;

pub use batch::{BatchScope, batch, is_batching};
pub use binding::{
    Binding, BindingScope, TwoWayBinding, bind_mapped, bind_mapped2, bind_source,
};
pub use computed::Computed;
pub use observable::{Observable, Subscription, WeakObservable};
pub use source::{Sink, Source};
pub use state::{Lifecycle, Link, Projection, State};
