#![forbid(unsafe_code)]

//! Binding utilities for connecting reactive values to view state.
//!
//! A [`Binding<T>`] takes a source plus an optional transform, re-evaluated on
//! every read. The [`bind!`] and [`bind_map!`] macros provide sugar.
//!
//! Bindings take their sources by value: a [`Link`](super::Link) handed to a
//! binding moves into it, so the owner stays the only place links come from.
//!
//! # Usage
//!
//! ```
//! use cellkit_runtime::reactive::State;
//! use cellkit_runtime::{bind, bind_map};
//!
//! # fn main() -> cellkit_runtime::Result<()> {
//! let count = State::new(0);
//!
//! let raw = bind!(count.link());
//! let label = bind_map!(count.link(), |c: &i32| format!("Count: {c}"));
//!
//! count.set(5);
//! assert_eq!(raw.get()?, 5);
//! assert_eq!(label.get()?, "Count: 5");
//! # Ok(())
//! # }
//! ```
//!
//! # Two-Way Bindings
//!
//! [`TwoWayBinding`] keeps two writable sources in sync, for example a cell
//! owned by one view and a shared value from the environment.
//!
//! # Invariants
//!
//! 1. `Binding::get()` always reflects the current source value.
//! 2. Transforms run on every `get()` (no caching); use
//!    [`Computed`](super::Computed) when memoization matters.
//! 3. `TwoWayBinding` cannot loop: a re-entrancy guard stops echo writes.
//! 4. Dropping a `TwoWayBinding` or [`BindingScope`] releases its
//!    subscriptions.
//!
//! # Failure Modes
//!
//! - Source cell destroyed: `get()` returns the dangling-reference error.
//! - A two-way propagation that hits a destroyed cell is dropped and logged at
//!   debug level; the error surfaces on the next direct use of that handle.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::Result;

use super::observable::Subscription;
use super::source::{Sink, Source};

// ---------------------------------------------------------------------------
// Derived reads
// ---------------------------------------------------------------------------

/// A read-only, uncached view of a source.
pub struct Binding<T> {
    eval: Rc<dyn Fn() -> Result<T>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            eval: Rc::clone(&self.eval),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("value", &self.get())
            .finish()
    }
}

impl<T: 'static> Binding<T> {
    /// Create a binding that evaluates `f` on each `get()`.
    pub fn new(f: impl Fn() -> Result<T> + 'static) -> Self {
        Self { eval: Rc::new(f) }
    }

    /// A binding that always yields `value`. Handy for previews and tests.
    pub fn constant(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move || Ok(value.clone()))
    }

    /// Evaluate the binding.
    pub fn get(&self) -> Result<T> {
        (self.eval)()
    }

    /// Chain a further transform.
    pub fn then<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Binding<U> {
        Binding {
            eval: Rc::new(move || (self.eval)().map(&f)),
        }
    }
}

/// Bind directly to a source (identity transform).
pub fn bind_source<T, S>(source: S) -> Binding<T>
where
    T: Clone + 'static,
    S: Source<T> + 'static,
{
    Binding::new(move || source.read())
}

/// Bind to `source` through `map`.
pub fn bind_mapped<S, V, T>(source: S, map: impl Fn(&V) -> T + 'static) -> Binding<T>
where
    S: Source<V> + 'static,
    T: 'static,
{
    Binding::new(move || source.with_value(|v| map(v)))
}

/// Bind to two sources combined by `map`.
pub fn bind_mapped2<S1, S2, V1, V2, T>(
    s1: S1,
    s2: S2,
    map: impl Fn(&V1, &V2) -> T + 'static,
) -> Binding<T>
where
    S1: Source<V1> + 'static,
    S2: Source<V2> + 'static,
    T: 'static,
{
    Binding::new(move || s1.with_value(|v1| s2.with_value(|v2| map(v1, v2)))?)
}

// ---------------------------------------------------------------------------
// Two-way sync
// ---------------------------------------------------------------------------

/// Bidirectional sync between two writable sources of the same type.
///
/// Drop it to disconnect both directions.
pub struct TwoWayBinding<T> {
    _a_to_b: Subscription,
    _b_to_a: Subscription,
    _value: std::marker::PhantomData<T>,
}

fn forward<T, D>(target: Rc<D>, syncing: Rc<Cell<bool>>) -> impl Fn(&T) + 'static
where
    T: Clone + 'static,
    D: Sink<T> + 'static,
{
    move |value: &T| {
        if syncing.get() {
            return;
        }
        syncing.set(true);
        if let Err(err) = target.write(value.clone()) {
            tracing::debug!(message = "binding.two_way.drop", error = %err);
        }
        syncing.set(false);
    }
}

impl<T: Clone + 'static> TwoWayBinding<T> {
    /// Connect `a` and `b`. `b` first takes `a`'s current value.
    pub fn new<A, B>(a: A, b: B) -> Result<Self>
    where
        A: Source<T> + Sink<T> + 'static,
        B: Source<T> + Sink<T> + 'static,
    {
        b.write(a.read()?)?;

        let (a, b) = (Rc::new(a), Rc::new(b));
        let syncing = Rc::new(Cell::new(false));
        let sub_ab = a.watch(forward(Rc::clone(&b), Rc::clone(&syncing)))?;
        let sub_ba = b.watch(forward(Rc::clone(&a), syncing))?;

        Ok(Self {
            _a_to_b: sub_ab,
            _b_to_a: sub_ba,
            _value: std::marker::PhantomData,
        })
    }
}

impl<T> std::fmt::Debug for TwoWayBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoWayBinding").finish()
    }
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Create a direct [`Binding`] to a source.
#[macro_export]
macro_rules! bind {
    ($src:expr) => {
        $crate::reactive::binding::bind_source($src)
    };
}

/// Create a mapped [`Binding`] from a source and a transform.
#[macro_export]
macro_rules! bind_map {
    ($src:expr, $f:expr) => {
        $crate::reactive::binding::bind_mapped($src, $f)
    };
}

/// Create a mapped [`Binding`] from two sources.
#[macro_export]
macro_rules! bind_map2 {
    ($s1:expr, $s2:expr, $f:expr) => {
        $crate::reactive::binding::bind_mapped2($s1, $s2, $f)
    };
}

// ---------------------------------------------------------------------------
// Subscription lifetimes
// ---------------------------------------------------------------------------

/// Holds the subscriptions belonging to one logical consumer (usually a view).
///
/// Dropping the scope releases everything it holds, so no callback registered
/// through it fires afterwards.
pub struct BindingScope {
    held: Vec<Subscription>,
}

impl BindingScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
        }
    }

    /// Keep an externally created subscription alive with this scope.
    pub fn hold(&mut self, sub: Subscription) {
        self.held.push(sub);
    }

    /// Subscribe to `source` for the lifetime of this scope.
    pub fn subscribe<T, S>(
        &mut self,
        source: &S,
        callback: impl Fn(&T) + 'static,
    ) -> Result<&mut Self>
    where
        S: Source<T>,
    {
        let sub = source.watch(callback)?;
        self.held.push(sub);
        Ok(self)
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.held.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Release all subscriptions now; the scope stays usable.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("held", &self.held.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
