#![forbid(unsafe_code)]

//! Lazy derived values that track their [`Source`]s.
//!
//! # Design
//!
//! [`Computed<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. A change to any source marks the cache dirty;
//! the next [`get()`](Computed::get) recomputes. This is the pull half of
//! re-rendering: writes only flip a flag, work happens on read.
//!
//! # Invariants
//!
//! 1. `get()` never returns a value older than the latest completed write to
//!    any source.
//! 2. The compute function runs at most once per dirty cycle.
//! 3. `version()` increments by 1 per successful recomputation.
//!
//! # Failure Modes
//!
//! - **Source cell destroyed**: the compute function returns
//!   [`CellError::DanglingReference`](crate::error::CellError); `get()`
//!   surfaces it, the last good value stays cached and the dirty flag stays
//!   set.
//! - **Compute function panics**: same as above, minus the error value.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Result;

use super::observable::Subscription;
use super::source::Source;

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> Result<T>>,
    cached: Option<T>,
    dirty: Rc<Cell<bool>>,
    version: u64,
    _subscriptions: Vec<Subscription>,
}

/// A lazily evaluated, memoized value derived from one or more sources.
///
/// Cloning a `Computed` creates a new handle to the **same** cache.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &inner.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

fn mark_dirty<V: 'static>(dirty: &Rc<Cell<bool>>) -> impl Fn(&V) + 'static {
    let dirty = Rc::clone(dirty);
    move |_: &V| dirty.set(true)
}

impl<T: Clone + 'static> Computed<T> {
    /// Derive a value from a single source.
    ///
    /// Takes ownership of `source`. Fails only if it is already dangling.
    pub fn from_source<S, V>(source: S, map: impl Fn(&V) -> T + 'static) -> Result<Self>
    where
        S: Source<V> + 'static,
        V: 'static,
    {
        let dirty = Rc::new(Cell::new(true));
        let sub = source.watch(mark_dirty(&dirty))?;
        let compute = move || source.with_value(|v| map(v));
        Ok(Self::build(Box::new(compute), dirty, vec![sub]))
    }

    /// Derive a value from two sources.
    pub fn from2<S1, S2, V1, V2>(
        s1: S1,
        s2: S2,
        map: impl Fn(&V1, &V2) -> T + 'static,
    ) -> Result<Self>
    where
        S1: Source<V1> + 'static,
        S2: Source<V2> + 'static,
        V1: 'static,
        V2: 'static,
    {
        let dirty = Rc::new(Cell::new(true));
        let subs = vec![s1.watch(mark_dirty(&dirty))?, s2.watch(mark_dirty(&dirty))?];
        let compute = move || s1.with_value(|v1| s2.with_value(|v2| map(v1, v2)))?;
        Ok(Self::build(Box::new(compute), dirty, subs))
    }

    /// Low-level constructor: the caller supplies the compute function and
    /// whatever subscriptions should invalidate it via [`invalidate`](Self::invalidate).
    pub fn from_fn(
        compute: impl Fn() -> Result<T> + 'static,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        Self::build(Box::new(compute), Rc::new(Cell::new(true)), subscriptions)
    }

    fn build(
        compute: Box<dyn Fn() -> Result<T>>,
        dirty: Rc<Cell<bool>>,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute,
                cached: None,
                dirty,
                version: 0,
                _subscriptions: subscriptions,
            })),
        }
    }

    /// Current value, recomputed first if any source changed.
    pub fn get(&self) -> Result<T> {
        self.with(T::clone)
    }

    /// Borrow the current value, recomputing first if needed.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls back into this same `Computed`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let stale = inner.dirty.get();
        let value = match &mut inner.cached {
            Some(value) if !stale => value,
            slot => {
                let fresh = (inner.compute)()?;
                inner.dirty.set(false);
                inner.version += 1;
                slot.insert(fresh)
            }
        };
        Ok(f(value))
    }

    /// Whether the cached value is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty.get()
    }

    /// Force the next `get()` to recompute.
    pub fn invalidate(&self) {
        self.inner.borrow().dirty.set(true);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CellError;
    use crate::reactive::{Observable, State};

    #[test]
    fn single_source_from_link() {
        let count = State::new(10);
        let doubled = Computed::from_source(count.link(), |v: &i32| v * 2).unwrap();

        assert_eq!(doubled.get(), Ok(20));
        assert_eq!(doubled.version(), 1);

        count.set(5);
        assert!(doubled.is_dirty());
        assert_eq!(doubled.get(), Ok(10));
        assert_eq!(doubled.version(), 2);
    }

    #[test]
    fn two_sources() {
        let width = Observable::new(10);
        let height = State::new(20);
        let area = Computed::from2(width.clone(), height.link(), |w: &i32, h: &i32| w * h).unwrap();

        assert_eq!(area.get(), Ok(200));
        width.set(5);
        assert_eq!(area.get(), Ok(100));
        height.set(30);
        assert_eq!(area.get(), Ok(150));
    }

    #[test]
    fn memoized_between_changes() {
        let runs = Rc::new(Cell::new(0u32));
        let r = Rc::clone(&runs);
        let source = Observable::new(3);
        let squared = Computed::from_source(source.clone(), move |v: &i32| {
            r.set(r.get() + 1);
            v * v
        })
        .unwrap();

        assert_eq!(runs.get(), 0, "nothing computed before first read");
        assert_eq!(squared.get(), Ok(9));
        assert_eq!(squared.get(), Ok(9));
        assert_eq!(runs.get(), 1);

        source.set(4);
        source.set(5);
        assert_eq!(runs.get(), 1, "writes only mark dirty");
        assert_eq!(squared.get(), Ok(25));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn dangling_source_surfaces_error_and_keeps_cache() {
        let state = State::new(1);
        let id = state.id();
        let plus_one = Computed::from_source(state.link(), |v: &i32| v + 1).unwrap();
        assert_eq!(plus_one.get(), Ok(2));

        plus_one.invalidate();
        state.destroy();
        assert_eq!(plus_one.get(), Err(CellError::dangling(id)));
        assert!(plus_one.is_dirty());
        assert_eq!(plus_one.version(), 1);
    }

    #[test]
    fn with_recomputes_stale_value_before_borrowing() {
        let words = Observable::new(String::from("ab"));
        let upper = Computed::from_source(words.clone(), |w: &String| w.to_uppercase()).unwrap();

        assert_eq!(upper.with(String::len), Ok(2));
        words.set(String::from("abcd"));
        assert_eq!(upper.with(|u| u.clone()), Ok(String::from("ABCD")));
        assert_eq!(upper.version(), 2);
        assert!(!upper.is_dirty());
    }

    #[test]
    fn construction_from_dead_link_fails() {
        let state = State::new(0);
        let link = state.link();
        drop(state);
        assert!(Computed::from_source(link, |v: &i32| *v).is_err());
    }

    #[test]
    fn from_fn_with_manual_invalidation() {
        let source = Observable::new(2);
        let src = source.clone();
        let computed = Computed::from_fn(move || Ok(src.get() + 1), vec![]);

        assert_eq!(computed.get(), Ok(3));
        source.set(9);
        assert_eq!(computed.get(), Ok(3), "no subscription, so still cached");
        computed.invalidate();
        assert_eq!(computed.get(), Ok(10));
    }

    #[test]
    fn clone_shares_cache() {
        let source = Observable::new(1);
        let a = Computed::from_source(source, |v: &i32| v * 10).unwrap();
        let b = a.clone();
        assert_eq!(a.get(), Ok(10));
        assert!(!b.is_dirty());
        assert_eq!(b.version(), 1);
    }
}
