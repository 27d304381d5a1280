#![forbid(unsafe_code)]

//! Owned reactive cells and the links that borrow them.
//!
//! A [`State<T>`] is the single owner of a value. Consumers that must read and
//! write the value without owning it receive a [`Link<T>`], created only by
//! the owner through [`State::link`].
//!
//! ```
//! use cellkit_runtime::reactive::State;
//!
//! # fn main() -> cellkit_runtime::Result<()> {
//! let label = State::new(String::from("click me"));
//! let button = label.link();
//!
//! button.set("clicked".to_string())?;
//! assert_eq!(label.get(), "clicked");
//!
//! label.destroy();
//! assert!(button.get().unwrap_err().is_dangling());
//! # Ok(())
//! # }
//! ```
//!
//! # Lifecycle
//!
//! `Live -> Destroyed`, once, when the owner is dropped or
//! [`destroy`](State::destroy)ed. The transition flips a flag shared with every
//! link before the value is released, so every link fails from that instant
//! on. Using the owner after destruction does not compile: `destroy` takes the
//! owner by value.
//!
//! # Invariants
//!
//! 1. Every `Link::get` after a completed write observes that write.
//! 2. Writes through a link are indistinguishable from writes through the
//!    owner (same version bump, same notifications).
//! 3. Links never keep the value alive.
//! 4. After destruction every link operation returns
//!    [`CellError::DanglingReference`], deterministically.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{CellError, CellId, Result};

use super::observable::{Observable, Subscription, WeakObservable};

/// Lifecycle of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Live,
    Destroyed,
}

/// An owned, observable value. See the [module docs](self).
///
/// `State` is deliberately not `Clone`: there is exactly one owner. Hand out
/// [`Link`]s to share access.
pub struct State<T> {
    id: CellId,
    cell: Observable<T>,
    lifecycle: Rc<Cell<Lifecycle>>,
}

impl<T: Clone + PartialEq + 'static> State<T> {
    /// Create a live cell holding `initial`.
    pub fn new(initial: T) -> Self {
        let id = CellId::next();
        tracing::trace!(message = "state.create", cell = %id);
        Self {
            id,
            cell: Observable::new(initial),
            lifecycle: Rc::new(Cell::new(Lifecycle::Live)),
        }
    }

    /// Identity shared by this cell and all its links.
    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Store `value`, notifying observers if it changed.
    pub fn set(&self, value: T) -> bool {
        let changed = self.cell.set(value);
        if changed {
            tracing::trace!(message = "state.set", cell = %self.id, version = self.cell.version());
        }
        changed
    }

    /// Mutate the value through a closure.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        self.cell.update(f)
    }

    /// Store `value` and return the previous one.
    pub fn replace(&self, value: T) -> T {
        self.cell.replace(value)
    }

    /// Generation marker. Bumps once per effective write from any handle.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Observe changes made through the owner or any link.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(callback)
    }

    /// Create a new non-owning handle to this cell.
    #[must_use]
    pub fn link(&self) -> Link<T> {
        Link {
            id: self.id,
            cell: self.cell.downgrade(),
            lifecycle: Rc::clone(&self.lifecycle),
        }
    }

    /// Number of links handed out by [`link`](Self::link) that are still alive.
    #[must_use]
    pub fn link_count(&self) -> usize {
        Rc::strong_count(&self.lifecycle) - 1
    }

    /// Destroy the cell, invalidating every outstanding link.
    ///
    /// The owner is consumed, so it cannot be read afterwards:
    ///
    /// ```compile_fail
    /// use cellkit_runtime::reactive::State;
    ///
    /// let count = State::new(0);
    /// count.destroy();
    /// count.get();
    /// ```
    pub fn destroy(self) {
        drop(self);
    }
}

impl<T> Drop for State<T> {
    fn drop(&mut self) {
        self.lifecycle.set(Lifecycle::Destroyed);
        tracing::debug!(
            message = "state.destroy",
            cell = %self.id,
            links = Rc::strong_count(&self.lifecycle) - 1
        );
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("cell", &self.cell)
            .finish()
    }
}

/// A non-owning, two-way handle to a [`State`].
///
/// Only the owner creates links. A holder can hand its link on, or consume it
/// into a [`Projection`], but never duplicate it:
///
/// ```compile_fail
/// use cellkit_runtime::reactive::{Link, State};
///
/// let owner = State::new(0);
/// let given = owner.link();
/// let minted: Link<i32> = given.clone();
/// ```
pub struct Link<T> {
    id: CellId,
    cell: WeakObservable<T>,
    lifecycle: Rc<Cell<Lifecycle>>,
}

impl<T> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("cell", &self.id)
            .field("lifecycle", &self.lifecycle.get())
            .finish()
    }
}

impl<T> Link<T> {
    /// Identity of the referenced cell.
    #[must_use]
    pub fn cell_id(&self) -> CellId {
        self.id
    }

    /// Whether the referenced cell is still live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Live && !self.cell.is_dropped()
    }

    fn resolve(&self) -> Result<Observable<T>> {
        if self.lifecycle.get() == Lifecycle::Destroyed {
            return Err(CellError::dangling(self.id));
        }
        self.cell.upgrade().ok_or(CellError::dangling(self.id))
    }
}

impl<T: Clone + PartialEq + 'static> Link<T> {
    /// Clone out the current value of the cell.
    pub fn get(&self) -> Result<T> {
        Ok(self.resolve()?.get())
    }

    /// Borrow the cell's value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        Ok(self.resolve()?.with(f))
    }

    /// Write through to the cell. Returns whether the value changed.
    pub fn set(&self, value: T) -> Result<bool> {
        let changed = self.resolve()?.set(value);
        if changed {
            tracing::trace!(message = "link.set", cell = %self.id);
        }
        Ok(changed)
    }

    /// Mutate the cell's value through a closure.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<bool> {
        Ok(self.resolve()?.update(f))
    }

    /// The cell's current generation marker.
    pub fn version(&self) -> Result<u64> {
        Ok(self.resolve()?.version())
    }

    /// Observe changes to the cell.
    ///
    /// The subscription does not keep the cell alive; once the owner is
    /// destroyed the callback never runs again.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Result<Subscription> {
        Ok(self.resolve()?.subscribe(callback))
    }

    /// Derive a two-way handle that views the cell through `get` and writes
    /// back through `set`.
    ///
    /// Reads apply `get` to the current value; writes call `set` on a copy of
    /// the current value and store the result. The link is consumed; the
    /// projection is its new holder.
    pub fn project<U: 'static>(
        self,
        get: impl Fn(&T) -> U + 'static,
        set: impl Fn(&mut T, U) + 'static,
    ) -> Projection<U> {
        let cell = self.id;
        let link = Rc::new(self);
        let get = Rc::new(get);

        let read_link = Rc::clone(&link);
        let read_get = Rc::clone(&get);
        let read = Box::new(move || read_link.with(|v| read_get(v)));

        let write_link = Rc::clone(&link);
        let write = Box::new(move |u: U| write_link.update(|v| set(v, u)).map(|_| ()));

        let watch = Box::new(move |callback: Box<dyn Fn(&U)>| {
            let get = Rc::clone(&get);
            link.subscribe(move |v| callback(&get(v)))
        });

        Projection {
            cell,
            read,
            write,
            watch,
        }
    }
}

type ProjectRead<U> = dyn Fn() -> Result<U>;
type ProjectWrite<U> = dyn Fn(U) -> Result<()>;
type ProjectWatch<U> = dyn Fn(Box<dyn Fn(&U)>) -> Result<Subscription>;

/// A mapped two-way view of a cell, created by [`Link::project`].
///
/// Shares the link's failure mode: once the cell is destroyed every operation
/// returns [`CellError::DanglingReference`].
pub struct Projection<U> {
    cell: CellId,
    read: Box<ProjectRead<U>>,
    write: Box<ProjectWrite<U>>,
    watch: Box<ProjectWatch<U>>,
}

impl<U> std::fmt::Debug for Projection<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

impl<U: 'static> Projection<U> {
    /// Identity of the underlying cell.
    #[must_use]
    pub fn cell_id(&self) -> CellId {
        self.cell
    }

    pub fn get(&self) -> Result<U> {
        (self.read)()
    }

    pub fn set(&self, value: U) -> Result<()> {
        (self.write)(value)
    }

    /// Observe the projected value. Fires whenever the underlying cell changes.
    pub fn subscribe(&self, callback: impl Fn(&U) + 'static) -> Result<Subscription> {
        (self.watch)(Box::new(callback))
    }
}
