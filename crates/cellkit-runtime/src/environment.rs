#![forbid(unsafe_code)]

//! Explicit context for values shared across a view hierarchy.
//!
//! An [`Environment`] maps a type to one shared [`Observable`] of that type.
//! Parents create it, insert the objects their subtree needs, and pass it by
//! reference to child constructors. There is no global lookup: a view only
//! sees what it was handed.
//!
//! [`Environment::child`] creates a scoped layer. Values inserted into the
//! child shadow the parent's for that subtree only; lookups fall through to
//! the parent otherwise.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{CellError, Result};
use crate::reactive::Observable;

#[derive(Default)]
struct Layer {
    values: HashMap<TypeId, Box<dyn Any>>,
}

/// Type-keyed store of shared observables with parent fallback.
///
/// Cloning an `Environment` yields another handle to the same layer.
#[derive(Clone, Default)]
pub struct Environment {
    layer: Rc<RefCell<Layer>>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child layer that falls back to `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            layer: Rc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Insert `value` in this layer and return its shared handle.
    ///
    /// Replaces any value of the same type already in this layer; parent
    /// layers are untouched.
    pub fn insert<T: Clone + PartialEq + 'static>(&self, value: T) -> Observable<T> {
        let observable = Observable::new(value);
        self.provide(observable.clone());
        observable
    }

    /// Insert an existing shared handle in this layer.
    pub fn provide<T: Clone + PartialEq + 'static>(&self, observable: Observable<T>) {
        let replaced = self
            .layer
            .borrow_mut()
            .values
            .insert(TypeId::of::<T>(), Box::new(observable))
            .is_some();
        tracing::debug!(
            message = "environment.provide",
            type_name = type_name::<T>(),
            replaced
        );
    }

    /// Look up the nearest value of type `T`.
    #[must_use]
    pub fn get<T: Clone + PartialEq + 'static>(&self) -> Option<Observable<T>> {
        let local = self
            .layer
            .borrow()
            .values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Observable<T>>())
            .cloned();
        local.or_else(|| self.parent.as_ref().and_then(|p| p.get::<T>()))
    }

    /// Like [`get`](Self::get), but a missing value is an error.
    pub fn require<T: Clone + PartialEq + 'static>(&self) -> Result<Observable<T>> {
        self.get::<T>().ok_or(CellError::MissingEnvironment {
            type_name: type_name::<T>(),
        })
    }

    /// Whether any layer holds a value of type `T`.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.layer.borrow().values.contains_key(&TypeId::of::<T>())
            || self.parent.as_ref().is_some_and(|p| p.contains::<T>())
    }

    /// Remove `T` from this layer only. Returns the removed handle.
    pub fn remove<T: Clone + PartialEq + 'static>(&self) -> Option<Observable<T>> {
        self.layer
            .borrow_mut()
            .values
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<Observable<T>>().ok())
            .map(|boxed| *boxed)
    }

    /// Number of values in this layer (excluding parents).
    #[must_use]
    pub fn len(&self) -> usize {
        self.layer.borrow().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layer.borrow().values.is_empty()
    }

    /// Nesting depth: 0 for a root environment.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.depth() + 1)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("values", &self.len())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Settings {
        score: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Theme(&'static str);

    #[test]
    fn insert_and_share() {
        let env = Environment::new();
        let settings = env.insert(Settings { score: 0 });

        let seen_by_child_view = env.require::<Settings>().unwrap();
        settings.update(|s| s.score += 1);
        assert_eq!(seen_by_child_view.get().score, 1);
        assert!(seen_by_child_view.ptr_eq(&settings));
    }

    #[test]
    fn missing_value_is_an_error() {
        let env = Environment::new();
        let err = env.require::<Settings>().unwrap_err();
        assert!(matches!(
            err,
            CellError::MissingEnvironment { type_name } if type_name.ends_with("Settings")
        ));
        assert!(env.get::<Settings>().is_none());
    }

    #[test]
    fn child_falls_back_and_shadows() {
        let root = Environment::new();
        root.insert(Theme("light"));
        root.insert(Settings { score: 3 });

        let sheet = root.child();
        sheet.insert(Theme("dark"));

        assert_eq!(sheet.require::<Theme>().unwrap().get(), Theme("dark"));
        assert_eq!(root.require::<Theme>().unwrap().get(), Theme("light"));
        assert_eq!(sheet.require::<Settings>().unwrap().get().score, 3);
        assert_eq!(sheet.depth(), 1);
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn remove_only_touches_own_layer() {
        let root = Environment::new();
        root.insert(Theme("light"));
        let child = root.child();
        child.insert(Theme("dark"));

        assert_eq!(child.remove::<Theme>().map(|t| t.get()), Some(Theme("dark")));
        assert_eq!(child.require::<Theme>().unwrap().get(), Theme("light"));
        assert!(child.remove::<Theme>().is_none());
        assert!(child.contains::<Theme>());
    }

    #[test]
    fn clones_share_layer() {
        let env = Environment::new();
        let handle = env.clone();
        handle.insert(7u8);
        assert_eq!(env.require::<u8>().unwrap().get(), 7);
        assert!(!env.is_empty());
    }
}
