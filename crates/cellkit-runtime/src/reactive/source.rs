#![forbid(unsafe_code)]

//! Read and write seams shared by every reactive handle.
//!
//! Derived values, bindings and views are written against [`Source`] and
//! [`Sink`] rather than a concrete handle, so they accept an
//! [`Observable`], an owned [`State`], a [`Link`] or a [`Projection`].
//!
//! Both traits are fallible because a link may outlive its cell.

use crate::error::Result;

use super::observable::{Observable, Subscription};
use super::state::{Link, Projection, State};

/// Something that can be read and watched.
pub trait Source<T> {
    /// Borrow the current value for the duration of `f`.
    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R>;

    /// Register `callback` to run on every change.
    fn watch(&self, callback: impl Fn(&T) + 'static) -> Result<Subscription>;

    /// Clone out the current value.
    fn read(&self) -> Result<T>
    where
        T: Clone,
    {
        self.with_value(T::clone)
    }
}

/// Something that can be written.
pub trait Sink<T> {
    fn write(&self, value: T) -> Result<()>;
}

impl<T: Clone + PartialEq + 'static> Source<T> for Observable<T> {
    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        Ok(self.with(f))
    }

    fn watch(&self, callback: impl Fn(&T) + 'static) -> Result<Subscription> {
        Ok(self.subscribe(callback))
    }
}

impl<T: Clone + PartialEq + 'static> Sink<T> for Observable<T> {
    fn write(&self, value: T) -> Result<()> {
        self.set(value);
        Ok(())
    }
}

impl<T: Clone + PartialEq + 'static> Source<T> for State<T> {
    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        Ok(self.with(f))
    }

    fn watch(&self, callback: impl Fn(&T) + 'static) -> Result<Subscription> {
        Ok(self.subscribe(callback))
    }
}

impl<T: Clone + PartialEq + 'static> Sink<T> for State<T> {
    fn write(&self, value: T) -> Result<()> {
        self.set(value);
        Ok(())
    }
}

impl<T: Clone + PartialEq + 'static> Source<T> for Link<T> {
    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        self.with(f)
    }

    fn watch(&self, callback: impl Fn(&T) + 'static) -> Result<Subscription> {
        self.subscribe(callback)
    }
}

impl<T: Clone + PartialEq + 'static> Sink<T> for Link<T> {
    fn write(&self, value: T) -> Result<()> {
        self.set(value).map(|_| ())
    }
}

impl<U: 'static> Source<U> for Projection<U> {
    fn with_value<R>(&self, f: impl FnOnce(&U) -> R) -> Result<R> {
        let value = self.get()?;
        Ok(f(&value))
    }

    fn watch(&self, callback: impl Fn(&U) + 'static) -> Result<Subscription> {
        self.subscribe(callback)
    }
}

impl<U: 'static> Sink<U> for Projection<U> {
    fn write(&self, value: U) -> Result<()> {
        self.set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_twice<S: Source<i32>>(source: &S) -> Result<i32> {
        Ok(source.read()? + source.read()?)
    }

    #[test]
    fn generic_reads_across_handle_kinds() {
        let obs = Observable::new(2);
        let state = State::new(3);
        let link = state.link();
        let halves = state.link().project(|v| v / 2, |v, h| *v = h * 2);

        assert_eq!(read_twice(&obs), Ok(4));
        assert_eq!(read_twice(&state), Ok(6));
        assert_eq!(read_twice(&link), Ok(6));
        assert_eq!(read_twice(&halves), Ok(2));
    }

    #[test]
    fn generic_write_reaches_owner() {
        fn store<S: Sink<i32>>(sink: &S, v: i32) -> Result<()> {
            sink.write(v)
        }

        let state = State::new(0);
        let link = state.link();
        store(&link, 8).unwrap();
        assert_eq!(state.get(), 8);
        store(&state, 9).unwrap();
        assert_eq!(link.get(), Ok(9));
    }

    #[test]
    fn dangling_source_reports_error() {
        let state = State::new(1);
        let link = state.link();
        let id = state.id();
        state.destroy();

        let err = read_twice(&link).unwrap_err();
        assert_eq!(err, crate::error::CellError::dangling(id));
    }
}
