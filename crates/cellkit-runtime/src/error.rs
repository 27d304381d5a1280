#![forbid(unsafe_code)]

//! Error types for the reactive runtime.
//!
//! The cell/link mechanism has exactly one failure: touching a cell after its
//! owner destroyed it. Everything else here belongs to the ambient layers
//! (environment lookup, configuration loading).

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CellError>;

/// Global counter for unique cell IDs.
static CELL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a reactive cell.
///
/// Every [`State`](crate::reactive::State) gets a fresh id at construction;
/// all links created from it report the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    pub(crate) fn next() -> Self {
        Self(CELL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// A link (or something built on one) was used after its cell was destroyed.
    #[error("dangling reference: {cell} was destroyed")]
    DanglingReference { cell: CellId },

    /// An [`Environment`](crate::environment::Environment) had no value of the
    /// requested type anywhere in its chain.
    #[error("no environment value of type {type_name}")]
    MissingEnvironment { type_name: &'static str },
}

impl CellError {
    #[must_use]
    pub fn dangling(cell: CellId) -> Self {
        Self::DanglingReference { cell }
    }

    /// Whether this error reports a destroyed cell.
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        matches!(self, Self::DanglingReference { .. })
    }
}

/// Failure while building a [`RuntimeConfig`](crate::config::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {message}")]
    Parse { message: String },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
