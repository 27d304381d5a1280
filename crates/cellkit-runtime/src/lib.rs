#![forbid(unsafe_code)]

//! Single-threaded reactive state for view hierarchies.
//!
//! The core is [`State`](reactive::State), an owned cell, and
//! [`Link`](reactive::Link), a non-owning two-way handle to it. Writes through
//! either notify observers; a [`Runtime`](runtime::Runtime) turns those
//! notifications into batched, once-per-turn view re-renders.
//!
//! Shared objects travel through an explicit
//! [`Environment`](environment::Environment) instead of ambient lookup.

pub mod config;
pub mod environment;
pub mod error;
pub mod reactive;
pub mod runtime;

pub use config::RuntimeConfig;
pub use environment::Environment;
pub use error::{CellError, CellId, ConfigError, Result};
pub use runtime::{FlushReport, Rendered, Runtime, Tracker, View, ViewId};
