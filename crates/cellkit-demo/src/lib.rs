#![forbid(unsafe_code)]

//! Headless scenario runner for cellkit.
//!
//! Each scenario mounts a few views into a [`Runtime`](cellkit::runtime::Runtime),
//! drives user-like interactions as turns, and records what re-rendered.

pub mod cli;
pub mod error;
pub mod scenarios;

pub use cli::{Cli, run, run_from_env};
pub use error::{DemoError, Result};
