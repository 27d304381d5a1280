#![forbid(unsafe_code)]

//! cellkit public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use cellkit_runtime as runtime;
pub use cellkit_runtime::{bind, bind_map, bind_map2};

pub mod prelude {
    pub use cellkit_runtime::reactive::{
        BatchScope, Binding, BindingScope, Computed, Link, Observable, Projection, Sink, Source,
        State, Subscription, TwoWayBinding, batch,
    };
    pub use cellkit_runtime::{
        CellError, CellId, Environment, FlushReport, Result, Runtime, RuntimeConfig, Tracker,
        View, ViewId,
    };
}
