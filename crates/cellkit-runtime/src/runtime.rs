#![forbid(unsafe_code)]

//! Turn-based re-render scheduling for views.
//!
//! A [`View`] derives a textual body from the reactive values it declares in
//! [`View::track`]. The [`Runtime`] mounts views, subscribes each to its
//! dependencies, and re-renders only views whose dependencies changed.
//!
//! # Turns
//!
//! [`Runtime::turn`] runs a closure inside a [`BatchScope`], so every write in
//! the closure lands before any view is marked dirty, then flushes. Each dirty
//! view renders once per pass and sees only final values.
//!
//! Writes made outside a turn mark views dirty immediately; call
//! [`Runtime::flush`] to render them.
//!
//! # Invariants
//!
//! 1. A view renders at most once per flush pass.
//! 2. Views render in mount order within a pass.
//! 3. A render that writes state schedules another pass; passes are capped by
//!    [`RuntimeConfig::max_flush_passes`].
//! 4. Unmounting a view drops its subscriptions; it is never rendered again.
//!
//! # Failure Modes
//!
//! - A render returning an error (typically a dangling link) keeps the
//!   previous body, records the error on the view and is logged at `warn`.
//! - Hitting the pass cap leaves the remaining views dirty and logs at `warn`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::config::RuntimeConfig;
use crate::error::{CellError, Result};
use crate::reactive::{BatchScope, BindingScope, Source};

/// Identifier of a mounted view. Unique within one [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Something that re-derives output from reactive state.
pub trait View {
    /// Human-readable name used in logs and reports.
    fn name(&self) -> &str;

    /// Declare the values this view reads.
    fn track(&self, deps: &mut Tracker<'_>) -> Result<()>;

    /// Derive the current body. Must be deterministic in the tracked values.
    fn body(&self) -> Result<String>;
}

type DirtySet = Rc<RefCell<BTreeSet<ViewId>>>;

/// Registers a view's dependencies during [`Runtime::mount`].
pub struct Tracker<'a> {
    view: ViewId,
    dirty: &'a DirtySet,
    scope: &'a mut BindingScope,
}

impl Tracker<'_> {
    /// Re-render the view whenever `source` changes.
    pub fn watch<T, S>(&mut self, source: &S) -> Result<&mut Self>
    where
        S: Source<T>,
        T: 'static,
    {
        let dirty = Rc::clone(self.dirty);
        let view = self.view;
        self.scope.subscribe(source, move |_: &T| {
            dirty.borrow_mut().insert(view);
        })?;
        Ok(self)
    }

    /// Number of dependencies registered so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.scope.binding_count()
    }
}

struct Mounted {
    view: Box<dyn View>,
    body: Option<String>,
    renders: u64,
    last_error: Option<CellError>,
    _scope: BindingScope,
}

/// One body produced during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub view: ViewId,
    pub name: String,
    pub body: String,
}

/// Outcome of a [`Runtime::flush`] or [`Runtime::turn`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Render passes executed.
    pub passes: usize,
    /// Successful renders, in render order.
    pub rendered: Vec<Rendered>,
    /// Renders that failed, in render order.
    pub failed: Vec<(ViewId, CellError)>,
    /// Whether the pass cap stopped the flush with views still dirty.
    pub truncated: bool,
}

impl FlushReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.failed.is_empty()
    }

    /// Bodies rendered for `view` during this flush.
    pub fn bodies_for(&self, view: ViewId) -> impl Iterator<Item = &str> {
        self.rendered
            .iter()
            .filter(move |r| r.view == view)
            .map(|r| r.body.as_str())
    }
}

/// Owns mounted views and schedules their re-renders.
pub struct Runtime {
    config: RuntimeConfig,
    views: BTreeMap<ViewId, Mounted>,
    dirty: DirtySet,
    next_id: u64,
}

impl Runtime {
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            views: BTreeMap::new(),
            dirty: Rc::default(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Mount `view`, subscribe it to its dependencies and render it once.
    ///
    /// Fails if the view tracks a dangling link; nothing is mounted then.
    pub fn mount(&mut self, view: impl View + 'static) -> Result<ViewId> {
        let id = ViewId(self.next_id);
        self.next_id += 1;

        let mut scope = BindingScope::new();
        {
            let mut tracker = Tracker {
                view: id,
                dirty: &self.dirty,
                scope: &mut scope,
            };
            view.track(&mut tracker)?;
        }
        tracing::debug!(
            message = "runtime.mount",
            view = %id,
            name = view.name(),
            deps = scope.binding_count()
        );

        let mut mounted = Mounted {
            view: Box::new(view),
            body: None,
            renders: 0,
            last_error: None,
            _scope: scope,
        };
        if let Err((_, err)) = render_one(id, &mut mounted) {
            self.dirty.borrow_mut().remove(&id);
            return Err(err);
        }
        self.views.insert(id, mounted);
        Ok(id)
    }

    /// Drop a view and its subscriptions. Returns `false` if unknown.
    pub fn unmount(&mut self, id: ViewId) -> bool {
        self.dirty.borrow_mut().remove(&id);
        let removed = self.views.remove(&id).is_some();
        if removed {
            tracing::debug!(message = "runtime.unmount", view = %id);
        }
        removed
    }

    /// Run `f` as one turn: writes are batched, then dirty views re-render.
    pub fn turn<R>(&mut self, f: impl FnOnce() -> R) -> (R, FlushReport) {
        let result = {
            let _batch = BatchScope::new();
            f()
        };
        (result, self.flush())
    }

    /// Re-render every dirty view, repeating while renders dirty more views.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        while !self.dirty.borrow().is_empty() {
            if report.passes == self.config.max_flush_passes {
                report.truncated = true;
                tracing::warn!(
                    message = "runtime.flush.truncated",
                    passes = report.passes,
                    pending = self.dirty.borrow().len()
                );
                break;
            }
            report.passes += 1;

            let batch: BTreeSet<ViewId> = std::mem::take(&mut *self.dirty.borrow_mut());
            for id in batch {
                let Some(mounted) = self.views.get_mut(&id) else {
                    continue;
                };
                match render_one(id, mounted) {
                    Ok(body) => report.rendered.push(Rendered {
                        view: id,
                        name: mounted.view.name().to_string(),
                        body,
                    }),
                    Err(failure) => report.failed.push(failure),
                }
            }
        }
        if report.passes > 0 {
            tracing::debug!(
                message = "runtime.flush",
                passes = report.passes,
                rendered = report.rendered.len(),
                failed = report.failed.len()
            );
        }
        report
    }

    /// Whether `id` is waiting for a re-render.
    #[must_use]
    pub fn is_dirty(&self, id: ViewId) -> bool {
        self.dirty.borrow().contains(&id)
    }

    /// Number of views waiting for a re-render.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.borrow().len()
    }

    /// Latest successfully rendered body.
    #[must_use]
    pub fn body(&self, id: ViewId) -> Option<&str> {
        self.views.get(&id).and_then(|m| m.body.as_deref())
    }

    /// Name reported by the mounted view.
    #[must_use]
    pub fn name(&self, id: ViewId) -> Option<&str> {
        self.views.get(&id).map(|m| m.view.name())
    }

    /// Number of successful renders, including the initial one.
    #[must_use]
    pub fn render_count(&self, id: ViewId) -> Option<u64> {
        self.views.get(&id).map(|m| m.renders)
    }

    /// Error from the most recent failed render, cleared by the next success.
    #[must_use]
    pub fn last_error(&self, id: ViewId) -> Option<&CellError> {
        self.views.get(&id).and_then(|m| m.last_error.as_ref())
    }

    /// Mounted view ids in mount order.
    pub fn views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("views", &self.views.len())
            .field("dirty", &self.dirty.borrow().len())
            .field("config", &self.config)
            .finish()
    }
}

fn render_one(
    id: ViewId,
    mounted: &mut Mounted,
) -> std::result::Result<String, (ViewId, CellError)> {
    match mounted.view.body() {
        Ok(body) => {
            mounted.renders += 1;
            mounted.last_error = None;
            mounted.body = Some(body.clone());
            Ok(body)
        }
        Err(err) => {
            tracing::warn!(
                message = "runtime.render.failed",
                view = %id,
                name = mounted.view.name(),
                error = %err
            );
            mounted.last_error = Some(err.clone());
            Err((id, err))
        }
    }
}
