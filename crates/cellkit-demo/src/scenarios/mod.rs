//! Scripted interaction scenarios.
//!
//! Every scenario builds its own [`Runtime`], mounts a small view hierarchy,
//! drives it through a fixed sequence of turns and returns a [`Transcript`]
//! of what rendered on each turn.

use std::fmt;

use cellkit::runtime::{FlushReport, Runtime, RuntimeConfig, ViewId};
use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;

pub mod counter;
pub mod orientation;
pub mod settings;
pub mod sheet;
pub mod toggle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Owned counter with a child button writing through a link.
    Counter,
    /// Boolean switch with a projected status label and a synced preference.
    Toggle,
    /// Modal sheet mounted on demand and dismissed through a link.
    Sheet,
    /// External orientation events forwarded into owned state.
    Orientation,
    /// Shared settings handed down through an environment.
    Settings,
    /// Every scenario above, in order.
    All,
}

type ReplayFn = fn(&RuntimeConfig) -> Result<Transcript>;

const REPLAYS: [(Scenario, ReplayFn); 5] = [
    (Scenario::Counter, counter::run),
    (Scenario::Toggle, toggle::run),
    (Scenario::Sheet, sheet::run),
    (Scenario::Orientation, orientation::run),
    (Scenario::Settings, settings::run),
];

impl Scenario {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Toggle => "toggle",
            Self::Sheet => "sheet",
            Self::Orientation => "orientation",
            Self::Settings => "settings",
            Self::All => "all",
        }
    }
}

/// Replay `selection` (or every scenario for [`Scenario::All`]).
pub fn run(selection: Scenario, config: &RuntimeConfig) -> Result<Vec<Transcript>> {
    REPLAYS
        .iter()
        .filter(|(scenario, _)| selection == Scenario::All || *scenario == selection)
        .map(|(scenario, replay)| {
            tracing::info!(message = "scenario.start", scenario = scenario.label());
            replay(config)
        })
        .collect()
}

/// View name used for frames written by the scenario driver itself.
pub const DRIVER: &str = "driver";

/// One line of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// 0 for the initial mount, then one per driven turn.
    pub turn: usize,
    pub view: String,
    pub body: String,
}

/// Everything a scenario rendered, turn by turn.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub scenario: &'static str,
    pub frames: Vec<Frame>,
    #[serde(skip)]
    turn: usize,
}

impl Transcript {
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario: scenario.label(),
            frames: Vec::new(),
            turn: 0,
        }
    }

    /// Record the current body of a freshly mounted view under the last
    /// completed turn.
    pub fn mounted(&mut self, rt: &Runtime, id: ViewId) {
        let view = rt.name(id).unwrap_or("?").to_string();
        let body = rt.body(id).unwrap_or_default().to_string();
        self.push(self.turn, view, body);
    }

    /// Complete a turn with the renders `report` produced.
    pub fn record(&mut self, rt: &Runtime, report: &FlushReport) {
        self.turn += 1;
        if report.is_empty() {
            self.push(self.turn, DRIVER.to_string(), "nothing re-rendered".to_string());
        }
        for rendered in &report.rendered {
            self.push(self.turn, rendered.name.clone(), rendered.body.clone());
        }
        for (id, err) in &report.failed {
            let view = rt.name(*id).unwrap_or("?").to_string();
            self.push(self.turn, view, format!("render failed: {err}"));
        }
    }

    /// Annotate the turn about to be driven.
    pub fn note(&mut self, text: impl Into<String>) {
        self.push(self.turn + 1, DRIVER.to_string(), text.into());
    }

    fn push(&mut self, turn: usize, view: String, body: String) {
        self.frames.push(Frame { turn, view, body });
    }

    /// Bodies recorded for `view`, in order.
    #[must_use]
    pub fn bodies(&self, view: &str) -> Vec<&str> {
        self.frames
            .iter()
            .filter(|f| f.view == view)
            .map(|f| f.body.as_str())
            .collect()
    }

    /// Frames recorded during `turn`.
    pub fn frames_in(&self, turn: usize) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(move |f| f.turn == turn)
    }

    /// Number of driven turns (the mount is turn 0).
    #[must_use]
    pub fn turns(&self) -> usize {
        self.turn
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {}", self.scenario)?;
        for frame in &self.frames {
            writeln!(f, "[{:>2}] {:<18} {}", frame.turn, frame.view, frame.body)?;
        }
        Ok(())
    }
}
