//! Device orientation arrives from an external event source. A reader view
//! forwards each event into its own state and derives a layout from it.

use std::fmt;

use cellkit::runtime::reactive::{BindingScope, Computed, Observable, State};
use cellkit::runtime::{Result as CellResult, Runtime, RuntimeConfig, Tracker, View};

use super::{Scenario, Transcript};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl Orientation {
    #[must_use]
    pub fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Portrait => "portrait",
            Self::PortraitUpsideDown => "portrait (upside down)",
            Self::LandscapeLeft => "landscape (left)",
            Self::LandscapeRight => "landscape (right)",
        })
    }
}

struct OrientationReader {
    orientation: State<Orientation>,
    wide: Computed<bool>,
    _events: BindingScope,
}

impl OrientationReader {
    fn new(events: &Observable<Orientation>) -> CellResult<Self> {
        let orientation = State::new(events.get());
        let forward = orientation.link();
        let mut scope = BindingScope::new();
        scope.subscribe(events, move |next: &Orientation| {
            if let Err(err) = forward.set(*next) {
                tracing::debug!(message = "orientation.forward.drop", error = %err);
            }
        })?;
        let wide = Computed::from_source(orientation.link(), |o: &Orientation| {
            o.is_landscape()
        })?;
        Ok(Self {
            orientation,
            wide,
            _events: scope,
        })
    }
}

impl View for OrientationReader {
    fn name(&self) -> &str {
        "OrientationReader"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.orientation)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        let layout = if self.wide.get()? { "wide" } else { "tall" };
        Ok(format!("{} -> {layout} layout", self.orientation.get()))
    }
}

struct EventLog {
    events: Observable<Orientation>,
}

impl View for EventLog {
    fn name(&self) -> &str {
        "EventLog"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.events)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("last event: {}", self.events.get()))
    }
}

pub fn run(config: &RuntimeConfig) -> Result<Transcript> {
    let mut rt = Runtime::new(config.clone());
    let mut transcript = Transcript::new(Scenario::Orientation);

    let events = Observable::new(Orientation::Portrait);
    let reader = rt.mount(OrientationReader::new(&events)?)?;
    let log = rt.mount(EventLog {
        events: events.clone(),
    })?;
    transcript.mounted(&rt, reader);
    transcript.mounted(&rt, log);

    for next in [
        Orientation::LandscapeLeft,
        Orientation::LandscapeLeft,
        Orientation::LandscapeRight,
        Orientation::PortraitUpsideDown,
    ] {
        transcript.note(format!("device rotated: {next}"));
        let ((), report) = rt.turn(|| {
            events.set(next);
        });
        transcript.record(&rt, &report);
    }

    rt.unmount(reader);
    transcript.note("reader unmounted; its event subscription is released");
    let ((), report) = rt.turn(|| {
        events.set(Orientation::Portrait);
    });
    transcript.record(&rt, &report);
    transcript.note(format!("event subscribers left: {}", events.subscriber_count()));

    Ok(transcript)
}
