//! A settings row owns a switch state. The switch writes it through a link,
//! a status label reads and writes it through a projection, and a stored
//! preference is kept in sync both ways.

use cellkit::runtime::reactive::{Link, Observable, Projection, State, TwoWayBinding};
use cellkit::runtime::{Result as CellResult, Runtime, RuntimeConfig, Tracker, View};

use super::{Scenario, Transcript};
use crate::error::Result;

struct SettingsRow {
    airplane: State<bool>,
    _stored: TwoWayBinding<bool>,
}

impl View for SettingsRow {
    fn name(&self) -> &str {
        "SettingsRow"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.airplane)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        let mark = if self.airplane.get() { 'x' } else { ' ' };
        Ok(format!("Airplane mode [{mark}]"))
    }
}

struct AirplaneSwitch {
    on: Link<bool>,
}

impl View for AirplaneSwitch {
    fn name(&self) -> &str {
        "AirplaneSwitch"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.on)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        let text = if self.on.get()? { "switch: ON" } else { "switch: OFF" };
        Ok(text.to_string())
    }
}

struct StatusLabel {
    status: Projection<String>,
}

impl View for StatusLabel {
    fn name(&self) -> &str {
        "StatusLabel"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.status)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("status: {}", self.status.get()?))
    }
}

fn status_text(on: &bool) -> String {
    let text = if *on { "on" } else { "off" };
    text.to_string()
}

fn status_projection(on: Link<bool>) -> Projection<String> {
    on.project(status_text, |on, text: String| *on = text == "on")
}

pub fn run(config: &RuntimeConfig) -> Result<Transcript> {
    let mut rt = Runtime::new(config.clone());
    let mut transcript = Transcript::new(Scenario::Toggle);

    let stored = Observable::new(true);
    let airplane = State::new(false);
    let tap = airplane.link();
    let relabel = status_projection(airplane.link());
    let switch = AirplaneSwitch {
        on: airplane.link(),
    };
    let label = StatusLabel {
        status: status_projection(airplane.link()),
    };
    let sync = TwoWayBinding::new(stored.clone(), airplane.link())?;

    let row = rt.mount(SettingsRow {
        airplane,
        _stored: sync,
    })?;
    let switch_view = rt.mount(switch)?;
    let label = rt.mount(label)?;
    for id in [row, switch_view, label] {
        transcript.mounted(&rt, id);
    }

    transcript.note("tap the switch");
    let (result, report) = rt.turn(|| tap.update(|on| *on = !*on));
    result?;
    transcript.record(&rt, &report);
    transcript.note(format!("stored preference: {}", stored.get()));

    transcript.note("write \"on\" through the status label");
    let (result, report) = rt.turn(|| relabel.set("on".to_string()));
    result?;
    transcript.record(&rt, &report);

    transcript.note("stored preference changes elsewhere");
    let ((), report) = rt.turn(|| {
        stored.set(false);
    });
    transcript.record(&rt, &report);

    transcript.note("switch set to its current value");
    let (result, report) = rt.turn(|| tap.set(false));
    result?;
    transcript.record(&rt, &report);

    Ok(transcript)
}
