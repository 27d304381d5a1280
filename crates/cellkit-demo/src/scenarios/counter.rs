//! A parent owns a tap count; a child button increments it through a link.

use cellkit::runtime::reactive::{Link, State};
use cellkit::runtime::{Result as CellResult, Runtime, RuntimeConfig, Tracker, View};

use super::{Scenario, Transcript};
use crate::error::Result;

struct ContentView {
    count: State<u32>,
}

impl View for ContentView {
    fn name(&self) -> &str {
        "ContentView"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.count)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("You've tapped {} times", self.count.get()))
    }
}

struct TapButton {
    count: Link<u32>,
}

impl View for TapButton {
    fn name(&self) -> &str {
        "TapButton"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.count)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("[ Tap ] ({})", self.count.get()?))
    }
}

pub fn run(config: &RuntimeConfig) -> Result<Transcript> {
    let mut rt = Runtime::new(config.clone());
    let mut transcript = Transcript::new(Scenario::Counter);

    let count = State::new(0u32);
    let tap = count.link();
    let button = TapButton {
        count: count.link(),
    };
    let content = rt.mount(ContentView { count })?;
    let button = rt.mount(button)?;
    transcript.mounted(&rt, content);
    transcript.mounted(&rt, button);

    for _ in 0..3 {
        let (tapped, report) = rt.turn(|| tap.update(|c| *c += 1));
        tapped?;
        transcript.record(&rt, &report);
    }

    // Two taps inside one turn render once, with the final count.
    let (tapped, report) = rt.turn(|| -> CellResult<()> {
        tap.update(|c| *c += 1)?;
        tap.update(|c| *c += 1)?;
        Ok(())
    });
    tapped?;
    transcript.record(&rt, &report);

    rt.unmount(content);
    transcript.note("ContentView unmounted; its count is destroyed");
    let (tapped, report) = rt.turn(|| tap.update(|c| *c += 1));
    match tapped {
        Ok(_) => {}
        Err(err) if err.is_dangling() => transcript.note(format!("tap rejected: {err}")),
        Err(err) => return Err(err.into()),
    }
    transcript.record(&rt, &report);

    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::DRIVER;

    #[test]
    fn each_tap_re_renders_both_views() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        assert_eq!(
            transcript.bodies("ContentView"),
            [
                "You've tapped 0 times",
                "You've tapped 1 times",
                "You've tapped 2 times",
                "You've tapped 3 times",
                "You've tapped 5 times",
            ]
        );
        assert_eq!(
            transcript.bodies("TapButton"),
            ["[ Tap ] (0)", "[ Tap ] (1)", "[ Tap ] (2)", "[ Tap ] (3)", "[ Tap ] (5)"]
        );
    }

    #[test]
    fn batched_taps_render_once() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        let turn4: Vec<_> = transcript.frames_in(4).map(|f| f.view.as_str()).collect();
        assert_eq!(turn4, ["ContentView", "TapButton"]);
    }

    #[test]
    fn tap_after_unmount_dangles() {
        let transcript = run(&RuntimeConfig::default()).unwrap();
        let notes = transcript.bodies(DRIVER);
        assert_eq!(notes.len(), 3);
        assert!(notes[1].starts_with("tap rejected: dangling reference"));
        assert_eq!(notes[2], "nothing re-rendered");
    }
}
