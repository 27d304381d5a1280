//! A host owns the "sheet presented" flag. The sheet is mounted while the
//! flag is set and dismisses itself by clearing the flag through a link.

use cellkit::runtime::reactive::{Link, State};
use cellkit::runtime::{Result as CellResult, Runtime, RuntimeConfig, Tracker, View, ViewId};

use super::{Scenario, Transcript};
use crate::error::Result;

struct HostView {
    presented: State<bool>,
}

impl View for HostView {
    fn name(&self) -> &str {
        "HostView"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.presented)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        Ok(format!("[ Show Sheet ] presented={}", self.presented.get()))
    }
}

struct SheetView {
    title: &'static str,
    presented: Link<bool>,
}

impl View for SheetView {
    fn name(&self) -> &str {
        "SheetView"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> CellResult<()> {
        deps.watch(&self.presented)?;
        Ok(())
    }

    fn body(&self) -> CellResult<String> {
        let action = if self.presented.get()? {
            "[ Dismiss ]"
        } else {
            "(closing)"
        };
        Ok(format!("{} {action}", self.title))
    }
}

/// Times the driver presents the sheet.
const PRESENTATIONS: usize = 2;

/// Mount or unmount the sheet to match the presented flag. Each mounted
/// sheet takes one of the links the host handed out before mounting.
fn reconcile(
    rt: &mut Runtime,
    transcript: &mut Transcript,
    presented: &Link<bool>,
    spare: &mut Vec<Link<bool>>,
    sheet: &mut Option<ViewId>,
) -> Result<()> {
    match (presented.get()?, *sheet) {
        (true, None) => {
            let Some(link) = spare.pop() else {
                return Ok(());
            };
            let id = rt.mount(SheetView {
                title: "Details",
                presented: link,
            })?;
            transcript.mounted(rt, id);
            *sheet = Some(id);
        }
        (false, Some(id)) => {
            rt.unmount(id);
            *sheet = None;
        }
        _ => {}
    }
    Ok(())
}

pub fn run(config: &RuntimeConfig) -> Result<Transcript> {
    let mut rt = Runtime::new(config.clone());
    let mut transcript = Transcript::new(Scenario::Sheet);

    let presented = State::new(false);
    let show = presented.link();
    let dismiss = presented.link();
    let mut spare: Vec<_> = (0..PRESENTATIONS).map(|_| presented.link()).collect();
    let host = rt.mount(HostView { presented })?;
    transcript.mounted(&rt, host);
    let mut sheet = None;

    transcript.note("tap Show Sheet");
    let (result, report) = rt.turn(|| show.set(true));
    result?;
    transcript.record(&rt, &report);
    reconcile(&mut rt, &mut transcript, &show, &mut spare, &mut sheet)?;

    transcript.note("tap Dismiss inside the sheet");
    let (result, report) = rt.turn(|| dismiss.set(false));
    result?;
    transcript.record(&rt, &report);
    reconcile(&mut rt, &mut transcript, &show, &mut spare, &mut sheet)?;

    transcript.note("show the sheet again");
    let (result, report) = rt.turn(|| show.set(true));
    result?;
    transcript.record(&rt, &report);
    reconcile(&mut rt, &mut transcript, &show, &mut spare, &mut sheet)?;

    transcript.note("host unmounted while the sheet is up");
    rt.unmount(host);
    let (result, report) = rt.turn(|| dismiss.set(false));
    match result {
        Ok(_) => {}
        Err(err) if err.is_dangling() => transcript.note(format!("dismiss rejected: {err}")),
        Err(err) => return Err(err.into()),
    }
    transcript.record(&rt, &report);
    if let Some(id) = sheet.take() {
        rt.unmount(id);
    }

    Ok(transcript)
}
