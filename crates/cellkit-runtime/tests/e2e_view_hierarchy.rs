#![forbid(unsafe_code)]

//! End-to-end: a parent view owning state, children holding links, and a
//! shared settings object passed through an explicit environment.
//!
//! Validates:
//! 1. A child writing through its link re-renders the parent in the same turn.
//! 2. Environment-shared values reach every consumer handed the environment.
//! 3. Destroying the parent's state makes the children's next render fail.

use cellkit_runtime::reactive::{Link, Observable, State};
use cellkit_runtime::{Environment, Result, Runtime, Tracker, View};

#[derive(Clone, Debug, PartialEq)]
struct Settings {
    score: u32,
}

struct Parent {
    tapped: Link<bool>,
}

impl View for Parent {
    fn name(&self) -> &str {
        "Parent"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> Result<()> {
        deps.watch(&self.tapped)?;
        Ok(())
    }

    fn body(&self) -> Result<String> {
        let tapped = self.tapped.get()?;
        Ok(if tapped { "Tapped!" } else { "Tap me" }.to_string())
    }
}

struct ScoreLabel {
    settings: Observable<Settings>,
}

impl ScoreLabel {
    fn new(env: &Environment) -> Result<Self> {
        Ok(Self {
            settings: env.require::<Settings>()?,
        })
    }
}

impl View for ScoreLabel {
    fn name(&self) -> &str {
        "ScoreLabel"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> Result<()> {
        deps.watch(&self.settings)?;
        Ok(())
    }

    fn body(&self) -> Result<String> {
        Ok(format!("Score: {}", self.settings.get().score))
    }
}

#[test]
fn child_link_write_rerenders_parent() {
    let tapped = State::new(false);
    let child_button = tapped.link();
    let mut rt = Runtime::default();
    let parent = rt
        .mount(Parent {
            tapped: tapped.link(),
        })
        .unwrap();
    assert_eq!(rt.body(parent), Some("Tap me"));

    let (_, report) = rt.turn(|| child_button.update(|t| *t = !*t));
    assert_eq!(report.bodies_for(parent).collect::<Vec<_>>(), vec!["Tapped!"]);
    assert!(tapped.get());
}

#[test]
fn environment_value_reaches_all_consumers() {
    let env = Environment::new();
    let settings = env.insert(Settings { score: 0 });
    let mut rt = Runtime::default();

    let first = rt.mount(ScoreLabel::new(&env).unwrap()).unwrap();
    let sheet_env = env.child();
    let second = rt.mount(ScoreLabel::new(&sheet_env).unwrap()).unwrap();

    let (_, report) = rt.turn(|| {
        settings.update(|s| s.score += 1);
        settings.update(|s| s.score += 1);
    });
    assert_eq!(report.rendered.len(), 2);
    assert_eq!(rt.body(first), Some("Score: 2"));
    assert_eq!(rt.body(second), Some("Score: 2"));
}

#[test]
fn missing_environment_value_fails_construction() {
    let env = Environment::new();
    let err = ScoreLabel::new(&env).err().unwrap();
    assert!(!err.is_dangling());
}

#[test]
fn destroyed_owner_fails_children() {
    let tapped = State::new(false);
    let link = tapped.link();
    let poke = Observable::new(0u8);

    struct Child {
        poke: Observable<u8>,
        tapped: Link<bool>,
    }

    impl View for Child {
        fn name(&self) -> &str {
            "Child"
        }

        fn track(&self, deps: &mut Tracker<'_>) -> Result<()> {
            deps.watch(&self.poke)?.watch(&self.tapped)?;
            Ok(())
        }

        fn body(&self) -> Result<String> {
            Ok(format!("{}", self.tapped.get()?))
        }
    }

    let mut rt = Runtime::default();
    let child = rt
        .mount(Child {
            poke: poke.clone(),
            tapped: tapped.link(),
        })
        .unwrap();

    tapped.destroy();
    let (_, report) = rt.turn(|| poke.set(1));
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.is_dangling());
    assert_eq!(rt.body(child), Some("false"));
    assert!(link.get().is_err());
}
