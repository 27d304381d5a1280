#![forbid(unsafe_code)]

//! The runtime reports lifecycle and flush events through `tracing`.

use std::sync::{Arc, Mutex};

use cellkit_runtime::reactive::{Link, State};
use cellkit_runtime::{Result, Runtime, RuntimeConfig, Tracker, View};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Default)]
struct Captured {
    messages: Vec<String>,
}

struct Capture {
    state: Arc<Mutex<Captured>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg(Option<String>);

        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.0 = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" && self.0.is_none() {
                    self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }

        let mut msg = Msg(None);
        event.record(&mut msg);
        if let Some(message) = msg.0 {
            self.state
                .lock()
                .expect("trace capture lock")
                .messages
                .push(message);
        }
    }
}

struct Looping {
    counter: Link<u32>,
}

impl View for Looping {
    fn name(&self) -> &str {
        "Looping"
    }

    fn track(&self, deps: &mut Tracker<'_>) -> Result<()> {
        deps.watch(&self.counter)?;
        Ok(())
    }

    fn body(&self) -> Result<String> {
        let v = self.counter.get()?;
        self.counter.set(v + 1)?;
        Ok(v.to_string())
    }
}

#[test]
fn lifecycle_events_are_emitted() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(Capture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let counter = State::new(0u32);
    let mut rt = Runtime::new(RuntimeConfig {
        max_flush_passes: 2,
        ..RuntimeConfig::default()
    });
    rt.mount(Looping {
        counter: counter.link(),
    })
    .unwrap();
    let report = rt.flush();
    assert!(report.truncated);
    counter.destroy();

    let captured = state.lock().expect("trace capture lock");
    for expected in [
        "runtime.mount",
        "runtime.flush.truncated",
        "runtime.flush",
        "state.destroy",
    ] {
        assert!(
            captured.messages.iter().any(|m| m == expected),
            "missing {expected} in {:?}",
            captured.messages
        );
    }
}
