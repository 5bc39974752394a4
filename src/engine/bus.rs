use serde_json::Value as Json;
use tracing::warn;

type Handler = Box<dyn FnMut(&Json) -> Result<(), Box<dyn std::error::Error>>>;

/// Synchronous pub/sub used to route host-side UI events into the engine.
///
/// Handlers run in subscription order. A failing handler is logged and
/// swallowed; it never propagates to the emitter, matching the dispatcher's
/// own isolation policy.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(String, Handler)>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&Json) -> Result<(), Box<dyn std::error::Error>> + 'static,
    {
        self.subscribers.push((name.into(), Box::new(handler)));
    }

    pub fn emit(&mut self, name: &str, payload: &Json) {
        for (subscribed, handler) in &mut self.subscribers {
            if subscribed == name {
                if let Err(err) = handler(payload) {
                    warn!(event = name, error = %err, "event handler failed");
                }
            }
        }
    }
}
