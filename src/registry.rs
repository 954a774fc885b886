use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{Event, EventKind};
use crate::event_handler::EventHandler;

type Handlers = Vec<Arc<dyn EventHandler>>;

/// Listener lists keyed by event kind.
///
/// The lock is only held to append or to copy a list out. Handlers are
/// invoked on the copy, so a handler may register more handlers; those miss
/// the event currently being emitted.
#[derive(Default)]
pub struct Registry {
    handlers: Mutex<HashMap<EventKind, Handlers>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.entry(kind).or_default().push(handler);
    }

    pub fn snapshot(&self, kind: EventKind) -> Handlers {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.get(&kind).cloned().unwrap_or_default()
    }

    pub fn emit(&self, event: &Event) {
        for handler in self.snapshot(event.kind()) {
            handler.on_event(event);
        }
    }
}
