use crate::event::Event;

/// Receives events from the receive loop.
///
/// Handlers run one at a time on the task that reads from the server, so a
/// handler that blocks holds up every message behind it.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}
