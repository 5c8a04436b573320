//! Trace Listeners
//!
//! Callbacks run on the session's task, never on the caller's. Consumers
//! that live elsewhere should use the [`EventBus`] implementation and read
//! the events from a subscription.

use gfxtrace_core::{Event, EventBus};
use tracing::{error, info};

use crate::error::TraceError;

/// Receives the status of a trace session
///
/// A session calls exactly one of `on_stopped` or `on_error`, once, as its
/// last notification.
pub trait TraceListener: Send + Sync {
    /// The session entered a new phase
    fn on_action(&self, name: &str);

    /// Total bytes received so far
    fn on_progress(&self, bytes: u64);

    fn on_stopped(&self);

    fn on_error(&self, error: &TraceError);
}

impl TraceListener for EventBus {
    fn on_action(&self, name: &str) {
        self.emit(Event::TraceAction(name.to_string()));
    }

    fn on_progress(&self, bytes: u64) {
        self.emit(Event::TraceProgress(bytes));
    }

    fn on_stopped(&self) {
        self.emit(Event::TraceStopped);
    }

    fn on_error(&self, error: &TraceError) {
        self.emit(Event::TraceError(error.to_string()));
    }
}

/// Writes session status to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl TraceListener for LogListener {
    fn on_action(&self, name: &str) {
        info!("{}", name);
    }

    fn on_progress(&self, bytes: u64) {
        info!("Captured {} bytes", bytes);
    }

    fn on_stopped(&self) {
        info!("Trace stopped");
    }

    fn on_error(&self, error: &TraceError) {
        error!("Trace failed: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_listener() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let listener: &dyn TraceListener = &bus;

        listener.on_action("Tracing...");
        listener.on_progress(4096);
        listener.on_error(&TraceError::Protocol("bad magic".into()));
        listener.on_stopped();

        let events: Vec<Event> = std::iter::from_fn(|| sub.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                Event::TraceAction("Tracing...".into()),
                Event::TraceProgress(4096),
                Event::TraceError("Protocol error: bad magic".into()),
                Event::TraceStopped,
            ]
        );
    }
}
