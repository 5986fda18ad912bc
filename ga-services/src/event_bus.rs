//! Typed event bus for store lifecycle notifications.
//!
//! Uses a tokio broadcast channel so hosts (the CLI, a UI shell, tests) can
//! observe lifecycle progress without the controller knowing who listens.
//! Startup and teardown failures are contained, so this bus and the logs are
//! the only places they surface.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::lifecycle::LifecyclePhase;

/// Store lifecycle events.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The controller entered a new phase.
    PhaseChanged {
        phase: LifecyclePhase,
    },
    /// Opening or seeding failed; the app continues without local history.
    StartupDegraded {
        reason: String,
    },
    /// A seed pass finished.
    Seeded {
        partition: String,
        written: usize,
        failed: usize,
    },
    /// A delete of the database was attempted.
    DatabaseDeleted {
        name: String,
        outcome: String,
    },
}

/// Event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Slow subscribers that fall behind
/// receive a `Lagged` error and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<StoreEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive store events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: StoreEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    /// Get the current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

fn event_label(event: &StoreEvent) -> &'static str {
    match event {
        StoreEvent::PhaseChanged { .. } => "PhaseChanged",
        StoreEvent::StartupDegraded { .. } => "StartupDegraded",
        StoreEvent::Seeded { .. } => "Seeded",
        StoreEvent::DatabaseDeleted { .. } => "DatabaseDeleted",
    }
}
