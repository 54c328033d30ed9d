//! Validation sinks.
//!
//! Notifications are fire-and-forget: a sink never reports failure back to
//! the coordinator.

use crate::ports::outbound::ValidationSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{ChatEvent, EventPublisher};
use std::sync::Arc;
use tracing::trace;

/// Publishes onto the validation event bus.
pub struct BusValidationSink<P: EventPublisher> {
    publisher: Arc<P>,
}

impl<P: EventPublisher> BusValidationSink<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl<P: EventPublisher + 'static> ValidationSink for BusValidationSink<P> {
    async fn notify(&self, event: ChatEvent) {
        let name = event.name();
        let receivers = self.publisher.publish(event).await;
        trace!(event = name, receivers, "[mc-03] Validation event published");
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpValidationSink;

#[async_trait]
impl ValidationSink for NoOpValidationSink {
    async fn notify(&self, _event: ChatEvent) {}
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingValidationSink {
    events: Mutex<Vec<ChatEvent>>,
}

impl RecordingValidationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ValidationSink for RecordingValidationSink {
    async fn notify(&self, event: ChatEvent) {
        self.events.lock().push(event);
    }
}
