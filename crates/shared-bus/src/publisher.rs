//! # Event Publisher
//!
//! Publishing side of the validation bus.

use crate::events::{ChatEvent, EventFilter};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the event.
    async fn publish(&self, event: ChatEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// After [`destroy`](Self::destroy) every publish is dropped and every
/// subscription observes the bus as closed.
pub struct InMemoryEventBus {
    /// Broadcast sender; `None` once destroyed.
    sender: RwLock<Option<broadcast::Sender<ChatEvent>>>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<String, usize>>>,

    /// Total events published.
    events_published: AtomicU64,

    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: RwLock::new(Some(sender)),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// Subscribing to a destroyed bus yields a subscription that is
    /// already closed.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = match self.sender.read() {
            Ok(guard) => guard.as_ref().map(broadcast::Sender::subscribe),
            Err(_) => None,
        };
        let receiver = receiver.unwrap_or_else(|| {
            let (closed, receiver) = broadcast::channel(1);
            drop(closed);
            receiver
        });
        let topic_key = format!("{:?}", filter.topics);

        if let Ok(mut subs) = self.subscriptions.write() {
            *subs.entry(topic_key.clone()).or_insert(0) += 1;
        }

        debug!(topics = ?filter.topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topic_key)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        match self.sender.read() {
            Ok(guard) => guard.as_ref().map_or(0, broadcast::Sender::receiver_count),
            Err(_) => 0,
        }
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the bus. Idempotent.
    pub fn destroy(&self) {
        if let Ok(mut guard) = self.sender.write() {
            if guard.take().is_some() {
                debug!("Event bus destroyed");
            }
        }
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.sender.read().map_or(true, |guard| guard.is_none())
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: ChatEvent) -> usize {
        let topic = event.topic();
        let group = event.group_id();

        // Always increment counter (event was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let sender = match self.sender.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            debug!(topic = ?topic, group = %group, "Event dropped (bus destroyed)");
            return 0;
        };

        match sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    topic = ?topic,
                    group = %group,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(e) => {
                // No receivers - event is dropped
                warn!(
                    topic = ?topic,
                    group = %group,
                    error = %e,
                    "Event dropped (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
