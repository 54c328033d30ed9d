//! # Transport Registry
//!
//! Maps [`Address`]es to live channels so that tiers can find each other
//! without holding direct references.
//!
//! ```text
//! Application tier ──open_queue(addr)──→ ┌───────────┐
//! Group coordinator ─lookup_queue(addr)─→ │ Transport │ ──→ Arc<MessageQueue<T>>
//! Moderation service ─lookup_queue(addr)→ └───────────┘
//! ```
//!
//! Private queues are allocated from a separate address range and are
//! removed when their [`QueueGuard`] is dropped.

use crate::publisher::InMemoryEventBus;
use crate::queue::MessageQueue;
use parking_lot::RwLock;
use shared_types::Address;
use std::any::Any;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// First address handed out to private queues.
pub const PRIVATE_ADDRESS_BASE: u64 = 1 << 63;

/// Errors from registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("No channel registered at {0}")]
    NotFound(Address),

    #[error("Channel at {address} is not a {expected}")]
    TypeMismatch {
        address: Address,
        expected: &'static str,
    },
}

/// Anything the registry can own and destroy.
pub trait Channel: Send + Sync {
    fn destroy_channel(&self);

    fn is_channel_destroyed(&self) -> bool;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + 'static> Channel for MessageQueue<T> {
    fn destroy_channel(&self) {
        self.destroy();
    }

    fn is_channel_destroyed(&self) -> bool {
        self.is_destroyed()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Channel for InMemoryEventBus {
    fn destroy_channel(&self) {
        self.destroy();
    }

    fn is_channel_destroyed(&self) -> bool {
        self.is_destroyed()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared registry of addressable channels. Cheap to clone.
#[derive(Clone, Default)]
pub struct Transport {
    channels: Arc<RwLock<HashMap<Address, Arc<dyn Channel>>>>,
    next_private: Arc<AtomicU64>,
}

impl Transport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the queue at `address`, creating it if absent or destroyed.
    ///
    /// An existing live queue of the same record type is returned as-is.
    pub fn open_queue<T: Send + 'static>(
        &self,
        address: Address,
        capacity: usize,
    ) -> Result<Arc<MessageQueue<T>>, TransportError> {
        let mut channels = self.channels.write();
        if let Some(existing) = channels.get(&address) {
            if !existing.is_channel_destroyed() {
                return downcast_queue(address, Arc::clone(existing));
            }
        }
        let queue = Arc::new(MessageQueue::new(address, capacity));
        channels.insert(address, Arc::clone(&queue) as Arc<dyn Channel>);
        debug!(address = %address, capacity, "Queue opened");
        Ok(queue)
    }

    /// Find a live queue by address.
    pub fn lookup_queue<T: Send + 'static>(
        &self,
        address: Address,
    ) -> Result<Arc<MessageQueue<T>>, TransportError> {
        let channel = self.live_channel(address)?;
        downcast_queue(address, channel)
    }

    /// Open the event bus at `address`, creating it if absent or destroyed.
    pub fn open_event_bus(
        &self,
        address: Address,
        capacity: usize,
    ) -> Result<Arc<InMemoryEventBus>, TransportError> {
        let mut channels = self.channels.write();
        if let Some(existing) = channels.get(&address) {
            if !existing.is_channel_destroyed() {
                return downcast_bus(address, Arc::clone(existing));
            }
        }
        let bus = Arc::new(InMemoryEventBus::with_capacity(capacity));
        channels.insert(address, Arc::clone(&bus) as Arc<dyn Channel>);
        debug!(address = %address, capacity, "Event bus opened");
        Ok(bus)
    }

    /// Find a live event bus by address.
    pub fn lookup_event_bus(
        &self,
        address: Address,
    ) -> Result<Arc<InMemoryEventBus>, TransportError> {
        let channel = self.live_channel(address)?;
        downcast_bus(address, channel)
    }

    /// Allocate an anonymous queue, removed when the guard drops.
    #[must_use]
    pub fn create_private_queue<T: Send + 'static>(&self, capacity: usize) -> QueueGuard<T> {
        let offset = self.next_private.fetch_add(1, Ordering::Relaxed);
        let address = Address(PRIVATE_ADDRESS_BASE + offset);
        let queue = Arc::new(MessageQueue::new(address, capacity));
        self.channels
            .write()
            .insert(address, Arc::clone(&queue) as Arc<dyn Channel>);
        debug!(address = %address, "Private queue created");
        QueueGuard {
            queue,
            transport: self.clone(),
        }
    }

    /// Destroy and unregister the channel at `address`.
    ///
    /// Returns `false` if nothing was registered there.
    pub fn remove(&self, address: Address) -> bool {
        let removed = self.channels.write().remove(&address);
        match removed {
            Some(channel) => {
                channel.destroy_channel();
                debug!(address = %address, "Channel removed");
                true
            }
            None => false,
        }
    }

    /// Destroy and unregister every channel.
    pub fn remove_all(&self) -> usize {
        let drained: Vec<_> = self.channels.write().drain().collect();
        for (_, channel) in &drained {
            channel.destroy_channel();
        }
        drained.len()
    }

    #[must_use]
    pub fn contains(&self, address: Address) -> bool {
        self.live_channel(address).is_ok()
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_channel(&self, address: Address) -> Result<Arc<dyn Channel>, TransportError> {
        match self.channels.read().get(&address) {
            Some(channel) if !channel.is_channel_destroyed() => Ok(Arc::clone(channel)),
            _ => Err(TransportError::NotFound(address)),
        }
    }
}

fn downcast_queue<T: Send + 'static>(
    address: Address,
    channel: Arc<dyn Channel>,
) -> Result<Arc<MessageQueue<T>>, TransportError> {
    channel
        .into_any()
        .downcast::<MessageQueue<T>>()
        .map_err(|_| TransportError::TypeMismatch {
            address,
            expected: std::any::type_name::<MessageQueue<T>>(),
        })
}

fn downcast_bus(
    address: Address,
    channel: Arc<dyn Channel>,
) -> Result<Arc<InMemoryEventBus>, TransportError> {
    channel
        .into_any()
        .downcast::<InMemoryEventBus>()
        .map_err(|_| TransportError::TypeMismatch {
            address,
            expected: "InMemoryEventBus",
        })
}

/// Owner of a private queue. Dropping it destroys and unregisters the queue.
pub struct QueueGuard<T: Send + 'static> {
    queue: Arc<MessageQueue<T>>,
    transport: Transport,
}

impl<T: Send + 'static> QueueGuard<T> {
    #[must_use]
    pub fn address(&self) -> Address {
        self.queue.address()
    }

    /// Shared handle to the queue; it stops working once the guard drops.
    #[must_use]
    pub fn queue(&self) -> Arc<MessageQueue<T>> {
        Arc::clone(&self.queue)
    }
}

impl<T: Send + 'static> Deref for QueueGuard<T> {
    type Target = MessageQueue<T>;

    fn deref(&self) -> &Self::Target {
        &self.queue
    }
}

impl<T: Send + 'static> Drop for QueueGuard<T> {
    fn drop(&mut self) {
        if !self.transport.remove(self.queue.address()) {
            self.queue.destroy();
        }
    }
}
