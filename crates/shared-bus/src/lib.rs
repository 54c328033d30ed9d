//! # Shared Bus - Channels Between Tiers
//!
//! Every tier talks to the others through this crate only.
//!
//! ## Channel Kinds
//!
//! - **Tagged queues** ([`MessageQueue`]): bounded, addressable, selective
//!   receive by [`Tag`]. Used for the moderation inbox, per-group reply
//!   queues and the group-coordination queue.
//! - **Event bus** ([`InMemoryEventBus`]): fire-and-forget broadcast of
//!   [`ChatEvent`]s to the validation monitor.
//!
//! ```text
//! ┌─────────────┐  tag 1   ┌──────────────┐  30+gid   ┌─────────────┐
//! │ Coordinator │ ───────→ │ Mod. inbox   │ ────────→ │ Reply queue │
//! └─────────────┘          └──────────────┘           └─────────────┘
//!        │ publish()
//!        ▼
//! ┌─────────────┐ subscribe() ┌─────────────┐
//! │  Event Bus  │ ──────────→ │   Monitor   │
//! └─────────────┘             └─────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! Channels are owned by the [`Transport`] registry and destroyed
//! explicitly; private queues are released by their [`QueueGuard`].

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod queue;
pub mod shutdown;
pub mod subscriber;
pub mod tags;
pub mod transport;

// Re-export main types
pub use events::{ChatEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use queue::{MessageQueue, QueueError, Tag, TagFilter, Tagged};
pub use shutdown::{shutdown_channel, shutdown_requested, ShutdownReceiver};
pub use subscriber::{Subscription, SubscriptionError};
pub use transport::{QueueGuard, Transport, TransportError, PRIVATE_ADDRESS_BASE};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default capacity of tagged queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
