//! # Tagged Message Queue
//!
//! Bounded FIFO of tagged records with selective receive.
//!
//! ## Semantics
//!
//! - `send` waits for free space; `try_send` fails with [`QueueError::Full`].
//! - Receives take the oldest record whose tag matches the [`TagFilter`].
//! - `destroy` discards queued records and wakes every waiter; all later
//!   operations fail with [`QueueError::Destroyed`].

use parking_lot::Mutex;
use shared_types::Address;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;

/// Routing tag attached to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u64);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which records a receive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFilter {
    /// Oldest record, whatever its tag.
    Any,
    /// Oldest record carrying exactly this tag.
    Exact(Tag),
}

impl TagFilter {
    #[must_use]
    pub fn accepts(&self, tag: Tag) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(wanted) => *wanted == tag,
        }
    }
}

/// A record together with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    pub tag: Tag,
    pub payload: T,
}

/// Errors from queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue destroyed")]
    Destroyed,

    #[error("Queue full (capacity {capacity})")]
    Full { capacity: usize },
}

struct QueueState<T> {
    items: VecDeque<Tagged<T>>,
    destroyed: bool,
}

/// Addressable tagged queue shared between tasks.
pub struct MessageQueue<T> {
    address: Address,
    capacity: usize,
    state: Mutex<QueueState<T>>,
    /// Signalled when a record is pushed or the queue is destroyed.
    arrived: Notify,
    /// Signalled when a record is popped or the queue is destroyed.
    drained: Notify,
}

impl<T> MessageQueue<T> {
    /// Create a queue holding at most `capacity` records (minimum 1).
    #[must_use]
    pub fn new(address: Address, capacity: usize) -> Self {
        Self {
            address,
            capacity: capacity.max(1),
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                destroyed: false,
            }),
            arrived: Notify::new(),
            drained: Notify::new(),
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Enqueue without waiting.
    pub fn try_send(&self, tag: Tag, payload: T) -> Result<(), QueueError> {
        match self.push(Tagged { tag, payload }) {
            Ok(()) => Ok(()),
            Err((err, _)) => Err(err),
        }
    }

    /// Enqueue, waiting for free space.
    pub async fn send(&self, tag: Tag, payload: T) -> Result<(), QueueError> {
        let mut record = Tagged { tag, payload };
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.push(record) {
                Ok(()) => return Ok(()),
                Err((QueueError::Full { .. }, rejected)) => record = rejected,
                Err((err, _)) => return Err(err),
            }

            notified.await;
        }
    }

    /// Take the oldest matching record without waiting.
    pub fn try_recv(&self, filter: TagFilter) -> Result<Option<Tagged<T>>, QueueError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(QueueError::Destroyed);
        }
        let Some(pos) = state.items.iter().position(|r| filter.accepts(r.tag)) else {
            return Ok(None);
        };
        let record = state.items.remove(pos);
        drop(state);
        self.drained.notify_waiters();
        Ok(record)
    }

    /// Take the oldest matching record, waiting until one arrives.
    pub async fn recv(&self, filter: TagFilter) -> Result<Tagged<T>, QueueError> {
        loop {
            let notified = self.arrived.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(record) = self.try_recv(filter)? {
                return Ok(record);
            }

            notified.await;
        }
    }

    /// Like [`recv`](Self::recv) but gives up after `wait`, returning `Ok(None)`.
    pub async fn recv_timeout(
        &self,
        filter: TagFilter,
        wait: Duration,
    ) -> Result<Option<Tagged<T>>, QueueError> {
        match tokio::time::timeout(wait, self.recv(filter)).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Resolves once the queue is destroyed.
    pub async fn closed(&self) {
        loop {
            let notified = self.arrived.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_destroyed() {
                return;
            }

            notified.await;
        }
    }

    /// Discard queued records and fail all current and future operations.
    ///
    /// Returns `false` if the queue was already destroyed.
    pub fn destroy(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return false;
            }
            state.destroyed = true;
            state.items.clear();
        }
        self.arrived.notify_waiters();
        self.drained.notify_waiters();
        true
    }

    fn push(&self, record: Tagged<T>) -> Result<(), (QueueError, Tagged<T>)> {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return Err((QueueError::Destroyed, record));
            }
            if state.items.len() >= self.capacity {
                return Err((
                    QueueError::Full {
                        capacity: self.capacity,
                    },
                    record,
                ));
            }
            state.items.push_back(record);
        }
        self.arrived.notify_waiters();
        Ok(())
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("address", &self.address)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
