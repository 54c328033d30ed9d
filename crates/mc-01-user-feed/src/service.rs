//! # Feed Producer Service
//!
//! Runs a [`UserFeed`] on its own task and forwards its messages into a
//! bounded channel. The channel closing is the end-of-stream signal seen by
//! the consumer, whatever the reason the producer stopped.
//!
//! ```text
//! [UserFeed] ──next()──→ [producer task] ──mpsc──→ FeedHandle.receiver
//! ```

use crate::ports::inbound::UserFeed;
use shared_types::entities::{ChatMessage, UserId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Producer settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Pause after each delivered message.
    pub throttle: Duration,
    /// Messages buffered between producer and consumer.
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(1),
            channel_capacity: 16,
        }
    }
}

/// Why a producer stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEnd {
    /// The feed reported end-of-stream.
    Exhausted,
    /// The feed failed; the message is the rendered error.
    Failed(String),
    /// The consumer dropped its receiver (for example after a ban).
    Detached,
}

/// Final report of a producer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    pub user_id: UserId,
    pub messages_sent: u64,
    pub end: FeedEnd,
}

/// Consumer side of a running feed.
pub struct FeedHandle {
    pub user_id: UserId,
    pub receiver: mpsc::Receiver<ChatMessage>,
    pub task: JoinHandle<FeedOutcome>,
}

impl FeedHandle {
    /// Build a handle whose channel already holds every message and is closed.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn from_messages(user_id: UserId, messages: Vec<ChatMessage>) -> Self {
        let count = messages.len();
        let (sender, receiver) = mpsc::channel(count.max(1));
        for message in messages {
            // Capacity equals the message count, so this never fails.
            let _ = sender.try_send(message);
        }
        drop(sender);
        let task = tokio::spawn(async move {
            FeedOutcome {
                user_id,
                messages_sent: count as u64,
                end: FeedEnd::Exhausted,
            }
        });
        Self {
            user_id,
            receiver,
            task,
        }
    }
}

/// Spawn the producer task for `feed`.
pub fn spawn_feed<F>(mut feed: F, config: &FeedConfig) -> FeedHandle
where
    F: UserFeed + 'static,
{
    let user_id = feed.user_id();
    let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));
    let throttle = config.throttle;

    let task = tokio::spawn(async move {
        let mut messages_sent = 0u64;
        let end = loop {
            match feed.next().await {
                Ok(Some(message)) => {
                    if sender.send(message).await.is_err() {
                        break FeedEnd::Detached;
                    }
                    messages_sent += 1;
                    if !throttle.is_zero() {
                        tokio::time::sleep(throttle).await;
                    }
                }
                Ok(None) => break FeedEnd::Exhausted,
                Err(e) => {
                    warn!(user = %user_id, error = %e, "[mc-01] Feed failed, ending stream");
                    break FeedEnd::Failed(e.to_string());
                }
            }
        };
        debug!(user = %user_id, sent = messages_sent, end = ?end, "[mc-01] Producer finished");
        FeedOutcome {
            user_id,
            messages_sent,
            end,
        }
    });

    FeedHandle {
        user_id,
        receiver,
        task,
    }
}
