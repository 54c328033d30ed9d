//! # Inbound Ports

use crate::domain::errors::FeedError;
use async_trait::async_trait;
use shared_types::entities::{ChatMessage, UserId};

/// A finite, ordered source of one user's messages.
///
/// Timestamps are expected to be non-decreasing. `Ok(None)` is the
/// end-of-stream marker; after it (or after an error) the feed is done.
#[async_trait]
pub trait UserFeed: Send {
    /// Id of the user this feed belongs to.
    fn user_id(&self) -> UserId;

    /// Produce the next message, or `None` once exhausted.
    async fn next(&mut self) -> Result<Option<ChatMessage>, FeedError>;
}
