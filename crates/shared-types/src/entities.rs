//! # Core Domain Entities
//!
//! Identifiers and the immutable chat message produced by user feeds.
//!
//! ## Clusters
//!
//! - **Identity**: `GroupId`, `UserId`
//! - **Content**: `ChatMessage`, `Timestamp`
//! - **Moderation**: `UserStatus`, `ModerationAction`

use crate::errors::MessageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum size of a message body in bytes.
pub const MAX_TEXT_BYTES: usize = 255;

/// Position of a message on its feed's timeline.
pub type Timestamp = i64;

/// Identifier of a chat group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user inside a group.
///
/// User ids are only unique within their group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single chat line emitted by a user feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    timestamp: Timestamp,
    group_id: GroupId,
    user_id: UserId,
    text: String,
}

impl ChatMessage {
    /// Create a message, rejecting bodies longer than [`MAX_TEXT_BYTES`].
    pub fn new(
        timestamp: Timestamp,
        group_id: GroupId,
        user_id: UserId,
        text: impl Into<String>,
    ) -> Result<Self, MessageError> {
        let text = text.into();
        if text.len() > MAX_TEXT_BYTES {
            return Err(MessageError::TextTooLong {
                len: text.len(),
                max: MAX_TEXT_BYTES,
            });
        }
        Ok(Self {
            timestamp,
            group_id,
            user_id,
            text,
        })
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Key used by the merge engine: timestamp first, then user id.
    #[must_use]
    pub fn ordering_key(&self) -> (Timestamp, UserId) {
        (self.timestamp, self.user_id)
    }
}

/// Cut `text` down to at most [`MAX_TEXT_BYTES`] without splitting a character.
#[must_use]
pub fn truncate_text(text: &str) -> &str {
    if text.len() <= MAX_TEXT_BYTES {
        return text;
    }
    let mut end = MAX_TEXT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Lifecycle of one user's stream within a group.
///
/// `Finished` and `Banned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    /// The feed may still produce messages.
    Active,
    /// The feed reached end-of-stream (or its producer died).
    Finished,
    /// The moderation service banned the user.
    Banned,
}

impl UserStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Decision taken by the moderation service for one message.
///
/// Encoded on the wire as a single byte: `0 = Allow`, `1 = Ban`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ModerationAction {
    Allow = 0,
    Ban = 1,
}

impl From<ModerationAction> for u8 {
    fn from(action: ModerationAction) -> Self {
        action as u8
    }
}

impl TryFrom<u8> for ModerationAction {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Allow),
            1 => Ok(Self::Ban),
            other => Err(MessageError::UnknownAction(other)),
        }
    }
}
