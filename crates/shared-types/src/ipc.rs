//! # IPC Message Payloads
//!
//! Records exchanged between the tiers.
//!
//! | Record | Sender | Receiver | Channel |
//! |--------|--------|----------|---------|
//! | `ModerationRequest` | Group Coordinator | Moderation Service | shared moderation inbox |
//! | `ModerationVerdict` | Moderation Service | issuing Group Coordinator | private reply queue |
//! | `GroupTerminationReport` | Group Coordinator | Application Tier | group-coordination queue |
//!
//! Moderation records travel inside an [`Envelope`](crate::Envelope); the
//! termination report is sent as-is.

use crate::entities::{ChatMessage, GroupId, ModerationAction, UserId, MAX_TEXT_BYTES};
use crate::errors::MessageError;
use serde::{Deserialize, Serialize};

// =============================================================================
// GROUP COORDINATOR → MODERATION SERVICE
// =============================================================================

/// Request to moderate one forwarded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub group_id: GroupId,
    pub user_id: UserId,
    /// Message body, at most [`MAX_TEXT_BYTES`].
    pub text: String,
    /// Violations the coordinator has seen confirmed for this user so far.
    pub cumulative_violations: u32,
}

impl ModerationRequest {
    /// Build a request for a message selected by the merge engine.
    #[must_use]
    pub fn for_message(message: &ChatMessage, cumulative_violations: u32) -> Self {
        Self {
            group_id: message.group_id(),
            user_id: message.user_id(),
            text: message.text().to_string(),
            cumulative_violations,
        }
    }

    /// Check the record invariants after decoding.
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.text.len() > MAX_TEXT_BYTES {
            return Err(MessageError::TextTooLong {
                len: self.text.len(),
                max: MAX_TEXT_BYTES,
            });
        }
        Ok(())
    }
}

// =============================================================================
// MODERATION SERVICE → GROUP COORDINATOR
// =============================================================================

/// Allow/Ban decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub action: ModerationAction,
    /// Cumulative violation count after this message.
    pub violation_count: u32,
}

impl ModerationVerdict {
    /// Verdict used when a request cannot be decoded.
    #[must_use]
    pub fn fallback_allow(group_id: GroupId) -> Self {
        Self {
            group_id,
            user_id: UserId(0),
            action: ModerationAction::Allow,
            violation_count: 0,
        }
    }

    #[must_use]
    pub fn is_ban(&self) -> bool {
        self.action == ModerationAction::Ban
    }
}

// =============================================================================
// GROUP COORDINATOR → APPLICATION TIER
// =============================================================================

/// How a group's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationStatus {
    /// Every user reached `Finished` or `Banned`.
    Completed,
    /// The moderation inbox disappeared mid-run.
    ModerationUnavailable,
    /// The coordinator was asked to shut down.
    Cancelled,
}

/// Sent exactly once by every group coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTerminationReport {
    pub group_id: GroupId,
    pub banned_user_count: u32,
    pub status: TerminationStatus,
    pub users_joined: u32,
    pub messages_forwarded: u64,
}

impl GroupTerminationReport {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TerminationStatus::Completed
    }
}
