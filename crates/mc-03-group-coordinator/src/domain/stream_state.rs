//! # User Stream State
//!
//! Lookahead slot and lifecycle of one user inside a group.
//!
//! ```text
//! [Active] ──feed closed, slot empty──→ [Finished]
//!    │
//!    └──────Ban verdict──────────────→ [Banned]
//! ```
//!
//! Only `Active` users hold a pending message; terminal states never change.

use shared_types::entities::{ChatMessage, UserId, UserStatus};

#[derive(Debug, Clone)]
pub struct UserStreamState {
    user_id: UserId,
    pending: Option<ChatMessage>,
    status: UserStatus,
    /// Last cumulative count reported by the moderation service.
    violations: u32,
    forwarded: u64,
}

impl UserStreamState {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            pending: None,
            status: UserStatus::Active,
            violations: 0,
            forwarded: 0,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn status(&self) -> UserStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    #[must_use]
    pub fn pending(&self) -> Option<&ChatMessage> {
        self.pending.as_ref()
    }

    /// Active with an empty slot.
    #[must_use]
    pub fn needs_refill(&self) -> bool {
        self.is_active() && self.pending.is_none()
    }

    #[must_use]
    pub fn violations(&self) -> u32 {
        self.violations
    }

    /// Messages taken from this stream so far.
    #[must_use]
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    /// Put the next message in the slot.
    ///
    /// Returns `false` (and drops the message) unless the slot was empty
    /// and the user is still active.
    pub fn fill(&mut self, message: ChatMessage) -> bool {
        if !self.needs_refill() {
            return false;
        }
        self.pending = Some(message);
        true
    }

    /// Consume the pending message.
    pub fn take_pending(&mut self) -> Option<ChatMessage> {
        let taken = self.pending.take();
        if taken.is_some() {
            self.forwarded += 1;
        }
        taken
    }

    /// The feed ended. Only applies to an active user with an empty slot.
    pub fn finish(&mut self) -> bool {
        if !self.needs_refill() {
            return false;
        }
        self.status = UserStatus::Finished;
        true
    }

    /// The moderation service banned the user. Discards any pending message.
    pub fn ban(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.pending = None;
        self.status = UserStatus::Banned;
        true
    }

    /// Store the cumulative count from a verdict. Never lowers it.
    pub fn record_violations(&mut self, cumulative: u32) {
        self.violations = self.violations.max(cumulative);
    }
}
