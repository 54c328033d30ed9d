//! # Chat Events
//!
//! Lifecycle notifications published on the validation bus.
//! Publishing is fire-and-forget: nobody is required to listen.

use serde::{Deserialize, Serialize};
use shared_types::entities::{GroupId, Timestamp, UserId};
use shared_types::ipc::TerminationStatus;

/// All events that can be published to the validation bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatEvent {
    // =========================================================================
    // GROUP LIFECYCLE
    // =========================================================================
    /// A group coordinator started.
    GroupCreated { group_id: GroupId },

    /// A coordinator finished and sent its termination report.
    GroupTerminated {
        group_id: GroupId,
        banned_users: u32,
        status: TerminationStatus,
    },

    // =========================================================================
    // USER LIFECYCLE
    // =========================================================================
    /// A user feed was attached to its group.
    UserJoined { group_id: GroupId, user_id: UserId },

    /// The moderation service banned a user.
    UserBanned {
        group_id: GroupId,
        user_id: UserId,
        /// Cumulative violations that triggered the ban.
        violations: u32,
    },

    // =========================================================================
    // TRAFFIC
    // =========================================================================
    /// A message was selected by the merge engine and sent for moderation.
    MessageForwarded {
        group_id: GroupId,
        user_id: UserId,
        timestamp: Timestamp,
        text: String,
    },
}

impl ChatEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::GroupCreated { .. } | Self::GroupTerminated { .. } => EventTopic::GroupLifecycle,
            Self::UserJoined { .. } => EventTopic::Membership,
            Self::UserBanned { .. } => EventTopic::Moderation,
            Self::MessageForwarded { .. } => EventTopic::Traffic,
        }
    }

    /// Group the event belongs to.
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        match self {
            Self::GroupCreated { group_id }
            | Self::GroupTerminated { group_id, .. }
            | Self::UserJoined { group_id, .. }
            | Self::UserBanned { group_id, .. }
            | Self::MessageForwarded { group_id, .. } => *group_id,
        }
    }

    /// Short name used in log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GroupCreated { .. } => "GroupCreated",
            Self::GroupTerminated { .. } => "GroupTerminated",
            Self::UserJoined { .. } => "UserJoined",
            Self::UserBanned { .. } => "UserBanned",
            Self::MessageForwarded { .. } => "MessageForwarded",
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    GroupLifecycle,
    Membership,
    Moderation,
    Traffic,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Groups to include. Empty means all groups.
    pub groups: Vec<GroupId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            groups: Vec::new(),
        }
    }

    /// Create a filter for events of specific groups.
    #[must_use]
    pub fn from_groups(groups: Vec<GroupId>) -> Self {
        Self {
            topics: Vec::new(),
            groups,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChatEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let group_match = self.groups.is_empty() || self.groups.contains(&event.group_id());

        topic_match && group_match
    }
}
