//! # Routing Tags
//!
//! Tag values used on the moderation and coordination queues.

use crate::queue::Tag;
use shared_types::entities::GroupId;

/// Tag of every request on the moderation inbox.
pub const MODERATION_REQUEST: Tag = Tag(1);

/// Tag of termination reports on the group-coordination queue.
pub const TERMINATION_REPORT: Tag = Tag(1);

/// Offset added to the group id to form its reply tag.
pub const GROUP_REPLY_BASE: u64 = 30;

/// Reply tag of a group: `30 + group id`.
#[must_use]
pub fn group_reply(group_id: GroupId) -> Tag {
    Tag(GROUP_REPLY_BASE + u64::from(group_id.0))
}
