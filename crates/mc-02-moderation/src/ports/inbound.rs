//! # Inbound Ports (Driving Ports / API)

use shared_types::entities::{GroupId, UserId};
use shared_types::ipc::{ModerationRequest, ModerationVerdict};

/// Moderation decision API.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait ModerationApi: Send + Sync {
    /// Count violations in the request, update the table and decide.
    fn moderate(&self, request: &ModerationRequest) -> ModerationVerdict;

    /// Cumulative violations recorded for a user.
    fn violations(&self, group: GroupId, user: UserId) -> u32;

    /// Requests handled since start.
    fn requests_processed(&self) -> u64;
}
