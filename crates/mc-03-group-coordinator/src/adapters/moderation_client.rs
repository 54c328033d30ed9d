//! # Moderation Client
//!
//! [`ModerationGateway`] over the shared moderation inbox.
//!
//! Each group owns one private reply queue (released when the client drops).
//! Requests go out with the general request tag; the verdict comes back on
//! the private queue with the group reply tag and the request's correlation
//! id. Replies carrying another correlation id are stale and skipped.

use crate::ports::outbound::{GatewayError, ModerationGateway};
use async_trait::async_trait;
use shared_bus::{tags, QueueGuard, TagFilter, Transport};
use shared_types::entities::GroupId;
use shared_types::envelope::{Address, Envelope};
use shared_types::ipc::{ModerationRequest, ModerationVerdict};
use tracing::debug;

/// Capacity of each private reply queue.
pub const REPLY_QUEUE_CAPACITY: usize = 8;

pub struct QueueModerationClient {
    group_id: GroupId,
    transport: Transport,
    inbox_address: Address,
    replies: QueueGuard<Envelope>,
}

impl QueueModerationClient {
    /// Allocate the group's private reply queue.
    ///
    /// The inbox is looked up per request, so it may be opened later.
    #[must_use]
    pub fn connect(group_id: GroupId, transport: Transport, inbox_address: Address) -> Self {
        let replies = transport.create_private_queue(REPLY_QUEUE_CAPACITY);
        debug!(
            group = %group_id,
            reply_queue = %replies.address(),
            "[mc-03] Private reply queue allocated"
        );
        Self {
            group_id,
            transport,
            inbox_address,
            replies,
        }
    }

    #[must_use]
    pub fn reply_address(&self) -> Address {
        self.replies.address()
    }
}

#[async_trait]
impl ModerationGateway for QueueModerationClient {
    async fn moderate(&self, request: ModerationRequest) -> Result<ModerationVerdict, GatewayError> {
        let inbox = self.transport.lookup_queue::<Envelope>(self.inbox_address)?;
        let envelope = Envelope::request(&request, self.replies.address())?;
        let correlation_id = envelope.correlation_id;

        inbox
            .send(tags::MODERATION_REQUEST, envelope)
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let reply_tag = tags::group_reply(self.group_id);
        loop {
            let record = tokio::select! {
                biased;
                received = self.replies.recv(TagFilter::Exact(reply_tag)) => {
                    received.map_err(|_| GatewayError::ReplyQueueClosed)?
                }
                () = inbox.closed() => {
                    return Err(GatewayError::Unavailable(format!(
                        "moderation inbox {} destroyed",
                        self.inbox_address
                    )));
                }
            };

            if record.payload.correlation_id != correlation_id {
                debug!(
                    group = %self.group_id,
                    expected = %correlation_id,
                    got = %record.payload.correlation_id,
                    "[mc-03] Dropping stale verdict"
                );
                continue;
            }
            return Ok(record.payload.decode_verdict()?);
        }
    }
}
