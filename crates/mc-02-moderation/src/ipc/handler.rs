//! Inbox server for the moderation service.
//!
//! Consumes request envelopes in arrival order from the shared inbox and
//! answers on the reply queue named in each envelope, tagged for the
//! requesting group. One request is handled at a time, so verdicts are
//! serialized across all groups.

use crate::ports::inbound::ModerationApi;
use shared_bus::{shutdown_requested, tags, MessageQueue, ShutdownReceiver, TagFilter, Transport};
use shared_types::envelope::Envelope;
use shared_types::ipc::ModerationVerdict;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why the server loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStop {
    Shutdown,
    InboxDestroyed,
}

/// Counters reported when the server stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReport {
    pub requests_received: u64,
    pub replies_sent: u64,
    pub replies_dropped: u64,
    pub stop: ServerStop,
}

pub struct ModerationServer<S: ModerationApi> {
    service: Arc<S>,
    inbox: Arc<MessageQueue<Envelope>>,
    transport: Transport,
}

impl<S: ModerationApi> ModerationServer<S> {
    pub fn new(service: Arc<S>, inbox: Arc<MessageQueue<Envelope>>, transport: Transport) -> Self {
        Self {
            service,
            inbox,
            transport,
        }
    }

    /// Decode one request and build the verdict envelope answering it.
    ///
    /// Undecodable requests are answered with Allow, user 0, count 0,
    /// addressed to the envelope's sender group.
    pub fn handle(&self, envelope: &Envelope) -> ModerationVerdict {
        match envelope.decode_request() {
            Ok(request) => self.service.moderate(&request),
            Err(e) => {
                warn!(
                    sender = %envelope.sender,
                    correlation_id = %envelope.correlation_id,
                    error = %e,
                    "[mc-02] Undecodable request, answering Allow"
                );
                ModerationVerdict::fallback_allow(envelope.sender)
            }
        }
    }

    /// Serve until shutdown or until the inbox is destroyed.
    pub async fn run(self, mut shutdown: ShutdownReceiver) -> ServerReport {
        info!(inbox = %self.inbox.address(), "[mc-02] Moderation server started");
        let mut report = ServerReport {
            requests_received: 0,
            replies_sent: 0,
            replies_dropped: 0,
            stop: ServerStop::Shutdown,
        };

        loop {
            let received = tokio::select! {
                received = self.inbox.recv(TagFilter::Exact(tags::MODERATION_REQUEST)) => received,
                _ = shutdown_requested(&mut shutdown) => {
                    info!("[mc-02] Shutdown signal received");
                    report.stop = ServerStop::Shutdown;
                    break;
                }
            };

            let envelope = match received {
                Ok(tagged) => tagged.payload,
                Err(e) => {
                    info!(error = %e, "[mc-02] Inbox closed");
                    report.stop = ServerStop::InboxDestroyed;
                    break;
                }
            };

            report.requests_received += 1;
            if self.reply(&envelope) {
                report.replies_sent += 1;
            } else {
                report.replies_dropped += 1;
            }
        }

        info!(
            received = report.requests_received,
            sent = report.replies_sent,
            dropped = report.replies_dropped,
            processed = self.service.requests_processed(),
            "[mc-02] Moderation server stopped"
        );
        report
    }

    /// Moderate and deliver. Returns `false` when the verdict was dropped.
    fn reply(&self, envelope: &Envelope) -> bool {
        let verdict = self.handle(envelope);

        let Some(reply_to) = envelope.reply_to else {
            warn!(sender = %envelope.sender, "[mc-02] Request without reply address, verdict dropped");
            return false;
        };

        let reply = match Envelope::verdict(&verdict, envelope.correlation_id) {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "[mc-02] Failed to encode verdict");
                return false;
            }
        };

        let queue = match self.transport.lookup_queue::<Envelope>(reply_to) {
            Ok(queue) => queue,
            Err(e) => {
                warn!(
                    reply_to = %reply_to,
                    group = %verdict.group_id,
                    error = %e,
                    "[mc-02] Reply queue gone, verdict dropped"
                );
                return false;
            }
        };

        match queue.try_send(tags::group_reply(verdict.group_id), reply) {
            Ok(()) => {
                debug!(
                    group = %verdict.group_id,
                    user = %verdict.user_id,
                    action = ?verdict.action,
                    "[mc-02] Verdict sent"
                );
                true
            }
            Err(e) => {
                warn!(
                    reply_to = %reply_to,
                    group = %verdict.group_id,
                    error = %e,
                    "[mc-02] Verdict not delivered"
                );
                false
            }
        }
    }
}
