//! # Validation Monitor
//!
//! Listens on the validation channel, writes one `EVENT_FLOW_JSON` line per
//! event and keeps running totals. Nothing waits on it: publishers never
//! block when it is slow or gone.

use serde::Serialize;
use shared_bus::{shutdown_requested, ChatEvent, ShutdownReceiver, Subscription};
use tracing::{debug, info, warn};

/// Totals observed on the validation channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationTally {
    pub groups_created: u64,
    pub groups_terminated: u64,
    pub users_joined: u64,
    pub users_banned: u64,
    pub messages_forwarded: u64,
}

impl ValidationTally {
    pub fn record(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::GroupCreated { .. } => self.groups_created += 1,
            ChatEvent::GroupTerminated { .. } => self.groups_terminated += 1,
            ChatEvent::UserJoined { .. } => self.users_joined += 1,
            ChatEvent::UserBanned { .. } => self.users_banned += 1,
            ChatEvent::MessageForwarded { .. } => self.messages_forwarded += 1,
        }
    }
}

pub struct ValidationMonitor {
    subscription: Subscription,
    tally: ValidationTally,
}

impl ValidationMonitor {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            tally: ValidationTally::default(),
        }
    }

    /// Run until the channel is destroyed or shutdown is requested.
    ///
    /// On shutdown, events already buffered are still counted.
    pub async fn run(mut self, mut shutdown: ShutdownReceiver) -> ValidationTally {
        info!("[validation] Monitor started");
        loop {
            let next = tokio::select! {
                event = self.subscription.recv() => Some(event),
                () = shutdown_requested(&mut shutdown) => None,
            };
            match next {
                Some(Some(event)) => self.observe(&event),
                Some(None) => {
                    info!("[validation] Channel closed, exiting");
                    break;
                }
                None => {
                    while let Ok(Some(event)) = self.subscription.try_recv() {
                        self.observe(&event);
                    }
                    info!("[validation] Shutdown signal received");
                    break;
                }
            }
        }

        let lagged = self.subscription.lagged();
        if lagged > 0 {
            warn!(lagged, "[validation] Monitor fell behind, events were skipped");
        }
        self.tally
    }

    fn observe(&mut self, event: &ChatEvent) {
        self.tally.record(event);

        if let ChatEvent::MessageForwarded {
            group_id,
            user_id,
            timestamp,
            text,
        } = event
        {
            debug!(
                group = %group_id,
                user = %user_id,
                timestamp,
                text = %text,
                "[validation] Message forwarded"
            );
        }

        info!(
            "EVENT_FLOW_JSON {}",
            serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
                "subsystem_id": "validation",
                "event_type": event.name(),
                "group_id": event.group_id().0,
                "event": serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
            })
        );
    }
}
