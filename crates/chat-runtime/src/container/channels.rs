//! Channels owned by the application tier.
//!
//! Provisioned once per run at the configured addresses and destroyed by
//! [`ChannelContainer::release`] when the run ends.

use crate::container::config::RunConfig;
use shared_bus::{
    InMemoryEventBus, MessageQueue, Transport, TransportError, DEFAULT_CHANNEL_CAPACITY,
    DEFAULT_QUEUE_CAPACITY,
};
use shared_types::envelope::Envelope;
use shared_types::ipc::GroupTerminationReport;
use std::sync::Arc;
use tracing::info;

pub struct ChannelContainer {
    pub transport: Transport,
    /// Validation channel.
    pub event_bus: Arc<InMemoryEventBus>,
    /// Shared moderation inbox.
    pub moderation_inbox: Arc<MessageQueue<Envelope>>,
    /// Group-coordination queue carrying termination reports.
    pub coordination: Arc<MessageQueue<GroupTerminationReport>>,
}

impl ChannelContainer {
    pub fn provision(config: &RunConfig) -> Result<Self, TransportError> {
        let transport = Transport::new();
        let event_bus =
            transport.open_event_bus(config.validation_address, DEFAULT_CHANNEL_CAPACITY)?;
        let moderation_inbox =
            transport.open_queue::<Envelope>(config.moderation_address, DEFAULT_QUEUE_CAPACITY)?;
        let coordination = transport.open_queue::<GroupTerminationReport>(
            config.coordination_address,
            config.group_count.max(DEFAULT_QUEUE_CAPACITY),
        )?;
        info!(
            validation = %config.validation_address,
            coordination = %config.coordination_address,
            moderation = %config.moderation_address,
            "Channels provisioned"
        );
        Ok(Self {
            transport,
            event_bus,
            moderation_inbox,
            coordination,
        })
    }

    /// Destroy every channel in the registry, private reply queues included.
    pub fn release(&self) -> usize {
        let released = self.transport.remove_all();
        info!(released, "Channels released");
        released
    }
}
