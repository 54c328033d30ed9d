//! Shared fixtures: an in-process pipeline with the real moderation server,
//! queue-backed gateways and the validation bus.

use std::sync::Arc;

use mc_01_user_feed::FeedHandle;
use mc_02_moderation::{BanPolicy, ModerationServer, ModerationService, ServerReport, WordFilter};
use mc_03_group_coordinator::{
    BusValidationSink, CoordinatorConfig, GroupCoordinator, QueueModerationClient, QueueReportSink,
};
use shared_bus::{
    shutdown_channel, EventFilter, InMemoryEventBus, MessageQueue, ShutdownReceiver, Subscription,
    Transport,
};
use shared_types::entities::{ChatMessage, GroupId, UserId};
use shared_types::envelope::{Address, Envelope};
use shared_types::ipc::GroupTerminationReport;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const VALIDATION: Address = Address(1001);
pub const COORDINATION: Address = Address(1002);
pub const MODERATION: Address = Address(1003);

pub struct Pipeline {
    pub transport: Transport,
    pub bus: Arc<InMemoryEventBus>,
    pub inbox: Arc<MessageQueue<Envelope>>,
    pub coordination: Arc<MessageQueue<GroupTerminationReport>>,
    pub service: Arc<ModerationService>,
    pub server: JoinHandle<ServerReport>,
    pub shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: ShutdownReceiver,
}

impl Pipeline {
    pub fn start(words: &[&str], threshold: u32) -> Self {
        let transport = Transport::new();
        let bus = transport.open_event_bus(VALIDATION, 1000).unwrap();
        let inbox = transport.open_queue::<Envelope>(MODERATION, 64).unwrap();
        let coordination = transport
            .open_queue::<GroupTerminationReport>(COORDINATION, 64)
            .unwrap();
        let service = Arc::new(ModerationService::new(
            WordFilter::new(words.iter().copied()).unwrap(),
            BanPolicy::new(threshold).unwrap(),
        ));
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        let server = tokio::spawn(
            ModerationServer::new(Arc::clone(&service), Arc::clone(&inbox), transport.clone())
                .run(shutdown_rx.clone()),
        );
        Self {
            transport,
            bus,
            inbox,
            coordination,
            service,
            server,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe(EventFilter::all())
    }

    /// Spawn a coordinator whose users replay `users` in user-id order.
    pub fn spawn_group(
        &self,
        group: u32,
        users: Vec<Vec<(i64, &str)>>,
    ) -> JoinHandle<GroupTerminationReport> {
        let group_id = GroupId(group);
        let feeds = users
            .into_iter()
            .enumerate()
            .map(|(user, lines)| prefilled_feed(group_id, user as u32, &lines))
            .collect();
        let coordinator = GroupCoordinator::new(
            group_id,
            CoordinatorConfig::default(),
            QueueModerationClient::connect(group_id, self.transport.clone(), MODERATION),
            Arc::new(BusValidationSink::new(Arc::clone(&self.bus))),
            Arc::new(QueueReportSink::new(self.transport.clone(), COORDINATION)),
        );
        tokio::spawn(coordinator.run(feeds, self.shutdown_rx.clone()))
    }
}

pub fn prefilled_feed(group: GroupId, user: u32, lines: &[(i64, &str)]) -> FeedHandle {
    let messages = lines
        .iter()
        .map(|(ts, text)| ChatMessage::new(*ts, group, UserId(user), *text).unwrap())
        .collect();
    FeedHandle::from_messages(UserId(user), messages)
}
