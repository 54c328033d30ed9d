//! Spawning one coordinator task per group.

use crate::container::channels::ChannelContainer;
use crate::container::config::{GroupPlan, RunConfig};
use mc_01_user_feed::{spawn_feed, FeedConfig, FeedHandle, FileFeed};
use mc_03_group_coordinator::{
    BusValidationSink, GroupCoordinator, QueueModerationClient, QueueReportSink,
};
use shared_bus::{InMemoryEventBus, ShutdownReceiver};
use shared_types::entities::{GroupId, UserId};
use shared_types::ipc::GroupTerminationReport;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A running coordinator.
pub struct GroupTask {
    pub group_id: GroupId,
    pub handle: JoinHandle<GroupTerminationReport>,
}

/// Start one producer per user file, user ids in file order.
///
/// A file that cannot be opened yields a user whose feed is already over.
pub async fn open_feeds(plan: &GroupPlan, config: &FeedConfig) -> Vec<FeedHandle> {
    let mut feeds = Vec::with_capacity(plan.user_files.len());
    for (position, path) in plan.user_files.iter().enumerate() {
        let user_id = UserId(u32::try_from(position).unwrap_or(u32::MAX));
        match FileFeed::open(path, plan.group_id, user_id).await {
            Ok(feed) => feeds.push(spawn_feed(feed, config)),
            Err(e) => {
                error!(
                    group = %plan.group_id,
                    user = %user_id,
                    error = %e,
                    "Cannot open user feed, user ends immediately"
                );
                feeds.push(FeedHandle::from_messages(user_id, Vec::new()));
            }
        }
    }
    feeds
}

/// Wire and spawn the coordinator for `plan`.
pub async fn spawn_group(
    plan: &GroupPlan,
    config: &RunConfig,
    channels: &ChannelContainer,
    shutdown: ShutdownReceiver,
) -> GroupTask {
    let feeds = open_feeds(plan, &config.feed).await;

    let gateway = QueueModerationClient::connect(
        plan.group_id,
        channels.transport.clone(),
        config.moderation_address,
    );
    let validation: Arc<BusValidationSink<InMemoryEventBus>> =
        Arc::new(BusValidationSink::new(Arc::clone(&channels.event_bus)));
    let reports = Arc::new(QueueReportSink::new(
        channels.transport.clone(),
        config.coordination_address,
    ));

    let coordinator = GroupCoordinator::new(
        plan.group_id,
        config.coordinator,
        gateway,
        validation,
        reports,
    );
    info!(group = %plan.group_id, users = feeds.len(), "Spawning group coordinator");
    GroupTask {
        group_id: plan.group_id,
        handle: tokio::spawn(coordinator.run(feeds, shutdown)),
    }
}
