//! # Chat Runtime
//!
//! Owns one run from channel provisioning to release.
//!
//! ## Startup Sequence
//!
//! 1. Provision the validation, coordination and moderation channels
//! 2. Start the moderation server and the validation monitor
//! 3. Spawn one coordinator per group
//! 4. Aggregate termination reports
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to the coordinators and wait for them (bounded)
//! 2. Absorb reports they sent on the way out
//! 3. Stop the moderation server and the monitor
//! 4. Release every channel

use crate::app::{ApplicationTier, RunSummary};
use crate::container::{ChannelContainer, RunConfig};
use crate::handlers::ValidationMonitor;
use crate::wiring::{spawn_group, GroupTask};
use crate::RuntimeError;
use mc_02_moderation::ModerationServer;
use shared_bus::{shutdown_channel, EventFilter, ShutdownReceiver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

/// Bound on waiting for the server and monitor once they are told to stop.
const SERVICE_STOP_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ChatRuntime {
    config: RunConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: ShutdownReceiver,
}

impl ChatRuntime {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        Self {
            config,
            shutdown_tx,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Ask every coordinator and the aggregation to stop.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Execute the run and return its summary.
    pub async fn run(&self) -> Result<RunSummary, RuntimeError> {
        let channels = ChannelContainer::provision(&self.config)?;
        let service = Arc::new(self.config.moderation_service()?);

        let (stop_tx, stop_rx) = shutdown_channel();
        let server = ModerationServer::new(
            Arc::clone(&service),
            Arc::clone(&channels.moderation_inbox),
            channels.transport.clone(),
        );
        let server_task = tokio::spawn(server.run(stop_rx.clone()));
        let monitor = ValidationMonitor::new(channels.event_bus.subscribe(EventFilter::all()));
        let monitor_task = tokio::spawn(monitor.run(stop_rx));

        let mut tasks = Vec::with_capacity(self.config.groups.len());
        for plan in &self.config.groups {
            tasks.push(spawn_group(plan, &self.config, &channels, self.shutdown_rx.clone()).await);
        }
        info!(groups = tasks.len(), "All group coordinators spawned");

        let tier = ApplicationTier::new(self.config.aggregation);
        let mut shutdown = self.shutdown_rx.clone();
        let mut summary = tier
            .aggregate(&channels.coordination, &tasks, &mut shutdown)
            .await;

        self.shutdown();
        self.join_coordinators(tasks).await;
        let late = tier.collect_late(&channels.coordination, &mut summary);
        if late > 0 {
            info!(late, "Collected reports sent after aggregation ended");
        }

        stop_tx.send_replace(true);
        match timeout(SERVICE_STOP_TIMEOUT, server_task).await {
            Ok(Ok(report)) => info!(
                received = report.requests_received,
                replied = report.replies_sent,
                dropped = report.replies_dropped,
                "[mc-02] Moderation server stopped"
            ),
            Ok(Err(e)) => warn!(error = %e, "Moderation server task failed"),
            Err(_) => warn!("Moderation server did not stop in time"),
        }
        match timeout(SERVICE_STOP_TIMEOUT, monitor_task).await {
            Ok(Ok(tally)) => info!(
                groups_created = tally.groups_created,
                users_joined = tally.users_joined,
                messages_forwarded = tally.messages_forwarded,
                users_banned = tally.users_banned,
                "[validation] Monitor stopped"
            ),
            Ok(Err(e)) => warn!(error = %e, "Validation monitor task failed"),
            Err(_) => warn!("Validation monitor did not stop in time"),
        }

        channels.release();
        Ok(summary)
    }

    /// Coordinators still running were told to stop; give them the feed
    /// grace period twice over, then abort.
    async fn join_coordinators(&self, tasks: Vec<GroupTask>) {
        let grace = self.config.coordinator.feed_grace * 2;
        for mut task in tasks {
            if timeout(grace, &mut task.handle).await.is_err() {
                warn!(group = %task.group_id, "Coordinator did not stop in time, aborting");
                task.handle.abort();
            }
        }
    }
}
