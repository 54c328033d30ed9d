//! # End-to-End Pipeline
//!
//! Several coordinators, the moderation server, the validation monitor and
//! the application tier's aggregation all running together.
//!
//! ```text
//! feeds ─→ GroupCoordinator × N ─→ ModerationServer
//!               │          └─events─→ ValidationMonitor
//!               └─reports─→ ApplicationTier::aggregate ─→ RunSummary
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use crate::integration::harness::{Pipeline, COORDINATION, MODERATION};
    use chat_runtime::wiring::GroupTask;
    use chat_runtime::{AggregationConfig, AggregationEnd, ApplicationTier, ValidationMonitor};
    use mc_01_user_feed::{FeedHandle, FeedOutcome};
    use mc_03_group_coordinator::{
        CoordinatorConfig, GroupCoordinator, NoOpValidationSink, QueueModerationClient,
        QueueReportSink,
    };
    use shared_types::entities::{GroupId, UserId};
    use shared_types::ipc::{GroupTerminationReport, TerminationStatus};

    fn task(group: u32, handle: JoinHandle<GroupTerminationReport>) -> GroupTask {
        GroupTask {
            group_id: GroupId(group),
            handle,
        }
    }

    #[tokio::test]
    async fn test_three_groups_aggregate_with_monitor() {
        let pipeline = Pipeline::start(&["bad", "worse"], 2);
        let (stop_tx, stop_rx) = shared_bus::shutdown_channel();
        let monitor = tokio::spawn(ValidationMonitor::new(pipeline.subscribe()).run(stop_rx));

        // The largest group is spawned first so reports arrive out of order.
        let tasks = vec![
            task(
                3,
                pipeline.spawn_group(
                    3,
                    vec![
                        vec![(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")],
                        vec![(1, "bad worse"), (9, "never sent")],
                        vec![(6, "f")],
                    ],
                ),
            ),
            task(1, pipeline.spawn_group(1, vec![vec![(1, "hello")]])),
            task(
                2,
                pipeline.spawn_group(2, vec![vec![(1, "bad")], vec![(2, "worse")]]),
            ),
        ];

        let tier = ApplicationTier::new(AggregationConfig {
            report_timeout: Duration::from_secs(5),
            tick: Duration::from_millis(20),
        });
        let mut shutdown = pipeline.shutdown_rx.clone();
        let summary = tier
            .aggregate(&pipeline.coordination, &tasks, &mut shutdown)
            .await;

        assert_eq!(summary.end, AggregationEnd::AllReported);
        assert!(summary.is_complete());
        assert_eq!(summary.groups_created, 3);
        assert_eq!(summary.groups_terminated, 3);
        assert_eq!(summary.users_created, 6);
        assert_eq!(summary.users_banned, 1);
        // 5 + 1 + 1 from group 3, 1 from group 1, 2 from group 2
        assert_eq!(summary.messages_relayed, 10);

        stop_tx.send_replace(true);
        let tally = timeout(Duration::from_secs(2), monitor).await.unwrap().unwrap();
        assert_eq!(tally.groups_created, 3);
        assert_eq!(tally.groups_terminated, 3);
        assert_eq!(tally.users_joined, 6);
        assert_eq!(tally.users_banned, 1);
        assert_eq!(tally.messages_forwarded, 10);
    }

    #[tokio::test]
    async fn test_stalled_group_reported_missing_after_timeout() {
        let pipeline = Pipeline::start(&["bad"], 1);

        // A user that never writes and never closes its feed.
        let (_sender, receiver) = mpsc::channel(1);
        let stalled = FeedHandle {
            user_id: UserId(0),
            receiver,
            task: tokio::spawn(std::future::pending::<FeedOutcome>()),
        };
        let coordinator = GroupCoordinator::new(
            GroupId(8),
            CoordinatorConfig::default(),
            QueueModerationClient::connect(GroupId(8), pipeline.transport.clone(), MODERATION),
            Arc::new(NoOpValidationSink),
            Arc::new(QueueReportSink::new(pipeline.transport.clone(), COORDINATION)),
        );
        let tasks = vec![
            task(8, tokio::spawn(coordinator.run(vec![stalled], pipeline.shutdown_rx.clone()))),
            task(4, pipeline.spawn_group(4, vec![vec![(1, "fine")]])),
        ];

        let tier = ApplicationTier::new(AggregationConfig {
            report_timeout: Duration::from_millis(300),
            tick: Duration::from_millis(20),
        });
        let mut shutdown = pipeline.shutdown_rx.clone();
        let summary = tier
            .aggregate(&pipeline.coordination, &tasks, &mut shutdown)
            .await;

        assert_eq!(summary.end, AggregationEnd::Timeout);
        assert_eq!(summary.groups_terminated, 1);
        assert_eq!(summary.missing_groups, vec![GroupId(8)]);
        assert!(!summary.is_complete());

        // Shutdown releases the stalled coordinator with a Cancelled report.
        pipeline.shutdown_tx.send_replace(true);
        let stalled_task = tasks.into_iter().next().unwrap();
        let report = timeout(Duration::from_secs(3), stalled_task.handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.status, TerminationStatus::Cancelled);
    }
}
