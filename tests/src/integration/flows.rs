//! # Integration Test Flows
//!
//! Coordinators, the moderation server and the validation bus talking over
//! the shared transport.
//!
//! ## Flows Tested
//!
//! 1. **Coordinator → Moderation inbox → Reply queue**: verdicts routed per group
//! 2. **Coordinator → Validation bus**: lifecycle events in order
//! 3. **Coordinator → Coordination queue**: one report per group
//! 4. **Failure paths**: destroyed inbox, undecodable requests

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::integration::harness::{Pipeline, MODERATION};
    use mc_02_moderation::{ModerationApi, ServerStop};
    use shared_bus::{tags, ChatEvent, TagFilter};
    use shared_types::entities::{GroupId, ModerationAction, UserId};
    use shared_types::envelope::{Envelope, MessageKind};
    use shared_types::ipc::TerminationStatus;
    use uuid::Uuid;

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_two_user_scenario_over_inbox() {
        let pipeline = Pipeline::start(&["bad"], 2);
        let mut events = pipeline.subscribe();

        let group = pipeline.spawn_group(
            1,
            vec![
                vec![(1, "hi"), (3, "this is bad"), (5, "still bad")],
                vec![(2, "hello")],
            ],
        );
        let report = timeout(Duration::from_secs(2), group).await.unwrap().unwrap();

        assert_eq!(report.status, TerminationStatus::Completed);
        assert_eq!(report.banned_user_count, 1);
        assert_eq!(report.users_joined, 2);

        let mut forwarded = Vec::new();
        let mut banned = Vec::new();
        while let Ok(Some(event)) = events.try_recv() {
            match event {
                ChatEvent::MessageForwarded { user_id, text, .. } => forwarded.push((user_id, text)),
                ChatEvent::UserBanned { user_id, violations, .. } => banned.push((user_id, violations)),
                _ => {}
            }
        }
        assert_eq!(
            forwarded,
            vec![
                (UserId(0), "hi".to_string()),
                (UserId(1), "hello".to_string()),
                (UserId(0), "this is bad".to_string()),
                (UserId(0), "still bad".to_string()),
            ]
        );
        assert_eq!(banned, vec![(UserId(0), 2)]);

        let queued = pipeline
            .coordination
            .try_recv(TagFilter::Exact(tags::TERMINATION_REPORT))
            .unwrap()
            .unwrap();
        assert_eq!(queued.payload, report);
    }

    #[tokio::test]
    async fn test_concurrent_groups_keep_separate_counts() {
        let pipeline = Pipeline::start(&["spam"], 2);

        // Same user id in both groups, one violation each
        let a = pipeline.spawn_group(1, vec![vec![(1, "spam")]]);
        let b = pipeline.spawn_group(2, vec![vec![(1, "spam")]]);
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap().banned_user_count, 0);
        assert_eq!(b.unwrap().banned_user_count, 0);
        assert_eq!(pipeline.service.violations(GroupId(1), UserId(0)), 1);
        assert_eq!(pipeline.service.violations(GroupId(2), UserId(0)), 1);
        assert_eq!(pipeline.coordination.len(), 2);
    }

    // =========================================================================
    // FAILURE PATHS
    // =========================================================================

    #[tokio::test]
    async fn test_destroyed_inbox_reports_unavailable() {
        let pipeline = Pipeline::start(&["bad"], 2);
        assert!(pipeline.transport.remove(MODERATION));

        let group = pipeline.spawn_group(3, vec![vec![(1, "hello")], vec![(2, "there")]]);
        let report = timeout(Duration::from_secs(2), group).await.unwrap().unwrap();
        assert_eq!(report.status, TerminationStatus::ModerationUnavailable);
        assert!(!report.is_completed());

        let server = timeout(Duration::from_secs(1), pipeline.server).await.unwrap().unwrap();
        assert_eq!(server.stop, ServerStop::InboxDestroyed);
    }

    #[tokio::test]
    async fn test_undecodable_request_answered_with_allow() {
        let pipeline = Pipeline::start(&["bad"], 1);
        let replies = pipeline.transport.create_private_queue::<Envelope>(4);

        let garbage = Envelope {
            version: Envelope::CURRENT_VERSION,
            kind: MessageKind::ModerationRequest,
            sender: GroupId(6),
            correlation_id: Uuid::new_v4(),
            reply_to: Some(replies.address()),
            payload: vec![0xff, 0x01],
        };
        let correlation_id = garbage.correlation_id;
        pipeline
            .inbox
            .send(tags::MODERATION_REQUEST, garbage)
            .await
            .unwrap();

        let reply = timeout(
            Duration::from_secs(1),
            replies.recv(TagFilter::Exact(tags::group_reply(GroupId(6)))),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(reply.payload.correlation_id, correlation_id);

        let verdict = reply.payload.decode_verdict().unwrap();
        assert_eq!(verdict.action, ModerationAction::Allow);
        assert_eq!(verdict.user_id, UserId(0));
        assert_eq!(verdict.violation_count, 0);
        assert_eq!(verdict.group_id, GroupId(6));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_running_groups() {
        let pipeline = Pipeline::start(&["bad"], 2);

        // Keep the producer alive so the group never completes on its own
        let (keep, receiver) = tokio::sync::mpsc::channel(1);
        let feed = mc_01_user_feed::FeedHandle {
            user_id: UserId(0),
            receiver,
            task: tokio::spawn(async move {
                let _keep = keep;
                std::future::pending::<mc_01_user_feed::FeedOutcome>().await
            }),
        };
        let coordinator = mc_03_group_coordinator::GroupCoordinator::new(
            GroupId(8),
            mc_03_group_coordinator::CoordinatorConfig {
                poll_interval: Duration::from_millis(5),
                feed_grace: Duration::from_millis(20),
            },
            mc_03_group_coordinator::QueueModerationClient::connect(
                GroupId(8),
                pipeline.transport.clone(),
                MODERATION,
            ),
            std::sync::Arc::new(mc_03_group_coordinator::NoOpValidationSink),
            std::sync::Arc::new(mc_03_group_coordinator::QueueReportSink::new(
                pipeline.transport.clone(),
                crate::integration::harness::COORDINATION,
            )),
        );
        let group = tokio::spawn(coordinator.run(vec![feed], pipeline.shutdown_rx.clone()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        pipeline.shutdown_tx.send(true).unwrap();

        let report = timeout(Duration::from_secs(1), group).await.unwrap().unwrap();
        assert_eq!(report.status, TerminationStatus::Cancelled);

        let server = timeout(Duration::from_secs(1), pipeline.server).await.unwrap().unwrap();
        assert_eq!(server.stop, ServerStop::Shutdown);
    }
}
