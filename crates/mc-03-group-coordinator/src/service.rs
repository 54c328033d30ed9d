//! # Group Coordinator Service
//!
//! Drives one group from its first message to its termination report.
//!
//! ```text
//! feeds ──→ FeedMultiplexer ──→ GroupState::next_message ──→ ModerationGateway
//!                                        ▲                          │
//!                                        └──── apply_verdict ◄──────┘
//! ```
//!
//! The loop waits at two points: the bounded refill window and the verdict.
//! Both also watch the shutdown signal.

use crate::domain::group::{GroupState, VerdictOutcome};
use crate::multiplexer::FeedMultiplexer;
use crate::ports::outbound::{ModerationGateway, ReportSink, ValidationSink};
use mc_01_user_feed::{FeedHandle, FeedOutcome};
use shared_bus::{shutdown_requested, ChatEvent, ShutdownReceiver};
use shared_types::entities::{GroupId, UserId};
use shared_types::ipc::{GroupTerminationReport, ModerationRequest, TerminationStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

/// Timing knobs for one coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Longest wait for an empty slot before emitting from the filled ones.
    pub poll_interval: Duration,
    /// How long feed tasks get to stop once the group is draining.
    pub feed_grace: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            feed_grace: Duration::from_millis(500),
        }
    }
}

pub struct GroupCoordinator<G, V, R>
where
    G: ModerationGateway,
    V: ValidationSink,
    R: ReportSink,
{
    group_id: GroupId,
    config: CoordinatorConfig,
    gateway: G,
    validation: Arc<V>,
    reports: Arc<R>,
}

impl<G, V, R> GroupCoordinator<G, V, R>
where
    G: ModerationGateway,
    V: ValidationSink,
    R: ReportSink,
{
    pub fn new(
        group_id: GroupId,
        config: CoordinatorConfig,
        gateway: G,
        validation: Arc<V>,
        reports: Arc<R>,
    ) -> Self {
        Self {
            group_id,
            config,
            gateway,
            validation,
            reports,
        }
    }

    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Run the group to termination and return the report it submitted.
    ///
    /// The report is returned even when submitting it failed.
    pub async fn run(
        self,
        feeds: Vec<FeedHandle>,
        mut shutdown: ShutdownReceiver,
    ) -> GroupTerminationReport {
        let users: Vec<UserId> = feeds.iter().map(|f| f.user_id).collect();
        let mut state = GroupState::new(self.group_id, users.iter().copied());

        let mut receivers = Vec::with_capacity(feeds.len());
        let mut tasks = Vec::with_capacity(feeds.len());
        for handle in feeds {
            receivers.push(handle.receiver);
            tasks.push(handle.task);
        }
        let mut mux = FeedMultiplexer::new(receivers);

        info!(group = %self.group_id, users = users.len(), "[mc-03] Group started");
        self.validation
            .notify(ChatEvent::GroupCreated {
                group_id: self.group_id,
            })
            .await;
        for user_id in users {
            self.validation
                .notify(ChatEvent::UserJoined {
                    group_id: self.group_id,
                    user_id,
                })
                .await;
        }

        let status = self.merge(&mut state, &mut mux, &mut shutdown).await;

        state.begin_draining();
        mux.detach_all();
        self.drain_feeds(tasks).await;

        let report = state
            .terminate(status)
            .unwrap_or_else(|| state.snapshot(status));
        info!(
            group = %self.group_id,
            status = ?report.status,
            banned = report.banned_user_count,
            forwarded = report.messages_forwarded,
            "[mc-03] Group terminated"
        );
        self.validation
            .notify(ChatEvent::GroupTerminated {
                group_id: self.group_id,
                banned_users: report.banned_user_count,
                status: report.status,
            })
            .await;
        if let Err(e) = self.reports.submit(report.clone()).await {
            error!(group = %self.group_id, error = %e, "[mc-03] Failed to submit termination report");
        }
        report
    }

    async fn merge(
        &self,
        state: &mut GroupState,
        mux: &mut FeedMultiplexer,
        shutdown: &mut ShutdownReceiver,
    ) -> TerminationStatus {
        loop {
            if state.active_count() == 0 {
                return TerminationStatus::Completed;
            }

            tokio::select! {
                biased;
                () = shutdown_requested(shutdown) => {
                    info!(group = %self.group_id, "[mc-03] Shutdown signal received");
                    return TerminationStatus::Cancelled;
                }
                _ = mux.refill(state.streams_mut(), self.config.poll_interval) => {}
            }

            let Some((idx, message)) = state.next_message() else {
                continue;
            };
            let user_id = state.streams()[idx].user_id();
            let cumulative = state.streams()[idx].violations();

            debug!(
                group = %self.group_id,
                user = %user_id,
                timestamp = message.timestamp(),
                "[mc-03] Forwarding message"
            );
            self.validation
                .notify(ChatEvent::MessageForwarded {
                    group_id: self.group_id,
                    user_id,
                    timestamp: message.timestamp(),
                    text: message.text().to_string(),
                })
                .await;

            let mut request = ModerationRequest::for_message(&message, cumulative);
            request.group_id = self.group_id;
            request.user_id = user_id;

            let verdict = tokio::select! {
                biased;
                () = shutdown_requested(shutdown) => {
                    info!(group = %self.group_id, "[mc-03] Shutdown while awaiting verdict");
                    return TerminationStatus::Cancelled;
                }
                verdict = self.gateway.moderate(request) => verdict,
            };
            let verdict = match verdict {
                Ok(verdict) => verdict,
                Err(e) => {
                    error!(group = %self.group_id, error = %e, "[mc-03] Moderation unavailable");
                    return TerminationStatus::ModerationUnavailable;
                }
            };

            match state.apply_verdict(idx, &verdict) {
                VerdictOutcome::Banned => {
                    mux.detach(idx);
                    info!(
                        group = %self.group_id,
                        user = %user_id,
                        violations = verdict.violation_count,
                        "[mc-03] User banned"
                    );
                    self.validation
                        .notify(ChatEvent::UserBanned {
                            group_id: self.group_id,
                            user_id,
                            violations: verdict.violation_count,
                        })
                        .await;
                }
                VerdictOutcome::Allowed => {
                    debug!(
                        group = %self.group_id,
                        user = %user_id,
                        violations = verdict.violation_count,
                        "[mc-03] Message allowed"
                    );
                }
                VerdictOutcome::Ignored => {}
            }
        }
    }

    /// Wait for every feed task up to the grace period, then abort the rest.
    async fn drain_feeds(&self, tasks: Vec<JoinHandle<FeedOutcome>>) {
        let deadline = Instant::now() + self.config.feed_grace;
        for mut task in tasks {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(outcome)) => debug!(
                    group = %self.group_id,
                    user = %outcome.user_id,
                    sent = outcome.messages_sent,
                    end = ?outcome.end,
                    "[mc-03] Feed task stopped"
                ),
                Ok(Err(e)) => warn!(group = %self.group_id, error = %e, "[mc-03] Feed task failed"),
                Err(_) => {
                    task.abort();
                    warn!(group = %self.group_id, "[mc-03] Feed task exceeded grace period, aborted");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::validation::RecordingValidationSink;
    use crate::ports::outbound::GatewayError;
    use async_trait::async_trait;
    use mc_02_moderation::{BanPolicy, ModerationApi, ModerationService, WordFilter};
    use parking_lot::Mutex;
    use shared_bus::shutdown_channel;
    use shared_types::entities::ChatMessage;
    use shared_types::ipc::ModerationVerdict;
    use tokio::time::timeout;

    const GROUP: GroupId = GroupId(7);

    /// Calls the moderation service directly and records every request.
    struct LocalGateway {
        service: ModerationService,
        requests: Mutex<Vec<ModerationRequest>>,
    }

    impl LocalGateway {
        fn new(words: &[&str], threshold: u32) -> Self {
            Self {
                service: ModerationService::new(
                    WordFilter::new(words.iter().copied()).unwrap(),
                    BanPolicy::new(threshold).unwrap(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModerationGateway for LocalGateway {
        async fn moderate(
            &self,
            request: ModerationRequest,
        ) -> Result<ModerationVerdict, GatewayError> {
            self.requests.lock().push(request.clone());
            Ok(self.service.moderate(&request))
        }
    }

    struct UnavailableGateway;

    #[async_trait]
    impl ModerationGateway for UnavailableGateway {
        async fn moderate(&self, _: ModerationRequest) -> Result<ModerationVerdict, GatewayError> {
            Err(GatewayError::Unavailable("inbox destroyed".into()))
        }
    }

    struct SilentGateway;

    #[async_trait]
    impl ModerationGateway for SilentGateway {
        async fn moderate(&self, _: ModerationRequest) -> Result<ModerationVerdict, GatewayError> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingReports {
        reports: Mutex<Vec<GroupTerminationReport>>,
    }

    #[async_trait]
    impl ReportSink for RecordingReports {
        async fn submit(&self, report: GroupTerminationReport) -> Result<(), GatewayError> {
            self.reports.lock().push(report);
            Ok(())
        }
    }

    fn feed(user: u32, lines: &[(i64, &str)]) -> FeedHandle {
        let messages = lines
            .iter()
            .map(|(ts, text)| ChatMessage::new(*ts, GROUP, UserId(user), *text).unwrap())
            .collect();
        FeedHandle::from_messages(UserId(user), messages)
    }

    fn coordinator<G: ModerationGateway>(
        gateway: G,
    ) -> (
        GroupCoordinator<G, RecordingValidationSink, RecordingReports>,
        Arc<RecordingValidationSink>,
        Arc<RecordingReports>,
    ) {
        let validation = Arc::new(RecordingValidationSink::new());
        let reports = Arc::new(RecordingReports::default());
        let coordinator = GroupCoordinator::new(
            GROUP,
            CoordinatorConfig::default(),
            gateway,
            Arc::clone(&validation),
            Arc::clone(&reports),
        );
        (coordinator, validation, reports)
    }

    #[tokio::test]
    async fn test_two_user_scenario() {
        let gateway = Arc::new(LocalGateway::new(&["bad"], 2));
        let (coordinator, validation, reports) = coordinator(Arc::clone(&gateway));
        let (_tx, rx) = shutdown_channel();

        let feeds = vec![
            feed(0, &[(1, "hi"), (3, "this is bad"), (5, "still bad")]),
            feed(1, &[(2, "hello")]),
        ];
        let report = timeout(Duration::from_secs(2), coordinator.run(feeds, rx))
            .await
            .unwrap();

        assert_eq!(report.status, TerminationStatus::Completed);
        assert_eq!(report.banned_user_count, 1);
        assert_eq!(report.messages_forwarded, 4);
        assert_eq!(reports.reports.lock().as_slice(), &[report]);

        let texts: Vec<_> = gateway.requests.lock().iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["hi", "hello", "this is bad", "still bad"]);
        let cumulative: Vec<_> = gateway
            .requests
            .lock()
            .iter()
            .map(|r| r.cumulative_violations)
            .collect();
        assert_eq!(cumulative, vec![0, 0, 0, 1]);

        let events = validation.events();
        assert_eq!(events.first(), Some(&ChatEvent::GroupCreated { group_id: GROUP }));
        assert!(events.contains(&ChatEvent::UserBanned {
            group_id: GROUP,
            user_id: UserId(0),
            violations: 2,
        }));
        assert!(matches!(
            events.last(),
            Some(ChatEvent::GroupTerminated { banned_users: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_banned_user_gets_no_further_requests() {
        let gateway = Arc::new(LocalGateway::new(&["spam"], 1));
        let (coordinator, _, _) = coordinator(Arc::clone(&gateway));
        let (_tx, rx) = shutdown_channel();

        let feeds = vec![
            feed(0, &[(1, "spam"), (2, "more"), (3, "again")]),
            feed(1, &[(4, "fine")]),
        ];
        let report = timeout(Duration::from_secs(2), coordinator.run(feeds, rx))
            .await
            .unwrap();

        assert_eq!(report.banned_user_count, 1);
        let users: Vec<_> = gateway.requests.lock().iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![UserId(0), UserId(1)]);
    }

    #[tokio::test]
    async fn test_ties_go_to_lower_user_id() {
        let gateway = Arc::new(LocalGateway::new(&["x"], 5));
        let (coordinator, _, _) = coordinator(Arc::clone(&gateway));
        let (_tx, rx) = shutdown_channel();

        let feeds = vec![feed(0, &[(5, "a")]), feed(1, &[(5, "b")]), feed(2, &[(1, "c")])];
        timeout(Duration::from_secs(2), coordinator.run(feeds, rx))
            .await
            .unwrap();

        let texts: Vec<_> = gateway.requests.lock().iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_group_completes_immediately() {
        let (coordinator, validation, reports) = coordinator(UnavailableGateway);
        let (_tx, rx) = shutdown_channel();

        let report = timeout(Duration::from_millis(100), coordinator.run(Vec::new(), rx))
            .await
            .unwrap();
        assert_eq!(report.status, TerminationStatus::Completed);
        assert_eq!(report.users_joined, 0);
        assert_eq!(reports.reports.lock().len(), 1);
        assert_eq!(validation.events().len(), 2);
    }

    #[tokio::test]
    async fn test_gateway_failure_reports_unavailable() {
        let (coordinator, _, reports) = coordinator(UnavailableGateway);
        let (_tx, rx) = shutdown_channel();

        let report = timeout(Duration::from_secs(2), coordinator.run(vec![feed(0, &[(1, "hi")])], rx))
            .await
            .unwrap();
        assert_eq!(report.status, TerminationStatus::ModerationUnavailable);
        assert!(!reports.reports.lock()[0].is_completed());
    }

    #[tokio::test]
    async fn test_shutdown_while_awaiting_verdict() {
        let (coordinator, _, _) = coordinator(SilentGateway);
        let (tx, rx) = shutdown_channel();

        let run = tokio::spawn(coordinator.run(vec![feed(0, &[(1, "hi")])], rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let report = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
        assert_eq!(report.status, TerminationStatus::Cancelled);
        assert_eq!(report.messages_forwarded, 1);
    }

    #[tokio::test]
    async fn test_silent_feed_is_aborted_after_grace() {
        let (coordinator, _, _) = coordinator(SilentGateway);
        let (tx, rx) = shutdown_channel();

        // A feed that never sends and never closes
        let (keep, receiver) = tokio::sync::mpsc::channel::<ChatMessage>(1);
        let task = tokio::spawn(async move {
            let _keep = keep;
            std::future::pending::<FeedOutcome>().await
        });
        let handle = FeedHandle {
            user_id: UserId(0),
            receiver,
            task,
        };

        let run = tokio::spawn(coordinator.run(vec![handle], rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let report = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
        assert_eq!(report.status, TerminationStatus::Cancelled);
        assert_eq!(report.messages_forwarded, 0);
    }

    #[tokio::test]
    async fn test_allow_verdict_keeps_user_active() {
        let gateway = Arc::new(LocalGateway::new(&["bad"], 3));
        let (coordinator, validation, _) = coordinator(Arc::clone(&gateway));
        let (_tx, rx) = shutdown_channel();

        let report = timeout(
            Duration::from_secs(2),
            coordinator.run(vec![feed(0, &[(1, "bad"), (2, "bad")])], rx),
        )
        .await
        .unwrap();

        assert_eq!(report.banned_user_count, 0);
        assert_eq!(gateway.service.violations(GROUP, UserId(0)), 2);
        assert!(!validation
            .events()
            .iter()
            .any(|e| matches!(e, ChatEvent::UserBanned { .. })));
    }
}
