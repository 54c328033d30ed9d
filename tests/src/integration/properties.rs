//! # Property Tests
//!
//! Randomised groups driven through a coordinator whose gateway calls the
//! moderation service in-process and records every exchange.
//!
//! | Property | Check |
//! |----------|-------|
//! | Ordering | requests sorted by `(timestamp, user id)` |
//! | At-most-one-ban | no request for a user after their Ban verdict |
//! | Monotonicity | per-user verdict counts never decrease |
//! | Threshold | Ban exactly on the first verdict reaching the threshold |

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tokio::time::timeout;

    use crate::integration::harness::prefilled_feed;
    use mc_02_moderation::{BanPolicy, ModerationApi, ModerationService, WordFilter};
    use mc_03_group_coordinator::{
        CoordinatorConfig, GatewayError, GroupCoordinator, ModerationGateway, NoOpValidationSink,
        ReportSink,
    };
    use shared_types::entities::{GroupId, ModerationAction, Timestamp, UserId};
    use shared_types::ipc::{GroupTerminationReport, ModerationRequest, ModerationVerdict};

    const GROUP: GroupId = GroupId(11);
    const VOCABULARY: [&str; 6] = ["hello", "bad", "ok", "worse", "fine", "badge"];

    struct RecordingGateway {
        service: ModerationService,
        exchanges: Mutex<Vec<(ModerationRequest, ModerationVerdict)>>,
    }

    #[async_trait]
    impl ModerationGateway for RecordingGateway {
        async fn moderate(
            &self,
            request: ModerationRequest,
        ) -> Result<ModerationVerdict, GatewayError> {
            let verdict = self.service.moderate(&request);
            self.exchanges.lock().push((request, verdict));
            Ok(verdict)
        }
    }

    struct DiscardReports;

    #[async_trait]
    impl ReportSink for DiscardReports {
        async fn submit(&self, _: GroupTerminationReport) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    /// Per user: sorted timestamps (duplicates allowed) with random texts.
    /// Each text ends in a `#<timestamp>` tag so requests can be placed back
    /// on the timeline.
    fn random_group(rng: &mut StdRng, users: usize) -> Vec<Vec<(Timestamp, String)>> {
        (0..users)
            .map(|_| {
                let len = rng.gen_range(0..12);
                let mut stamps: Vec<Timestamp> = (0..len).map(|_| rng.gen_range(0..40)).collect();
                stamps.sort_unstable();
                stamps
                    .into_iter()
                    .map(|ts| {
                        let words = rng.gen_range(1..4);
                        let mut text: Vec<&str> = (0..words)
                            .map(|_| VOCABULARY[rng.gen_range(0..VOCABULARY.len())])
                            .collect();
                        let tag = format!("#{ts}");
                        text.push(&tag);
                        (ts, text.join(" "))
                    })
                    .collect()
            })
            .collect()
    }

    fn tagged_timestamp(text: &str) -> Timestamp {
        text.rsplit('#').next().unwrap().parse().unwrap()
    }

    async fn run_group(
        users: &[Vec<(Timestamp, String)>],
        threshold: u32,
    ) -> (GroupTerminationReport, Vec<(ModerationRequest, ModerationVerdict)>) {
        let gateway = Arc::new(RecordingGateway {
            service: ModerationService::new(
                WordFilter::new(["bad", "worse"]).unwrap(),
                BanPolicy::new(threshold).unwrap(),
            ),
            exchanges: Mutex::new(Vec::new()),
        });
        let feeds = users
            .iter()
            .enumerate()
            .map(|(user, lines)| {
                let lines: Vec<(Timestamp, &str)> =
                    lines.iter().map(|(ts, t)| (*ts, t.as_str())).collect();
                prefilled_feed(GROUP, user as u32, &lines)
            })
            .collect();
        // A wide refill window keeps the merge strict on a loaded machine.
        let config = CoordinatorConfig {
            poll_interval: Duration::from_secs(1),
            ..CoordinatorConfig::default()
        };
        let coordinator = GroupCoordinator::new(
            GROUP,
            config,
            Arc::clone(&gateway),
            Arc::new(NoOpValidationSink),
            Arc::new(DiscardReports),
        );
        let (_tx, rx) = shared_bus::shutdown_channel();
        let report = timeout(Duration::from_secs(10), coordinator.run(feeds, rx))
            .await
            .expect("group should terminate");
        let exchanges = gateway.exchanges.lock().clone();
        (report, exchanges)
    }

    #[tokio::test]
    async fn test_random_groups_hold_all_properties() {
        let mut rng = StdRng::seed_from_u64(0x6d63_2d74);

        for round in 0..25 {
            let user_count = rng.gen_range(1..6);
            let users = random_group(&mut rng, user_count);
            let threshold = rng.gen_range(1..4);
            let (report, exchanges) = run_group(&users, threshold).await;

            // Ordering
            let keys: Vec<(Timestamp, UserId)> = exchanges
                .iter()
                .map(|(req, _)| (tagged_timestamp(&req.text), req.user_id))
                .collect();
            assert!(
                keys.windows(2).all(|w| w[0] <= w[1]),
                "round {round}: out of order {keys:?}"
            );

            let mut banned: HashSet<UserId> = HashSet::new();
            let mut last_count: HashMap<UserId, u32> = HashMap::new();
            for (req, verdict) in &exchanges {
                // At-most-one-ban
                assert!(
                    !banned.contains(&req.user_id),
                    "round {round}: request after ban for {}",
                    req.user_id
                );
                // Monotonicity
                let previous = last_count.get(&req.user_id).copied().unwrap_or(0);
                assert!(verdict.violation_count >= previous, "round {round}: count decreased");
                assert_eq!(req.cumulative_violations, previous, "round {round}: stale cumulative");
                last_count.insert(req.user_id, verdict.violation_count);
                // Threshold
                let crossed = verdict.violation_count >= threshold;
                assert_eq!(verdict.action == ModerationAction::Ban, crossed, "round {round}");
                if crossed {
                    banned.insert(req.user_id);
                }
            }

            // Users never banned forward their whole file.
            for (user, lines) in users.iter().enumerate() {
                let id = UserId(user as u32);
                if !banned.contains(&id) {
                    let sent = exchanges.iter().filter(|(r, _)| r.user_id == id).count();
                    assert_eq!(sent, lines.len(), "round {round}: user {user} lost messages");
                }
            }

            assert_eq!(report.banned_user_count, banned.len() as u32, "round {round}");
            assert_eq!(report.messages_forwarded, exchanges.len() as u64, "round {round}");
            assert_eq!(report.users_joined, user_count as u32, "round {round}");
        }
    }
}
