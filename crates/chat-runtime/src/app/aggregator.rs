//! # Report Aggregation
//!
//! Reports arrive on the group-coordination queue in any order. Aggregation
//! stops when every group has reported, and also when:
//!
//! - the report timeout elapses,
//! - shutdown is requested,
//! - the coordination queue is destroyed.
//!
//! A coordinator task that finished without its report reaching the queue
//! is given up on at the next tick. Groups that never reported are listed
//! in [`RunSummary::missing_groups`]; reports that arrive after aggregation
//! ended are picked up by [`ApplicationTier::collect_late`].

use crate::container::config::AggregationConfig;
use crate::wiring::groups::GroupTask;
use shared_bus::{shutdown_requested, tags, MessageQueue, ShutdownReceiver, TagFilter};
use shared_types::entities::GroupId;
use shared_types::ipc::GroupTerminationReport;
use std::collections::BTreeSet;
use std::fmt;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Why aggregation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationEnd {
    AllReported,
    Timeout,
    Shutdown,
    CoordinationClosed,
}

impl fmt::Display for AggregationEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AllReported => "all groups reported",
            Self::Timeout => "report timeout",
            Self::Shutdown => "shutdown",
            Self::CoordinationClosed => "coordination queue closed",
        };
        f.write_str(text)
    }
}

/// Totals for the whole run.
///
/// Only `Completed` reports add to the user and message counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub groups_created: u32,
    pub groups_terminated: u32,
    pub groups_failed: u32,
    pub users_created: u64,
    pub messages_relayed: u64,
    pub users_banned: u64,
    pub missing_groups: Vec<GroupId>,
    pub end: AggregationEnd,
}

impl RunSummary {
    #[must_use]
    pub fn new(groups_created: u32) -> Self {
        Self {
            groups_created,
            groups_terminated: 0,
            groups_failed: 0,
            users_created: 0,
            messages_relayed: 0,
            users_banned: 0,
            missing_groups: Vec::new(),
            end: AggregationEnd::AllReported,
        }
    }

    pub fn absorb(&mut self, report: &GroupTerminationReport) {
        self.groups_terminated += 1;
        if report.is_completed() {
            self.users_created += u64::from(report.users_joined);
            self.users_banned += u64::from(report.banned_user_count);
            self.messages_relayed += report.messages_forwarded;
        } else {
            self.groups_failed += 1;
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_groups.is_empty() && self.groups_failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run summary")?;
        writeln!(f, "  groups created:    {}", self.groups_created)?;
        writeln!(f, "  groups terminated: {}", self.groups_terminated)?;
        writeln!(f, "  groups failed:     {}", self.groups_failed)?;
        writeln!(f, "  users created:     {}", self.users_created)?;
        writeln!(f, "  messages relayed:  {}", self.messages_relayed)?;
        writeln!(f, "  users banned:      {}", self.users_banned)?;
        if self.missing_groups.is_empty() {
            writeln!(f, "  missing groups:    none")?;
        } else {
            let ids: Vec<String> = self.missing_groups.iter().map(ToString::to_string).collect();
            writeln!(f, "  missing groups:    {}", ids.join(", "))?;
        }
        write!(f, "  ended by:          {}", self.end)
    }
}

enum Step {
    Report(GroupTerminationReport),
    Tick,
    Timeout,
    Shutdown,
    Closed,
}

pub struct ApplicationTier {
    config: AggregationConfig,
}

impl ApplicationTier {
    #[must_use]
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Collect reports for `tasks` from `coordination`.
    pub async fn aggregate(
        &self,
        coordination: &MessageQueue<GroupTerminationReport>,
        tasks: &[GroupTask],
        shutdown: &mut ShutdownReceiver,
    ) -> RunSummary {
        let mut summary = RunSummary::new(u32::try_from(tasks.len()).unwrap_or(u32::MAX));
        let mut pending: BTreeSet<GroupId> = tasks.iter().map(|t| t.group_id).collect();
        let mut crashed: BTreeSet<GroupId> = BTreeSet::new();

        let deadline = Instant::now() + self.config.report_timeout;
        let mut tick = interval(self.config.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let filter = TagFilter::Exact(tags::TERMINATION_REPORT);

        let end = loop {
            if pending.is_empty() {
                break AggregationEnd::AllReported;
            }

            let step = tokio::select! {
                biased;
                () = shutdown_requested(shutdown) => Step::Shutdown,
                received = coordination.recv(filter) => match received {
                    Ok(record) => Step::Report(record.payload),
                    Err(_) => Step::Closed,
                },
                _ = tick.tick() => Step::Tick,
                () = sleep_until(deadline) => Step::Timeout,
            };

            match step {
                Step::Report(report) => accept(report, &mut pending, &mut summary),
                Step::Tick => {
                    // A coordinator queues its report before its task finishes,
                    // so the finished set must be taken before draining.
                    let finished: Vec<GroupId> = tasks
                        .iter()
                        .filter(|t| pending.contains(&t.group_id) && t.handle.is_finished())
                        .map(|t| t.group_id)
                        .collect();
                    while let Ok(Some(record)) = coordination.try_recv(filter) {
                        accept(record.payload, &mut pending, &mut summary);
                    }
                    for group_id in finished {
                        if pending.remove(&group_id) {
                            warn!(group = %group_id, "Coordinator exited without a report");
                            crashed.insert(group_id);
                        }
                    }
                }
                Step::Timeout => {
                    warn!(missing = pending.len(), "Timed out waiting for termination reports");
                    break AggregationEnd::Timeout;
                }
                Step::Shutdown => {
                    info!("Shutdown requested during aggregation");
                    break AggregationEnd::Shutdown;
                }
                Step::Closed => {
                    warn!("Coordination queue destroyed during aggregation");
                    break AggregationEnd::CoordinationClosed;
                }
            }
        };

        pending.extend(crashed);
        summary.missing_groups = pending.into_iter().collect();
        summary.end = end;
        summary
    }

    /// Absorb reports still queued for groups listed as missing.
    ///
    /// Called once the coordinators have been joined, so reports sent on
    /// the way out (usually `Cancelled`) count as failures rather than
    /// missing groups. Returns how many were absorbed.
    pub fn collect_late(
        &self,
        coordination: &MessageQueue<GroupTerminationReport>,
        summary: &mut RunSummary,
    ) -> usize {
        let filter = TagFilter::Exact(tags::TERMINATION_REPORT);
        let mut pending: BTreeSet<GroupId> = summary.missing_groups.iter().copied().collect();
        let mut absorbed = 0;
        while let Ok(Some(record)) = coordination.try_recv(filter) {
            if pending.contains(&record.payload.group_id) {
                accept(record.payload, &mut pending, summary);
                absorbed += 1;
            } else {
                warn!(group = %record.payload.group_id, "Ignoring unexpected or duplicate report");
            }
        }
        summary.missing_groups = pending.into_iter().collect();
        absorbed
    }
}

fn accept(
    report: GroupTerminationReport,
    pending: &mut BTreeSet<GroupId>,
    summary: &mut RunSummary,
) {
    if !pending.remove(&report.group_id) {
        warn!(group = %report.group_id, "Ignoring unexpected or duplicate report");
        return;
    }
    info!(
        group = %report.group_id,
        status = ?report.status,
        banned = report.banned_user_count,
        "All users terminated. Exiting group process {}",
        report.group_id
    );
    summary.absorb(&report);
}
