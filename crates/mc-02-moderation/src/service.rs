//! # Moderation Service
//!
//! Application service implementing [`ModerationApi`]. Owns the violation
//! table; nothing else in the process can see or change it.

use crate::domain::filter::WordFilter;
use crate::domain::policy::BanPolicy;
use crate::domain::violations::ViolationTable;
use crate::ports::inbound::ModerationApi;
use parking_lot::Mutex;
use shared_types::entities::{GroupId, UserId};
use shared_types::ipc::{ModerationRequest, ModerationVerdict};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

pub struct ModerationService {
    filter: WordFilter,
    policy: BanPolicy,
    table: Mutex<ViolationTable>,
    processed: AtomicU64,
}

impl ModerationService {
    #[must_use]
    pub fn new(filter: WordFilter, policy: BanPolicy) -> Self {
        Self {
            filter,
            policy,
            table: Mutex::new(ViolationTable::new()),
            processed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn filter(&self) -> &WordFilter {
        &self.filter
    }

    #[must_use]
    pub fn policy(&self) -> BanPolicy {
        self.policy
    }
}

impl ModerationApi for ModerationService {
    fn moderate(&self, request: &ModerationRequest) -> ModerationVerdict {
        self.processed.fetch_add(1, Ordering::Relaxed);

        let found = self.filter.count_violations(&request.text);
        let cumulative = self
            .table
            .lock()
            .record(request.group_id, request.user_id, found);
        let action = self.policy.decide(cumulative);

        if request.cumulative_violations > cumulative {
            debug!(
                group = %request.group_id,
                user = %request.user_id,
                claimed = request.cumulative_violations,
                recorded = cumulative,
                "[mc-02] Coordinator count ahead of table"
            );
        }

        let verdict = ModerationVerdict {
            group_id: request.group_id,
            user_id: request.user_id,
            action,
            violation_count: cumulative,
        };

        if verdict.is_ban() {
            info!(
                group = %request.group_id,
                user = %request.user_id,
                violations = cumulative,
                "[mc-02] User banned"
            );
        } else {
            debug!(
                group = %request.group_id,
                user = %request.user_id,
                found,
                violations = cumulative,
                "[mc-02] Message allowed"
            );
        }
        verdict
    }

    fn violations(&self, group: GroupId, user: UserId) -> u32 {
        self.table.lock().get(group, user)
    }

    fn requests_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}
