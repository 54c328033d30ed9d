//! # Violation Table
//!
//! Cumulative violation count per `(group, user)`. Entries never decrease.

use shared_types::entities::{GroupId, UserId};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ViolationTable {
    counts: HashMap<(GroupId, UserId), u32>,
}

impl ViolationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the entry and return the updated total.
    pub fn record(&mut self, group: GroupId, user: UserId, delta: u32) -> u32 {
        let entry = self.counts.entry((group, user)).or_insert(0);
        *entry = entry.saturating_add(delta);
        *entry
    }

    /// Current total, 0 for unknown users.
    #[must_use]
    pub fn get(&self, group: GroupId, user: UserId) -> u32 {
        self.counts.get(&(group, user)).copied().unwrap_or(0)
    }

    /// Number of users with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
