//! # Ban Policy

use crate::domain::errors::PolicyError;
use shared_types::entities::ModerationAction;

/// Ban once the cumulative count reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanPolicy {
    threshold: u32,
}

impl BanPolicy {
    pub fn new(threshold: u32) -> Result<Self, PolicyError> {
        if threshold == 0 {
            return Err(PolicyError::ZeroThreshold);
        }
        Ok(Self { threshold })
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[must_use]
    pub fn decide(&self, cumulative: u32) -> ModerationAction {
        if cumulative >= self.threshold {
            ModerationAction::Ban
        } else {
            ModerationAction::Allow
        }
    }
}
