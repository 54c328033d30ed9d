//! # Merge Selection
//!
//! Picks the next message of the k-way merge: the smallest
//! `(timestamp, user id)` among active users with a filled slot.

use crate::domain::stream_state::UserStreamState;

/// Index of the stream whose pending message goes next, if any.
#[must_use]
pub fn select_next(streams: &[UserStreamState]) -> Option<usize> {
    streams
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_active())
        .filter_map(|(i, s)| s.pending().map(|m| (m.ordering_key(), i)))
        .min()
        .map(|(_, i)| i)
}
