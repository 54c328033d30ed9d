//! # Feed Multiplexer
//!
//! Event-driven fan-in over the per-user channels.
//!
//! Each refill round first polls every empty slot without waiting. While
//! some active user still has an empty slot, it waits for *any* of those
//! channels to become ready, up to the refill window. A closed channel
//! marks its user `Finished`.
//!
//! Invariant: `receivers[i]` is `Some` exactly while stream `i` is active.

use crate::domain::stream_state::UserStreamState;
use futures::future::{select_all, FutureExt};
use shared_types::entities::ChatMessage;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// Counters for one refill round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefillRound {
    pub filled: usize,
    pub finished: usize,
    /// The window closed with at least one active slot still empty.
    pub timed_out: bool,
}

pub struct FeedMultiplexer {
    receivers: Vec<Option<mpsc::Receiver<ChatMessage>>>,
}

impl FeedMultiplexer {
    /// One receiver per stream, in stream order.
    #[must_use]
    pub fn new(receivers: Vec<mpsc::Receiver<ChatMessage>>) -> Self {
        Self {
            receivers: receivers.into_iter().map(Some).collect(),
        }
    }

    /// Number of channels still attached.
    #[must_use]
    pub fn attached(&self) -> usize {
        self.receivers.iter().filter(|r| r.is_some()).count()
    }

    /// Drop the channel of stream `idx`. Its producer sees the closed channel.
    pub fn detach(&mut self, idx: usize) {
        if let Some(slot) = self.receivers.get_mut(idx) {
            *slot = None;
        }
    }

    pub fn detach_all(&mut self) {
        for slot in &mut self.receivers {
            *slot = None;
        }
    }

    /// Refill empty slots of active streams, waiting at most `window`.
    pub async fn refill(
        &mut self,
        streams: &mut [UserStreamState],
        window: Duration,
    ) -> RefillRound {
        let deadline = Instant::now() + window;
        let mut round = RefillRound::default();

        loop {
            self.poll_ready(streams, &mut round);

            let waiting: Vec<usize> = streams
                .iter()
                .enumerate()
                .filter(|(i, s)| {
                    s.needs_refill() && self.receivers.get(*i).is_some_and(Option::is_some)
                })
                .map(|(i, _)| i)
                .collect();
            if waiting.is_empty() {
                return round;
            }

            let ready = {
                let pending = self
                    .receivers
                    .iter_mut()
                    .enumerate()
                    .filter(|(i, _)| waiting.contains(i))
                    .filter_map(|(i, slot)| slot.as_mut().map(|rx| (i, rx)))
                    .map(|(i, rx)| async move { (i, rx.recv().await) }.boxed());
                match timeout_at(deadline, select_all(pending)).await {
                    Ok(((i, received), _, _)) => Some((i, received)),
                    Err(_) => None,
                }
            };

            match ready {
                Some((i, Some(message))) => {
                    if streams[i].fill(message) {
                        round.filled += 1;
                    }
                }
                Some((i, None)) => self.close(i, streams, &mut round),
                None => {
                    round.timed_out = true;
                    return round;
                }
            }
        }
    }

    fn poll_ready(&mut self, streams: &mut [UserStreamState], round: &mut RefillRound) {
        for i in 0..streams.len() {
            if !streams[i].needs_refill() {
                continue;
            }
            let Some(rx) = self.receivers.get_mut(i).and_then(Option::as_mut) else {
                // Active stream without a channel: nothing will ever arrive.
                self.close(i, streams, round);
                continue;
            };
            match rx.try_recv() {
                Ok(message) => {
                    if streams[i].fill(message) {
                        round.filled += 1;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.close(i, streams, round),
            }
        }
    }

    fn close(&mut self, i: usize, streams: &mut [UserStreamState], round: &mut RefillRound) {
        self.detach(i);
        if streams[i].finish() {
            round.finished += 1;
            debug!(user = %streams[i].user_id(), "[mc-03] Feed closed, user finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::entities::{GroupId, UserId, UserStatus};

    fn msg(user: u32, ts: i64) -> ChatMessage {
        ChatMessage::new(ts, GroupId(0), UserId(user), "x").unwrap()
    }

    fn streams(n: u32) -> Vec<UserStreamState> {
        (0..n).map(|u| UserStreamState::new(UserId(u))).collect()
    }

    #[tokio::test]
    async fn test_prefilled_channels_fill_without_waiting() {
        let (tx0, rx0) = mpsc::channel(4);
        let (tx1, rx1) = mpsc::channel(4);
        tx0.try_send(msg(0, 1)).unwrap();
        tx1.try_send(msg(1, 2)).unwrap();

        let mut mux = FeedMultiplexer::new(vec![rx0, rx1]);
        let mut s = streams(2);
        let round = mux.refill(&mut s, Duration::from_secs(5)).await;

        assert_eq!(round.filled, 2);
        assert!(!round.timed_out);
        assert!(s.iter().all(|st| st.pending().is_some()));
    }

    #[tokio::test]
    async fn test_closed_channel_finishes_user() {
        let (tx0, rx0) = mpsc::channel::<ChatMessage>(4);
        drop(tx0);

        let mut mux = FeedMultiplexer::new(vec![rx0]);
        let mut s = streams(1);
        let round = mux.refill(&mut s, Duration::from_millis(10)).await;

        assert_eq!(round.finished, 1);
        assert_eq!(s[0].status(), UserStatus::Finished);
        assert_eq!(mux.attached(), 0);
    }

    #[tokio::test]
    async fn test_window_closes_on_silent_feed() {
        let (_tx0, rx0) = mpsc::channel::<ChatMessage>(4);
        let (tx1, rx1) = mpsc::channel(4);
        tx1.try_send(msg(1, 1)).unwrap();

        let mut mux = FeedMultiplexer::new(vec![rx0, rx1]);
        let mut s = streams(2);
        let round = mux.refill(&mut s, Duration::from_millis(10)).await;

        assert!(round.timed_out);
        assert_eq!(round.filled, 1);
        assert!(s[0].is_active());
        assert!(s[0].pending().is_none());
    }

    #[tokio::test]
    async fn test_late_message_arrives_within_window() {
        let (tx0, rx0) = mpsc::channel(4);
        let mut mux = FeedMultiplexer::new(vec![rx0]);
        let mut s = streams(1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            tx0.send(msg(0, 7)).await.unwrap();
        });

        let round = mux.refill(&mut s, Duration::from_secs(2)).await;
        assert_eq!(round.filled, 1);
        assert_eq!(s[0].pending().unwrap().timestamp(), 7);
    }

    #[tokio::test]
    async fn test_detached_stream_finishes_on_next_refill() {
        let (_tx0, rx0) = mpsc::channel::<ChatMessage>(4);
        let mut mux = FeedMultiplexer::new(vec![rx0]);
        let mut s = streams(1);

        mux.detach(0);
        let round = mux.refill(&mut s, Duration::from_millis(10)).await;
        assert_eq!(round.finished, 1);
        assert!(!round.timed_out);
    }
}
