//! # Scripted Feed
//!
//! In-memory feed built from `(timestamp, text)` pairs.

use crate::domain::errors::FeedError;
use crate::ports::inbound::UserFeed;
use async_trait::async_trait;
use shared_types::entities::{ChatMessage, GroupId, Timestamp, UserId};
use std::collections::VecDeque;

pub struct ScriptedFeed {
    group_id: GroupId,
    user_id: UserId,
    script: VecDeque<(Timestamp, String)>,
    /// Error returned once the script runs out, instead of end-of-stream.
    fail_at_end: Option<String>,
}

impl ScriptedFeed {
    pub fn new<I, S>(group_id: GroupId, user_id: UserId, script: I) -> Self
    where
        I: IntoIterator<Item = (Timestamp, S)>,
        S: Into<String>,
    {
        Self {
            group_id,
            user_id,
            script: script.into_iter().map(|(ts, s)| (ts, s.into())).collect(),
            fail_at_end: None,
        }
    }

    /// End the feed with a malformed-line error instead of end-of-stream.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.fail_at_end = Some(reason.into());
        self
    }

    /// Messages still to be produced.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl UserFeed for ScriptedFeed {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    async fn next(&mut self) -> Result<Option<ChatMessage>, FeedError> {
        match self.script.pop_front() {
            Some((ts, text)) => Ok(Some(ChatMessage::new(
                ts,
                self.group_id,
                self.user_id,
                text,
            )?)),
            None => match self.fail_at_end.take() {
                Some(reason) => Err(FeedError::Malformed { line: 0, reason }),
                None => Ok(None),
            },
        }
    }
}
