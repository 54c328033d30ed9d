//! # File Feed
//!
//! Replays a user file line by line. A malformed line or a read error ends
//! the feed with an error; everything read before it has been delivered.

use crate::domain::errors::FeedError;
use crate::domain::line::parse_line;
use crate::ports::inbound::UserFeed;
use async_trait::async_trait;
use shared_types::entities::{ChatMessage, GroupId, Timestamp, UserId};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};

pub struct FileFeed {
    path: PathBuf,
    group_id: GroupId,
    user_id: UserId,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    last_timestamp: Option<Timestamp>,
    done: bool,
}

impl FileFeed {
    /// Open `path` for replay.
    pub async fn open(
        path: impl AsRef<Path>,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Self, FeedError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await.map_err(|source| FeedError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = ?path, group = %group_id, user = %user_id, "[mc-01] Feed opened");
        Ok(Self {
            path,
            group_id,
            user_id,
            lines: BufReader::new(file).lines(),
            line_no: 0,
            last_timestamp: None,
            done: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UserFeed for FileFeed {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    async fn next(&mut self) -> Result<Option<ChatMessage>, FeedError> {
        while !self.done {
            let raw = match self.lines.next_line().await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(source) => {
                    self.done = true;
                    return Err(FeedError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            };
            self.line_no += 1;

            let parsed = match parse_line(&raw, self.line_no) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };

            if parsed.truncated {
                debug!(line = self.line_no, path = ?self.path, "[mc-01] Long line truncated");
            }
            if self.last_timestamp.is_some_and(|last| parsed.timestamp < last) {
                warn!(
                    line = self.line_no,
                    path = ?self.path,
                    timestamp = parsed.timestamp,
                    "[mc-01] Timestamp goes backwards"
                );
            }
            self.last_timestamp = Some(parsed.timestamp);

            let message =
                ChatMessage::new(parsed.timestamp, self.group_id, self.user_id, parsed.text)?;
            return Ok(Some(message));
        }
        self.done = true;
        Ok(None)
    }
}
