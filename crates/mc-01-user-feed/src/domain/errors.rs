//! # Feed Errors

use shared_types::MessageError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a user feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The backing file could not be opened or read.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line does not have the `<timestamp> <text>` shape.
    #[error("Malformed line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// The line parsed but the message could not be built.
    #[error("Invalid message: {0}")]
    Message(#[from] MessageError),
}
