//! # Feed Line Parser
//!
//! A feed line is `<timestamp> <text>`: a signed decimal timestamp, at
//! least one space or tab, then the message body up to the end of line.
//! Blank lines are ignored. Bodies longer than [`MAX_TEXT_BYTES`] are cut.

use crate::domain::errors::FeedError;
use shared_types::entities::{truncate_text, Timestamp, MAX_TEXT_BYTES};

/// One parsed feed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLine {
    pub timestamp: Timestamp,
    pub text: String,
    /// The body was longer than [`MAX_TEXT_BYTES`] and has been cut.
    pub truncated: bool,
}

/// Parse a raw line.
///
/// Returns `Ok(None)` for blank lines. `line_no` is only used in errors.
pub fn parse_line(raw: &str, line_no: usize) -> Result<Option<FeedLine>, FeedError> {
    let trimmed = raw.trim_end_matches(['\r', '\n']).trim_start();
    if trimmed.trim_end().is_empty() {
        return Ok(None);
    }

    let Some((stamp, rest)) = trimmed.split_once([' ', '\t']) else {
        return Err(FeedError::Malformed {
            line: line_no,
            reason: "missing message text".to_string(),
        });
    };

    let timestamp: Timestamp = stamp.parse().map_err(|_| FeedError::Malformed {
        line: line_no,
        reason: format!("bad timestamp {stamp:?}"),
    })?;

    let body = rest.trim_start();
    if body.is_empty() {
        return Err(FeedError::Malformed {
            line: line_no,
            reason: "missing message text".to_string(),
        });
    }

    Ok(Some(FeedLine {
        timestamp,
        text: truncate_text(body).to_string(),
        truncated: body.len() > MAX_TEXT_BYTES,
    }))
}
