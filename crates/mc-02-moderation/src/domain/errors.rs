//! # Moderation Errors

use thiserror::Error;

/// Errors raised while building the filtered-word list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A filtered word does not fit the word buffer.
    #[error("Filtered word {word:?} is {len} bytes, limit is {max}")]
    WordTooLong { word: String, len: usize, max: usize },
}

/// Errors raised while building the ban policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// A threshold of zero would ban every user on their first message.
    #[error("Violation threshold must be at least 1")]
    ZeroThreshold,
}
