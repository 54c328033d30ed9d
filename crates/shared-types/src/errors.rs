//! # Error Types
//!
//! Errors raised while building or decoding shared records.

use thiserror::Error;

/// Errors related to message construction and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Message body exceeds the wire limit.
    #[error("Text too long: {len} bytes, limit is {max}")]
    TextTooLong { len: usize, max: usize },

    /// Action byte outside `{0, 1}`.
    #[error("Unknown moderation action: {0}")]
    UnknownAction(u8),
}

/// Errors raised while encoding or decoding an [`Envelope`](crate::Envelope).
#[derive(Debug, Error)]
pub enum CodecError {
    /// Envelope version not supported by this build.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },

    /// Envelope carries a different record than the one requested.
    #[error("Unexpected message kind: expected {expected:?}, got {actual:?}")]
    UnexpectedKind {
        expected: crate::MessageKind,
        actual: crate::MessageKind,
    },

    /// Payload bytes could not be (de)serialized.
    #[error("Payload codec failure: {0}")]
    Payload(#[from] bincode::Error),

    /// Payload decoded but violates a record invariant.
    #[error("Invalid payload: {0}")]
    Invalid(#[from] MessageError),
}
