//! # Moderation Envelope
//!
//! Wrapper for every record exchanged with the moderation service.
//!
//! ## Properties
//!
//! - **Versioning**: decoders reject envelopes whose `version` differs from
//!   [`Envelope::CURRENT_VERSION`].
//! - **Correlation**: a verdict copies the `correlation_id` of its request;
//!   the request names the queue to answer on in `reply_to`.
//! - **Sender authority**: `sender` is the group that issued the request and
//!   is used to address fallback verdicts when the payload is unreadable.

use crate::entities::GroupId;
use crate::errors::CodecError;
use crate::ipc::{ModerationRequest, ModerationVerdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Address of a channel registered with the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Record carried in the envelope payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    ModerationRequest,
    ModerationVerdict,
}

/// Framed moderation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    // =========================================================================
    // HEADER SECTION
    // =========================================================================
    /// Protocol version, checked before the payload is touched.
    pub version: u16,

    pub kind: MessageKind,

    /// Group that issued the request (or that the verdict answers).
    pub sender: GroupId,

    /// Newly generated for requests; copied from the request for verdicts.
    pub correlation_id: Uuid,

    /// Queue the verdict must be sent to. Absent on verdicts.
    pub reply_to: Option<Address>,

    // =========================================================================
    // PAYLOAD SECTION
    // =========================================================================
    /// `bincode` encoding of the record named by `kind`.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Frame a moderation request with a fresh correlation id.
    pub fn request(request: &ModerationRequest, reply_to: Address) -> Result<Self, CodecError> {
        Ok(Self {
            version: Self::CURRENT_VERSION,
            kind: MessageKind::ModerationRequest,
            sender: request.group_id,
            correlation_id: Uuid::new_v4(),
            reply_to: Some(reply_to),
            payload: bincode::serialize(request)?,
        })
    }

    /// Frame a verdict answering the request with `correlation_id`.
    pub fn verdict(verdict: &ModerationVerdict, correlation_id: Uuid) -> Result<Self, CodecError> {
        Ok(Self {
            version: Self::CURRENT_VERSION,
            kind: MessageKind::ModerationVerdict,
            sender: verdict.group_id,
            correlation_id,
            reply_to: None,
            payload: bincode::serialize(verdict)?,
        })
    }

    /// Decode the payload as a request, enforcing version, kind and text length.
    pub fn decode_request(&self) -> Result<ModerationRequest, CodecError> {
        self.check_header(MessageKind::ModerationRequest)?;
        let request: ModerationRequest = bincode::deserialize(&self.payload)?;
        request.validate()?;
        Ok(request)
    }

    /// Decode the payload as a verdict.
    pub fn decode_verdict(&self) -> Result<ModerationVerdict, CodecError> {
        self.check_header(MessageKind::ModerationVerdict)?;
        Ok(bincode::deserialize(&self.payload)?)
    }

    fn check_header(&self, expected: MessageKind) -> Result<(), CodecError> {
        if self.version != Self::CURRENT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                received: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }
        if self.kind != expected {
            return Err(CodecError::UnexpectedKind {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}
