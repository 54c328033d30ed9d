//! # Shared Types Crate
//!
//! This crate contains the chat entities, the moderation wire records and the
//! `Envelope` that carries them across the moderation inbox.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-tier types are defined here.
//! - **Envelope Authority**: The envelope's `sender` group is authoritative;
//!   replies are routed with the envelope's `reply_to` and `correlation_id`.
//! - **Bounded Text**: Message text never exceeds [`MAX_TEXT_BYTES`].

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::{Address, Envelope, MessageKind};
pub use errors::*;
pub use ipc::*;
