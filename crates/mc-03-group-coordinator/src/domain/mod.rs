//! # Domain Layer
//!
//! Per-user stream state, merge selection and the group state machine.
//! No I/O.

pub mod group;
pub mod merge;
pub mod stream_state;
