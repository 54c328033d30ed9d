//! # Adapters
//!
//! Concrete [`UserFeed`](crate::ports::inbound::UserFeed) sources.

pub mod file;
pub mod scripted;
