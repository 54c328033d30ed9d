//! IPC layer: the moderation inbox server.

pub mod handler;

pub use handler::{ModerationServer, ServerReport, ServerStop};
