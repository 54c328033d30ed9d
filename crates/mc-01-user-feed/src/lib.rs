//! # User Feed Subsystem (mc-01)
//!
//! Lazy, finite, ordered per-user message sources and the producer task
//! that pumps them into a channel for the group coordinator.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): line parsing, errors
//! - **Ports Layer** (`ports/`): the [`UserFeed`] trait
//! - **Adapters** (`adapters/`): [`FileFeed`] (fixture replay), [`ScriptedFeed`]
//! - **Service Layer** (`service.rs`): [`spawn_feed`] and [`FeedHandle`]
//!
//! ## File Format
//!
//! One message per line, `<timestamp> <text>`. A malformed line ends the
//! feed; messages before it are still delivered.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::file::FileFeed;
pub use adapters::scripted::ScriptedFeed;
pub use domain::errors::FeedError;
pub use domain::line::{parse_line, FeedLine};
pub use ports::inbound::UserFeed;
pub use service::{spawn_feed, FeedConfig, FeedEnd, FeedHandle, FeedOutcome};
