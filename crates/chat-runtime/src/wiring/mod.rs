//! # Group Wiring
//!
//! Connects each configured group to the shared channels:
//!
//! ```text
//! user files ──FileFeed──→ spawn_feed ──mpsc──→ GroupCoordinator
//!                                                 │  │  │
//!              moderation inbox ◄─QueueModerationClient  │
//!              validation bus   ◄─BusValidationSink ─────┘  │
//!              coordination     ◄─QueueReportSink ──────────┘
//! ```

pub mod groups;

pub use groups::{open_feeds, spawn_group, GroupTask};
