//! # Group Coordinator Subsystem (mc-03)
//!
//! One coordinator per group. It merges the group's user feeds in timestamp
//! order, sends every message to the moderation service, applies the
//! verdicts and reports once when no active user remains.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Non-decreasing timestamps, ties by user id | `domain/merge.rs` - `select_next()` |
//! | Banned users are never polled or moderated again | `domain/stream_state.rs` - `ban()`, `multiplexer.rs` - `detach()` |
//! | Stop only at zero active users | `service.rs` - `merge()` |
//! | Exactly one termination report | `domain/group.rs` - `terminate()` |
//! | One moderation request in flight per group | `service.rs` - sequential `moderate()` |
//!
//! ## State Machine
//!
//! ```text
//! [Running] ──zero active / shutdown / inbox gone──→ [Draining] ──→ [Terminated]
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain/` - stream state, merge selection, group state machine
//! - `multiplexer.rs` - fan-in over the per-user channels
//! - `ports/` - [`ModerationGateway`], [`ValidationSink`], [`ReportSink`]
//! - `adapters/` - queue-backed gateway and report sink, validation sinks
//! - `service.rs` - [`GroupCoordinator`]

pub mod adapters;
pub mod domain;
pub mod multiplexer;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{
    BusValidationSink, NoOpValidationSink, QueueModerationClient, QueueReportSink,
    RecordingValidationSink, REPLY_QUEUE_CAPACITY,
};
pub use domain::group::{GroupPhase, GroupState, VerdictOutcome};
pub use domain::merge::select_next;
pub use domain::stream_state::UserStreamState;
pub use multiplexer::{FeedMultiplexer, RefillRound};
pub use ports::{GatewayError, ModerationGateway, ReportSink, ValidationSink};
pub use service::{CoordinatorConfig, GroupCoordinator};
