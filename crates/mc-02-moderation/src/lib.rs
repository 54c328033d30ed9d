//! # Moderation Service Subsystem (mc-02)
//!
//! One stateful server shared by every group coordinator.
//!
//! ## Purpose
//!
//! Count filtered words in each forwarded message, keep a cumulative
//! violation count per `(group, user)` and answer Allow or Ban.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Whole-word, case-insensitive matching | `domain/filter.rs` - `contains_whole_word()` |
//! | Each filtered word counts once per message | `domain/filter.rs` - `count_violations()` |
//! | Violation counts never decrease | `domain/violations.rs` - saturating `record()` |
//! | Ban iff cumulative ≥ threshold | `domain/policy.rs` - `decide()` |
//! | Threshold ≥ 1 | `domain/policy.rs` - `BanPolicy::new()` |
//!
//! ## Wire Behaviour
//!
//! ```text
//! [Coordinator] ──Envelope(request, tag 1)──→ [inbox] ──→ ModerationServer
//!                                                              │
//! [reply queue] ←──Envelope(verdict, tag 30+gid)───────────────┘
//! ```
//!
//! Undecodable requests are answered with Allow. A missing reply queue is
//! logged and the verdict dropped.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! - `domain/` - filter, violation table, ban policy
//! - `ports/` - [`ModerationApi`]
//! - `service.rs` - [`ModerationService`]
//! - `ipc/` - [`ModerationServer`] loop

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::errors::{FilterError, PolicyError};
pub use domain::filter::{WordFilter, MAX_FILTERED_WORDS, MAX_WORD_BYTES};
pub use domain::policy::BanPolicy;
pub use domain::violations::ViolationTable;
pub use ipc::{ModerationServer, ServerReport, ServerStop};
pub use ports::inbound::ModerationApi;
pub use service::ModerationService;
