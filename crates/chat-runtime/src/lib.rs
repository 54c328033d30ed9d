//! # Moderated Chat Runtime
//!
//! The application tier: loads a test case, wires every subsystem through
//! the shared bus and prints the run summary.
//!
//! ## Modular Structure
//!
//! - `container/` - run configuration and the channels the tier owns
//! - `wiring/` - per-group feeds and coordinator tasks
//! - `handlers/` - validation monitor
//! - `app/` - report aggregation and the run summary
//! - `runtime.rs` - [`ChatRuntime`], startup and shutdown sequencing
//!
//! ## Flow
//!
//! ```text
//! ChatRuntime ──spawn──→ GroupCoordinator × N ──requests──→ ModerationServer
//!      ▲                        │
//!      └──GroupTerminationReport┘ (coordination queue)
//! ```

pub mod app;
pub mod container;
pub mod handlers;
pub mod runtime;
pub mod wiring;

pub use app::{AggregationEnd, ApplicationTier, RunSummary};
pub use container::{AggregationConfig, ChannelContainer, ConfigError, GroupPlan, RunConfig};
pub use handlers::{ValidationMonitor, ValidationTally};
pub use runtime::ChatRuntime;

use shared_bus::TransportError;
use thiserror::Error;

/// Failures that abort a run before aggregation starts.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
