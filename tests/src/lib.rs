//! # Moderated Chat Test Suite
//!
//! Cross-crate tests that need more than one subsystem running.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs        # in-process pipeline fixture
//!     ├── flows.rs          # coordinator ↔ moderation ↔ bus flows
//!     ├── e2e_pipeline.rs   # coordinators + aggregation + validation monitor
//!     └── properties.rs     # randomised ordering and ban properties
//! tests/benches/
//! └── pipeline_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mc-tests
//! cargo test -p mc-tests integration::properties
//! cargo bench -p mc-tests
//! ```

pub mod integration;
