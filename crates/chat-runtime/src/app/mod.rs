//! # Application Tier
//!
//! Collects one termination report per group and produces the run summary.

pub mod aggregator;

pub use aggregator::{AggregationEnd, ApplicationTier, RunSummary};
