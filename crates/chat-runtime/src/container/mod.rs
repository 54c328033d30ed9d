//! # Run Container
//!
//! Configuration and the channels the application tier owns.

pub mod channels;
pub mod config;

pub use channels::ChannelContainer;
pub use config::{AggregationConfig, ConfigError, GroupPlan, RunConfig};
