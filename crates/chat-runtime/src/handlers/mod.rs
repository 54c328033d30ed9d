//! Event handlers run by the application tier.

pub mod validation;

pub use validation::{ValidationMonitor, ValidationTally};
