//! Cross-crate integration tests.

#[cfg(test)]
pub mod harness;

pub mod e2e_pipeline;
pub mod flows;
pub mod properties;
