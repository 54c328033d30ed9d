//! # Domain Layer
//!
//! Pure moderation logic with no I/O dependencies.

pub mod errors;
pub mod filter;
pub mod policy;
pub mod violations;
