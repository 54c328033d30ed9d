//! # Domain Layer
//!
//! Line parsing and feed errors. No I/O.

pub mod errors;
pub mod line;
