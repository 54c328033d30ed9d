//! # Ports Layer
//!
//! - **Inbound (Driving)**: [`ModerationApi`](inbound::ModerationApi)

pub mod inbound;
