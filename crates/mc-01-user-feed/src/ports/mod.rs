//! # Ports Layer
//!
//! - **Inbound (Driving)**: [`UserFeed`](inbound::UserFeed), the lazy message source

pub mod inbound;
