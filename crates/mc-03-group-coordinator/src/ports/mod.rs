//! Ports for the Group Coordinator subsystem.
//!
//! The coordinator has no inbound API besides [`GroupCoordinator::run`](crate::GroupCoordinator::run);
//! every dependency it drives is an outbound port.

pub mod outbound;

pub use outbound::{GatewayError, ModerationGateway, ReportSink, ValidationSink};
