//! Outbound (Driven) ports for the Group Coordinator subsystem.

use async_trait::async_trait;
use shared_bus::{ChatEvent, TransportError};
use shared_types::errors::CodecError;
use shared_types::ipc::{GroupTerminationReport, ModerationRequest, ModerationVerdict};
use std::sync::Arc;
use thiserror::Error;

/// Failures reaching the moderation service or the application tier.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Channel unavailable: {0}")]
    Unavailable(String),

    #[error("Private reply queue was destroyed")]
    ReplyQueueClosed,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Request/verdict exchange with the moderation service.
///
/// Exactly one call is in flight per group at any time.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Send one request and wait for the matching verdict.
    async fn moderate(&self, request: ModerationRequest) -> Result<ModerationVerdict, GatewayError>;
}

#[async_trait]
impl<T: ModerationGateway + ?Sized> ModerationGateway for Arc<T> {
    async fn moderate(&self, request: ModerationRequest) -> Result<ModerationVerdict, GatewayError> {
        (**self).moderate(request).await
    }
}

/// Fire-and-forget lifecycle notifications.
#[async_trait]
pub trait ValidationSink: Send + Sync {
    async fn notify(&self, event: ChatEvent);
}

/// Delivery of the single termination report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: GroupTerminationReport) -> Result<(), GatewayError>;
}
