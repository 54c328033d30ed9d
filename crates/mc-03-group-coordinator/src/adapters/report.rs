//! Delivers the termination report to the application tier's
//! group-coordination queue.

use crate::ports::outbound::{GatewayError, ReportSink};
use async_trait::async_trait;
use shared_bus::{tags, Transport};
use shared_types::envelope::Address;
use shared_types::ipc::GroupTerminationReport;

pub struct QueueReportSink {
    transport: Transport,
    address: Address,
}

impl QueueReportSink {
    #[must_use]
    pub fn new(transport: Transport, address: Address) -> Self {
        Self { transport, address }
    }
}

#[async_trait]
impl ReportSink for QueueReportSink {
    async fn submit(&self, report: GroupTerminationReport) -> Result<(), GatewayError> {
        let queue = self
            .transport
            .lookup_queue::<GroupTerminationReport>(self.address)?;
        queue
            .send(tags::TERMINATION_REPORT, report)
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))
    }
}
