//! Adapters binding the coordinator's outbound ports to the shared bus.

pub mod moderation_client;
pub mod report;
pub mod validation;

pub use moderation_client::{QueueModerationClient, REPLY_QUEUE_CAPACITY};
pub use report::QueueReportSink;
pub use validation::{BusValidationSink, NoOpValidationSink, RecordingValidationSink};
