//! Telemetry and structured logging for framewise.
//!
//! Console plus rolling NDJSON output, secret redaction, and per-request
//! pipeline stage events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{PipelineEvent, PipelineEventLogger, PipelineLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
pub use tracing_appender::non_blocking::WorkerGuard;
