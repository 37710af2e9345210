//! Pipeline Event Logger
//!
//! One structured event per stage transition of an analysis request, written
//! on the `pipeline_events` target so the NDJSON file can be filtered by it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    Received { kind: String },
    FramesSampled { requested: usize, count: usize, duration_secs: f64 },
    VisionDescribed { images: usize, chars: usize },
    AudioExtracted,
    AudioAbsent { reason: String },
    Transcribed { chars: usize },
    Composed { chars: usize },
    Cleaned { files: usize },
    Failed { stage: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct PipelineLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

pub struct PipelineEventLogger;

impl PipelineEventLogger {
    /// Record `event` for `request_id`, redacting free-text payloads first.
    pub fn log_event(request_id: &str, event: PipelineEvent) -> PipelineLogEntry {
        let event = match event {
            PipelineEvent::AudioAbsent { reason } => PipelineEvent::AudioAbsent {
                reason: redact_sensitive_data(&reason),
            },
            PipelineEvent::Failed { stage, error } => PipelineEvent::Failed {
                stage,
                error: redact_sensitive_data(&error),
            },
            other => other,
        };

        let entry = PipelineLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let json = serde_json::to_string(&entry.event).unwrap_or_default();
        match entry.event {
            PipelineEvent::Failed { .. } => {
                warn!(target: "pipeline_events", request_id = %entry.request_id, event = %json, "Pipeline stage failed")
            }
            _ => info!(target: "pipeline_events", request_id = %entry.request_id, event = %json, "Pipeline stage"),
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_is_redacted() {
        let entry = PipelineEventLogger::log_event(
            "req-1",
            PipelineEvent::Failed {
                stage: "vision".into(),
                error: "401 Incorrect API key provided: sk-abcdefghijklmnopqrstuv".into(),
            },
        );
        match entry.event {
            PipelineEvent::Failed { stage, error } => {
                assert_eq!(stage, "vision");
                assert!(error.starts_with("401 Incorrect API key provided"));
                assert!(!error.contains("sk-abcdefghijklmnopqrstuv"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(PipelineEvent::FramesSampled {
            requested: 3,
            count: 2,
            duration_secs: 45.0,
        })
        .unwrap();
        assert_eq!(json["type"], "FramesSampled");
        assert_eq!(json["count"], 2);
    }
}
