use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a temporary media file holds and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    OriginalVideo,
    OriginalImage,
    OriginalAudio,
    ExtractedFrame,
    ExtractedAudio,
}

/// A temporary file on disk, owned by the request that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
}

impl MediaAsset {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One still image taken from a video, with its position in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub asset: MediaAsset,
    pub timestamp_secs: f64,
}

/// A `{start, end}` pair in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// A diarized utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker: Option<String>,
    pub text: String,
    #[serde(rename = "start")]
    pub start_ms: i64,
    #[serde(rename = "end")]
    pub end_ms: i64,
}

/// A topic-based time range with a generated headline and summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "start")]
    pub start_ms: i64,
    #[serde(rename = "end")]
    pub end_ms: i64,
    pub headline: String,
    pub summary: String,
}

/// A key phrase detected in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    pub count: u32,
    pub rank: f64,
    pub timestamps: Vec<TimeRange>,
}

/// Sentiment attributed to a sentence of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSegment {
    pub text: String,
    #[serde(rename = "start")]
    pub start_ms: i64,
    #[serde(rename = "end")]
    pub end_ms: i64,
    pub sentiment: String,
    pub confidence: f64,
}

/// Normalized output of the speech-analysis service.
///
/// Every sequence is empty, never absent, when the service omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    #[serde(default)]
    pub speakers: Vec<SpeakerSegment>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub sentiments: Vec<SentimentSegment>,
}

/// Final result of one analysis request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub narrative: String,
    pub frames: Vec<FrameSample>,
    pub transcript: String,
    pub transcript_detail: Option<TranscriptResult>,
    pub duration_secs: Option<f64>,
}

impl AnalysisReport {
    /// A report carrying only narrative text (chat replies, image analysis).
    pub fn text_only(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            frames: Vec::new(),
            transcript: String::new(),
            transcript_detail: None,
            duration_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_defaults_missing_sequences() {
        let parsed: TranscriptResult = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(parsed.text, "hello");
        assert!(parsed.speakers.is_empty());
        assert!(parsed.chapters.is_empty());
        assert!(parsed.highlights.is_empty());
        assert!(parsed.sentiments.is_empty());
    }

    #[test]
    fn speaker_segment_uses_wire_names() {
        let seg = SpeakerSegment {
            speaker: Some("A".into()),
            text: "hi".into(),
            start_ms: 10,
            end_ms: 900,
        };
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["start"], 10);
        assert_eq!(json["end"], 900);
        assert_eq!(json["speaker"], "A");
    }

    #[test]
    fn media_kind_originals() {
        assert_eq!(
            serde_json::to_string(&MediaKind::ExtractedAudio).unwrap(),
            "\"extracted-audio\""
        );
    }
}
