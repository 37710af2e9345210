//! Success envelope shared by every analysis endpoint:
//! `{ok: true, response, extra}`.

use serde::Serialize;

use framewise_core::{AnalysisReport, TranscriptResult};

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub ok: bool,
    pub response: String,
    pub extra: Extra,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Extra {
    Media(MediaExtra),
    Empty(Empty),
}

/// Serializes as `{}`.
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct MediaExtra {
    /// Frame file paths, chronological.
    pub frames: Vec<String>,
    pub transcript: String,
    pub frames_meta: Vec<FrameMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Structured speech data, `null` when there was no usable audio.
    pub audio: Option<TranscriptResult>,
}

#[derive(Debug, Serialize)]
pub struct FrameMeta {
    pub path: String,
    pub t: f64,
}

impl AnalysisResponse {
    pub fn chat(report: AnalysisReport) -> Self {
        Self {
            ok: true,
            response: report.narrative,
            extra: Extra::Empty(Empty {}),
        }
    }

    /// Image, video and audio reports all carry the media extra.
    pub fn media(report: AnalysisReport) -> Self {
        let frames_meta: Vec<FrameMeta> = report
            .frames
            .iter()
            .map(|f| FrameMeta {
                path: f.asset.path.display().to_string(),
                t: f.timestamp_secs,
            })
            .collect();
        Self {
            ok: true,
            response: report.narrative,
            extra: Extra::Media(MediaExtra {
                frames: frames_meta.iter().map(|m| m.path.clone()).collect(),
                transcript: report.transcript,
                frames_meta,
                duration: report.duration_secs,
                audio: report.transcript_detail,
            }),
        }
    }
}
