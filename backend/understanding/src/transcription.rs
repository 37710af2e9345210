//! Speech analysis through AssemblyAI.
//!
//! Protocol: upload the raw audio, submit a transcript job that references the
//! returned URL, then poll the job until it is `completed` or `error`. Polling
//! is bounded; a job still pending after `max_poll_attempts` checks yields
//! `TranscriptionTimeout`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use framewise_core::{
    Chapter, FramewiseError, Highlight, MediaAsset, SentimentSegment, SpeakerSegment, TimeRange,
    TranscriptResult,
};

/// Turns an audio file into a transcript plus structured speech data.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &MediaAsset) -> Result<TranscriptResult, FramewiseError>;
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 450;

pub struct AssemblyAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AssemblyAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.assemblyai.com/v2".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts.max(1);
        self
    }

    /// Stream the file to `/upload`; it is never buffered whole in memory.
    async fn upload(&self, audio: &MediaAsset) -> Result<String, FramewiseError> {
        let file = tokio::fs::File::open(audio.path()).await?;
        let len = file.metadata().await?.len();
        debug!(path = %audio.path().display(), bytes = len, "Uploading audio to AssemblyAI");

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .header("content-length", len)
            .body(reqwest::Body::from(file))
            .send()
            .await
            .context("AssemblyAI upload request failed")?;
        let body: UploadResponse = read_json(response, "upload").await?;
        Ok(body.upload_url)
    }

    async fn submit(&self, audio_url: &str) -> Result<String, FramewiseError> {
        let request = TranscriptRequest {
            audio_url,
            language_detection: true,
            speaker_labels: true,
            auto_chapters: true,
            auto_highlights: true,
            sentiment_analysis: true,
        };
        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("AssemblyAI transcript request failed")?;
        let job: RawTranscript = read_json(response, "submit").await?;
        job.id
            .ok_or_else(|| FramewiseError::Transcription("transcript job has no id".into()))
    }

    async fn poll(&self, id: &str) -> Result<RawTranscript, FramewiseError> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            let response = self
                .client
                .get(format!("{}/transcript/{id}", self.base_url))
                .header("authorization", &self.api_key)
                .send()
                .await
                .context("AssemblyAI status request failed")?;
            let job: RawTranscript = read_json(response, "status").await?;

            match job.status.as_deref() {
                Some("completed") => {
                    info!(transcript_id = %id, attempt, "Transcription completed");
                    return Ok(job);
                }
                Some("error") => {
                    let message = job.error.unwrap_or_else(|| "AssemblyAI error".to_string());
                    warn!(transcript_id = %id, error = %message, "Transcription failed");
                    return Err(FramewiseError::Transcription(message));
                }
                status => debug!(transcript_id = %id, attempt, ?status, "Transcription pending"),
            }
        }
        Err(FramewiseError::TranscriptionTimeout {
            attempts: self.max_poll_attempts,
        })
    }
}

#[async_trait]
impl Transcriber for AssemblyAiClient {
    async fn transcribe(&self, audio: &MediaAsset) -> Result<TranscriptResult, FramewiseError> {
        let upload_url = self.upload(audio).await?;
        let id = self.submit(&upload_url).await?;
        info!(transcript_id = %id, "Transcription job submitted");
        let job = self.poll(&id).await?;
        Ok(normalize(job))
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
    step: &str,
) -> Result<T, FramewiseError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FramewiseError::Transcription(format!(
            "AssemblyAI {step} returned {status}: {body}"
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| FramewiseError::Transcription(format!("AssemblyAI {step} response: {e}")))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    language_detection: bool,
    speaker_labels: bool,
    auto_chapters: bool,
    auto_highlights: bool,
    sentiment_analysis: bool,
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawTranscript {
    id: Option<String>,
    status: Option<String>,
    error: Option<String>,
    text: Option<String>,
    utterances: Option<Vec<RawUtterance>>,
    chapters: Option<Vec<RawChapter>>,
    auto_highlights_result: Option<RawHighlights>,
    sentiment_analysis_results: Option<Vec<RawSentiment>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUtterance {
    speaker: Option<String>,
    text: Option<String>,
    start: i64,
    end: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawChapter {
    start: i64,
    end: i64,
    headline: Option<String>,
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHighlights {
    results: Option<Vec<RawHighlight>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHighlight {
    text: String,
    count: u32,
    rank: f64,
    timestamps: Option<Vec<TimeRange>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSentiment {
    text: String,
    start: i64,
    end: i64,
    sentiment: String,
    confidence: f64,
}

/// Map a completed job onto `TranscriptResult`, defaulting every absent list.
pub(crate) fn normalize(raw: RawTranscript) -> TranscriptResult {
    TranscriptResult {
        text: raw.text.unwrap_or_default(),
        speakers: raw
            .utterances
            .unwrap_or_default()
            .into_iter()
            .map(|u| SpeakerSegment {
                speaker: u.speaker.filter(|s| !s.is_empty()),
                text: u.text.unwrap_or_default(),
                start_ms: u.start,
                end_ms: u.end,
            })
            .collect(),
        chapters: raw
            .chapters
            .unwrap_or_default()
            .into_iter()
            .map(|c| Chapter {
                start_ms: c.start,
                end_ms: c.end,
                headline: c.headline.unwrap_or_default(),
                summary: c.summary.unwrap_or_default(),
            })
            .collect(),
        highlights: raw
            .auto_highlights_result
            .and_then(|h| h.results)
            .unwrap_or_default()
            .into_iter()
            .map(|h| Highlight {
                text: h.text,
                count: h.count,
                rank: h.rank,
                timestamps: h.timestamps.unwrap_or_default(),
            })
            .collect(),
        sentiments: raw
            .sentiment_analysis_results
            .unwrap_or_default()
            .into_iter()
            .map(|s| SentimentSegment {
                text: s.text,
                start_ms: s.start,
                end_ms: s.end,
                sentiment: s.sentiment,
                confidence: s.confidence,
            })
            .collect(),
    }
}
