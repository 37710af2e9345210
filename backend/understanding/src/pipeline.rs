//! Request orchestration.
//!
//! Video: probe → sample frames → describe frames → (extract audio →
//! transcribe) → compose report → clean up. The audio branch is optional
//! enrichment; any failure there degrades to an empty transcript. Probe,
//! vision and composition failures are fatal. Every exit path deletes the
//! request's derived files and its workspace.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use framewise_core::{
    AnalysisReport, ChatProvider, FramewiseError, MediaAsset, MediaKind, SharedHistory,
    TranscriptResult,
};
use framewise_logging::{PipelineEvent, PipelineEventLogger};
use framewise_media::{
    AudioExtractor, FrameSampler, MediaDecoder, MediaStore, RequestWorkspace, cleanup,
    detect_mime_type, original_kind,
};

use crate::report::{ReportComposer, audio_report_prompt, image_report, video_report_prompt};
use crate::transcription::Transcriber;
use crate::vision::VisionAnalyzer;

pub struct AnalysisPipeline {
    store: MediaStore,
    sampler: FrameSampler,
    audio: AudioExtractor,
    transcriber: Option<Arc<dyn Transcriber>>,
    vision: VisionAnalyzer,
    composer: ReportComposer,
}

impl AnalysisPipeline {
    pub fn new(
        store: MediaStore,
        decoder: Arc<dyn MediaDecoder>,
        provider: Arc<dyn ChatProvider>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Self {
        Self {
            store,
            sampler: FrameSampler::new(decoder.clone()),
            audio: AudioExtractor::new(decoder),
            transcriber,
            vision: VisionAnalyzer::new(provider.clone()),
            composer: ReportComposer::new(provider),
        }
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    pub fn has_transcriber(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Fresh isolated directory for one request's uploads and derived files.
    pub fn workspace(&self) -> Result<RequestWorkspace, FramewiseError> {
        self.store.workspace()
    }

    /// Full video report. Consumes the workspace and removes it on return.
    pub async fn analyze_video(
        &self,
        ws: RequestWorkspace,
        video: MediaAsset,
        prompt: &str,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        PipelineEventLogger::log_event(ws.id(), PipelineEvent::Received { kind: "video".into() });
        let mut derived = Vec::new();
        let result = self.run_video(&ws, &video, prompt, history, &mut derived).await;
        derived.push(video);
        finish(ws, &derived, result).await
    }

    /// Detailed description of one image, prefixed for display.
    pub async fn analyze_image(
        &self,
        ws: RequestWorkspace,
        image: MediaAsset,
        prompt: &str,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        PipelineEventLogger::log_event(ws.id(), PipelineEvent::Received { kind: "image".into() });
        let result = self
            .vision
            .describe(std::slice::from_ref(&image), prompt, history)
            .await
            .map(|vision| {
                PipelineEventLogger::log_event(
                    ws.id(),
                    PipelineEvent::VisionDescribed { images: 1, chars: vision.chars().count() },
                );
                AnalysisReport::text_only(image_report(&vision))
            })
            .inspect_err(|e| fail(ws.id(), "vision", e));
        finish(ws, &[image], result).await
    }

    /// Transcribe a standalone audio file and report on it. Transcription
    /// failure is fatal here since there is nothing else to analyse.
    pub async fn analyze_audio(
        &self,
        ws: RequestWorkspace,
        audio: MediaAsset,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        PipelineEventLogger::log_event(ws.id(), PipelineEvent::Received { kind: "audio".into() });
        let result = self.run_audio(&ws, &audio, history).await;
        finish(ws, &[audio], result).await
    }

    pub async fn chat(
        &self,
        message: &str,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        let reply = self.composer.chat(message, history).await?;
        Ok(AnalysisReport::text_only(reply))
    }

    /// Analyse a local file, choosing the pipeline from its MIME type.
    pub async fn analyze_path(
        &self,
        path: &Path,
        prompt: &str,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        let kind = original_kind(detect_mime_type(path)).ok_or_else(|| {
            FramewiseError::Input(format!("unsupported media type: {}", path.display()))
        })?;
        let data = tokio::fs::read(path).await?;
        let name = path.file_name().and_then(|n| n.to_str());
        let ws = self.workspace()?;
        let asset = ws.save_bytes(data, name, kind).await?;
        match kind {
            MediaKind::OriginalVideo => self.analyze_video(ws, asset, prompt, history).await,
            MediaKind::OriginalImage => self.analyze_image(ws, asset, prompt, history).await,
            _ => self.analyze_audio(ws, asset, history).await,
        }
    }

    async fn run_video(
        &self,
        ws: &RequestWorkspace,
        video: &MediaAsset,
        prompt: &str,
        history: &SharedHistory,
        derived: &mut Vec<MediaAsset>,
    ) -> Result<AnalysisReport, FramewiseError> {
        let sampled = self
            .sampler
            .sample(video, ws)
            .await
            .inspect_err(|e| fail(ws.id(), "probe", e))?;
        derived.extend(sampled.assets());
        PipelineEventLogger::log_event(
            ws.id(),
            PipelineEvent::FramesSampled {
                requested: sampled.requested.len(),
                count: sampled.frames.len(),
                duration_secs: sampled.duration_secs,
            },
        );
        if sampled.frames.is_empty() {
            warn!(request_id = %ws.id(), "No frame could be extracted; describing without images");
        }

        let vision = self
            .vision
            .describe(&sampled.assets(), prompt, history)
            .await
            .inspect_err(|e| fail(ws.id(), "vision", e))?;
        PipelineEventLogger::log_event(
            ws.id(),
            PipelineEvent::VisionDescribed {
                images: sampled.frames.len(),
                chars: vision.chars().count(),
            },
        );

        let detail = self.transcribe_video_audio(ws, video, derived).await;
        let transcript = detail.as_ref().map(|t| t.text.clone()).unwrap_or_default();

        let prompt = video_report_prompt(&sampled.frames, &vision, &transcript);
        let narrative = self
            .composer
            .compose(&prompt, history)
            .await
            .inspect_err(|e| fail(ws.id(), "compose", e))?;
        PipelineEventLogger::log_event(
            ws.id(),
            PipelineEvent::Composed { chars: narrative.chars().count() },
        );

        Ok(AnalysisReport {
            narrative,
            frames: sampled.frames,
            transcript,
            transcript_detail: detail,
            duration_secs: Some(sampled.duration_secs),
        })
    }

    /// Optional audio branch of the video pipeline; `None` means no audio.
    async fn transcribe_video_audio(
        &self,
        ws: &RequestWorkspace,
        video: &MediaAsset,
        derived: &mut Vec<MediaAsset>,
    ) -> Option<TranscriptResult> {
        let absent = |reason: String| {
            PipelineEventLogger::log_event(ws.id(), PipelineEvent::AudioAbsent { reason });
        };

        let Some(transcriber) = &self.transcriber else {
            absent("transcription is not configured".into());
            return None;
        };

        let audio = match self.audio.extract(video, ws).await {
            Ok(audio) => audio,
            Err(e) => {
                absent(e.to_string());
                return None;
            }
        };
        derived.push(audio.clone());
        PipelineEventLogger::log_event(ws.id(), PipelineEvent::AudioExtracted);

        match transcriber.transcribe(&audio).await {
            Ok(result) => {
                PipelineEventLogger::log_event(
                    ws.id(),
                    PipelineEvent::Transcribed { chars: result.text.chars().count() },
                );
                Some(result)
            }
            Err(e) => {
                if !e.is_degradable() {
                    warn!(request_id = %ws.id(), error = %e, "Unexpected transcription failure; continuing without audio");
                }
                absent(e.to_string());
                None
            }
        }
    }

    async fn run_audio(
        &self,
        ws: &RequestWorkspace,
        audio: &MediaAsset,
        history: &SharedHistory,
    ) -> Result<AnalysisReport, FramewiseError> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| FramewiseError::Config("ASSEMBLYAI_API_KEY is not configured".into()))
            .inspect_err(|e| fail(ws.id(), "transcribe", e))?;
        let detail = transcriber
            .transcribe(audio)
            .await
            .inspect_err(|e| fail(ws.id(), "transcribe", e))?;
        PipelineEventLogger::log_event(
            ws.id(),
            PipelineEvent::Transcribed { chars: detail.text.chars().count() },
        );

        let narrative = self
            .composer
            .compose(&audio_report_prompt(&detail.text), history)
            .await
            .inspect_err(|e| fail(ws.id(), "compose", e))?;
        PipelineEventLogger::log_event(
            ws.id(),
            PipelineEvent::Composed { chars: narrative.chars().count() },
        );

        Ok(AnalysisReport {
            narrative,
            frames: Vec::new(),
            transcript: detail.text.clone(),
            transcript_detail: Some(detail),
            duration_secs: None,
        })
    }
}

fn fail(request_id: &str, stage: &str, error: &FramewiseError) {
    PipelineEventLogger::log_event(
        request_id,
        PipelineEvent::Failed {
            stage: stage.into(),
            error: error.to_string(),
        },
    );
}

async fn finish(
    ws: RequestWorkspace,
    assets: &[MediaAsset],
    result: Result<AnalysisReport, FramewiseError>,
) -> Result<AnalysisReport, FramewiseError> {
    cleanup(assets).await;
    PipelineEventLogger::log_event(ws.id(), PipelineEvent::Cleaned { files: assets.len() });
    info!(request_id = %ws.id(), ok = result.is_ok(), "Request finished");
    ws.close().await;
    result
}
