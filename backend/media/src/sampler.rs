//! Duration-scaled frame sampling.
//!
//! A video is reduced to a handful of evenly spaced stills. Longer videos get
//! more stills, but never more than ten, which caps the image payload of the
//! vision call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use framewise_core::{FrameSample, FramewiseError, MediaAsset, MediaKind};

use crate::decoder::MediaDecoder;
use crate::store::RequestWorkspace;

/// No frame is taken earlier than this; the very first frame is often black.
pub const MIN_TIMESTAMP_SECS: f64 = 0.1;

/// Upper duration bound (inclusive, seconds) → number of frames.
const SAMPLING_TABLE: [(f64, usize); 4] = [(5.0, 1), (30.0, 3), (120.0, 5), (600.0, 7)];

/// Frame count for anything longer than the last table entry.
const MAX_FRAMES: usize = 10;

/// How many frames to take from a video of `duration_secs`.
pub fn sample_count(duration_secs: f64) -> usize {
    SAMPLING_TABLE
        .iter()
        .find(|(bound, _)| duration_secs <= *bound)
        .map(|(_, count)| *count)
        .unwrap_or(MAX_FRAMES)
}

/// `count` evenly spaced timestamps at `duration / (count + 1) * i`.
///
/// Values are clamped up to [`MIN_TIMESTAMP_SECS`]. A clamped value that
/// would not be strictly later than its predecessor, or would not fall before
/// the end of the video, is dropped, so very short clips may yield fewer
/// timestamps than requested.
pub fn timestamps(duration_secs: f64, count: usize) -> Vec<f64> {
    if duration_secs.is_nan() || duration_secs <= 0.0 || count == 0 {
        return Vec::new();
    }
    let step = duration_secs / (count + 1) as f64;
    let mut out: Vec<f64> = Vec::with_capacity(count);
    for i in 1..=count {
        let t = (step * i as f64).max(MIN_TIMESTAMP_SECS);
        let later = out.last().is_none_or(|prev| t > *prev);
        if later && t < duration_secs {
            out.push(t);
        }
    }
    out
}

/// Frames taken from one video together with its probed duration.
#[derive(Debug, Clone)]
pub struct SampledFrames {
    pub duration_secs: f64,
    /// Requested timestamps, including those whose extraction failed.
    pub requested: Vec<f64>,
    /// Successfully extracted frames, in chronological order.
    pub frames: Vec<FrameSample>,
}

impl SampledFrames {
    pub fn assets(&self) -> Vec<MediaAsset> {
        self.frames.iter().map(|f| f.asset.clone()).collect()
    }
}

/// Probes a video and extracts its sample frames through a `MediaDecoder`.
#[derive(Clone)]
pub struct FrameSampler {
    decoder: Arc<dyn MediaDecoder>,
}

impl FrameSampler {
    pub fn new(decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { decoder }
    }

    /// Duration of `video` in seconds; failure is reported, never defaulted.
    pub async fn probe_duration(&self, video: &MediaAsset) -> Result<f64, FramewiseError> {
        self.decoder
            .probe_duration(video.path())
            .await
            .map_err(|e| FramewiseError::Probe(e.to_string()))
    }

    /// One still at `timestamp_secs`, or `None` if the decoder could not produce it.
    pub async fn extract_frame(
        &self,
        video: &MediaAsset,
        timestamp_secs: f64,
        output: std::path::PathBuf,
    ) -> Option<MediaAsset> {
        match self
            .decoder
            .extract_frame_at(video.path(), timestamp_secs, &output)
            .await
        {
            Ok(()) if output.exists() => Some(MediaAsset::new(output, MediaKind::ExtractedFrame)),
            Ok(()) => {
                warn!(timestamp_secs, path = %output.display(), "Decoder produced no frame file");
                None
            }
            Err(e) => {
                warn!(timestamp_secs, error = %e, "Frame extraction failed; omitting frame");
                None
            }
        }
    }

    /// Probe, compute timestamps, and extract every frame sequentially.
    ///
    /// Frames that fail are left out of the timeline, not retried.
    pub async fn sample(
        &self,
        video: &MediaAsset,
        workspace: &RequestWorkspace,
    ) -> Result<SampledFrames, FramewiseError> {
        let duration_secs = self.probe_duration(video).await?;
        let requested = timestamps(duration_secs, sample_count(duration_secs));
        debug!(duration_secs, ?requested, "Sampling frames");

        let mut frames = Vec::with_capacity(requested.len());
        for (i, &t) in requested.iter().enumerate() {
            let output = workspace.frame_path(i + 1);
            if let Some(asset) = self.extract_frame(video, t, output).await {
                frames.push(FrameSample {
                    asset,
                    timestamp_secs: t,
                });
            }
        }

        info!(
            request_id = %workspace.id(),
            duration_secs,
            requested = requested.len(),
            extracted = frames.len(),
            "Frames sampled"
        );
        Ok(SampledFrames {
            duration_secs,
            requested,
            frames,
        })
    }
}
