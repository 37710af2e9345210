//! Audio track extraction.
//!
//! Many clips (screen recordings, GIF-like exports) carry no audio stream at
//! all; callers are expected to treat `AudioExtraction` as a normal outcome.

use std::sync::Arc;

use tracing::{debug, info};

use framewise_core::{FramewiseError, MediaAsset, MediaKind};

use crate::decoder::MediaDecoder;
use crate::store::RequestWorkspace;

#[derive(Clone)]
pub struct AudioExtractor {
    decoder: Arc<dyn MediaDecoder>,
}

impl AudioExtractor {
    pub fn new(decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { decoder }
    }

    /// Transcode the audio of `video` into an mp3 inside `workspace`.
    pub async fn extract(
        &self,
        video: &MediaAsset,
        workspace: &RequestWorkspace,
    ) -> Result<MediaAsset, FramewiseError> {
        let output = workspace.audio_path();
        debug!(video = %video.path().display(), output = %output.display(), "Extracting audio track");
        self.decoder
            .extract_audio_track(video.path(), &output)
            .await
            .map_err(|e| FramewiseError::AudioExtraction(e.to_string()))?;

        info!(request_id = %workspace.id(), path = %output.display(), "Audio track extracted");
        Ok(MediaAsset::new(output, MediaKind::ExtractedAudio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::FakeDecoder;
    use crate::store::MediaStore;

    #[tokio::test]
    async fn extracts_into_workspace() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let ws = store.workspace().unwrap();
        let video = MediaAsset::new(ws.path().join("v.mp4"), MediaKind::OriginalVideo);

        let extractor = AudioExtractor::new(Arc::new(FakeDecoder::with_duration(10.0)));
        let audio = extractor.extract(&video, &ws).await.unwrap();
        assert_eq!(audio.kind, MediaKind::ExtractedAudio);
        assert!(audio.path.starts_with(ws.path()));
        assert!(audio.path.exists());
    }

    #[tokio::test]
    async fn silent_video_is_audio_extraction_error() {
        let root = tempfile::tempdir().unwrap();
        let store = MediaStore::open(root.path()).await.unwrap();
        let ws = store.workspace().unwrap();
        let video = MediaAsset::new(ws.path().join("v.mp4"), MediaKind::OriginalVideo);

        let mut decoder = FakeDecoder::with_duration(10.0);
        decoder.has_audio = false;
        let extractor = AudioExtractor::new(Arc::new(decoder));
        let err = extractor.extract(&video, &ws).await.unwrap_err();
        assert!(matches!(err, FramewiseError::AudioExtraction(_)));
        assert!(err.is_degradable());
    }
}
