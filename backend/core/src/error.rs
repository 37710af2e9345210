use thiserror::Error;

/// Top-level error type for the framewise analysis pipeline.
///
/// The variants follow the request-level taxonomy: `Input` is the caller's
/// fault, the extraction/transcription kinds describe optional enrichment that
/// may be degraded away, and `RemoteAnalysis` is always fatal.
#[derive(Debug, Error)]
pub enum FramewiseError {
    /// No usable file (or other malformed input) was supplied.
    #[error("{0}")]
    Input(String),

    #[error("failed to probe media duration: {0}")]
    Probe(String),

    #[error("frame extraction failed: {0}")]
    Extraction(String),

    #[error("audio extraction failed: {0}")]
    AudioExtraction(String),

    /// The speech service reported a failed job; carries its message.
    #[error("{0}")]
    Transcription(String),

    #[error("transcription still pending after {attempts} status checks")]
    TranscriptionTimeout { attempts: u32 },

    /// Vision or chat-completion failure; the message is surfaced verbatim.
    #[error("{0}")]
    RemoteAnalysis(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramewiseError {
    /// Whether the failure was caused by the request itself rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, FramewiseError::Input(_))
    }

    /// Whether the failure only costs an optional enrichment (frame, audio, transcript).
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            FramewiseError::Extraction(_)
                | FramewiseError::AudioExtraction(_)
                | FramewiseError::Transcription(_)
                | FramewiseError::TranscriptionTimeout { .. }
        )
    }

    /// Wrap any displayable remote failure as a fatal analysis error.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        FramewiseError::RemoteAnalysis(format!("{err:#}"))
    }
}
