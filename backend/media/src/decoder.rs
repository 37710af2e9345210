//! External media decoder.
//!
//! The pipeline only talks to `MediaDecoder`; `FfmpegDecoder` is the
//! production implementation that shells out to `ffprobe`/`ffmpeg`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Error type for decoder invocations.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("decoder binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("decoder exited with code {exit_code:?}: {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("unusable decoder output: {0}")]
    ParseError(String),

    #[error("decoder did not finish within {0:?}")]
    Timeout(Duration),

    #[error("decoder reported success but wrote nothing to {0}")]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations the analysis pipeline needs from a media decoding tool.
#[async_trait]
pub trait MediaDecoder: Send + Sync {
    /// Container duration in seconds.
    async fn probe_duration(&self, video: &Path) -> Result<f64, DecoderError>;

    /// Write exactly one still image taken at `timestamp_secs` to `output`.
    async fn extract_frame_at(
        &self,
        video: &Path,
        timestamp_secs: f64,
        output: &Path,
    ) -> Result<(), DecoderError>;

    /// Demux and encode the audio track of `video` into `output`.
    async fn extract_audio_track(&self, video: &Path, output: &Path) -> Result<(), DecoderError>;
}

/// `MediaDecoder` backed by the ffmpeg command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout: None,
        }
    }

    /// Kill any single invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout).filter(|t| !t.is_zero());
        self
    }

    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Output, DecoderError> {
        debug!(program = %program.display(), ?args, "Spawning decoder");
        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DecoderError::NotFound)?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| DecoderError::Timeout(limit))??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(DecoderError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: tail(&String::from_utf8_lossy(&output.stderr), 800),
            });
        }
        Ok(output)
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl MediaDecoder for FfmpegDecoder {
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn probe_duration(&self, video: &Path) -> Result<f64, DecoderError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            video.as_os_str().to_owned(),
        ];
        let output = self.run(&self.ffprobe, args).await?;
        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn extract_frame_at(
        &self,
        video: &Path,
        timestamp_secs: f64,
        output: &Path,
    ) -> Result<(), DecoderError> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-ss".into(),
            format!("{timestamp_secs:.3}").into(),
            "-i".into(),
            video.as_os_str().to_owned(),
            "-frames:v".into(),
            "1".into(),
            output.as_os_str().to_owned(),
        ];
        self.run(&self.ffmpeg, args).await?;
        ensure_written(output).await
    }

    async fn extract_audio_track(&self, video: &Path, output: &Path) -> Result<(), DecoderError> {
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            video.as_os_str().to_owned(),
            "-vn".into(),
            "-acodec".into(),
            "libmp3lame".into(),
            output.as_os_str().to_owned(),
        ];
        self.run(&self.ffmpeg, args).await?;
        ensure_written(output).await
    }
}

/// Parse the bare `format=duration` value printed by ffprobe.
pub fn parse_duration_output(stdout: &str) -> Result<f64, DecoderError> {
    let raw = stdout.trim();
    let secs: f64 = raw
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| DecoderError::ParseError(format!("duration {raw:?} is not a number")))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(DecoderError::ParseError(format!("duration {secs} is not positive")));
    }
    Ok(secs)
}

async fn ensure_written(output: &Path) -> Result<(), DecoderError> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(DecoderError::MissingOutput(output.to_path_buf())),
    }
}

fn tail(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    let count = s.chars().count();
    if count <= max_chars {
        s.to_string()
    } else {
        s.chars().skip(count - max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_duration() {
        assert!((parse_duration_output("45.023000\n").unwrap() - 45.023).abs() < 1e-9);
    }

    #[test]
    fn rejects_na_and_zero() {
        assert!(matches!(parse_duration_output("N/A\n"), Err(DecoderError::ParseError(_))));
        assert!(matches!(parse_duration_output("0.000000"), Err(DecoderError::ParseError(_))));
        assert!(matches!(parse_duration_output(""), Err(DecoderError::ParseError(_))));
    }

    #[test]
    fn tail_keeps_end_of_stderr() {
        assert_eq!(tail("  abcdef \n", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let decoder = FfmpegDecoder::new(
            "/nonexistent/framewise-ffmpeg",
            "/nonexistent/framewise-ffprobe",
        );
        let err = decoder.probe_duration(Path::new("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, DecoderError::NotFound(_)));
    }
}
