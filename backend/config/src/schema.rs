//! framewise runtime configuration schema.
//!
//! Every field is optional on disk; `apply_all_defaults` fills the gaps and
//! the accessors below fall back to the same defaults, so callers never see
//! a missing value.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::*;

/// Root configuration (`config.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FramewiseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assemblyai: Option<AssemblyAiConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// HTTP listener and static client hosting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

/// Chat-completions provider used for vision, reports and chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Speech-analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyAiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,
}

/// Scratch storage and decoder binaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
    /// Sessions kept in memory; the least recently used go first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sessions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_idle_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl FramewiseConfig {
    // --- server ---

    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    /// `bind:port`, ready for a TCP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind(), self.port())
    }

    pub fn static_dir(&self) -> PathBuf {
        self.server
            .as_ref()
            .and_then(|s| s.static_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    // --- openai ---

    pub fn openai_api_key(&self) -> Option<&str> {
        non_empty(self.openai.as_ref().and_then(|o| o.api_key.as_ref()))
    }

    pub fn openai_base_url(&self) -> &str {
        self.openai
            .as_ref()
            .and_then(|o| o.base_url.as_deref())
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }

    pub fn openai_model(&self) -> &str {
        self.openai
            .as_ref()
            .and_then(|o| o.model.as_deref())
            .unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    pub fn openai_timeout(&self) -> Duration {
        Duration::from_secs(
            self.openai
                .as_ref()
                .and_then(|o| o.timeout_secs)
                .unwrap_or(DEFAULT_OPENAI_TIMEOUT_SECS),
        )
    }

    // --- assemblyai ---

    pub fn assemblyai_api_key(&self) -> Option<&str> {
        non_empty(self.assemblyai.as_ref().and_then(|a| a.api_key.as_ref()))
    }

    pub fn assemblyai_base_url(&self) -> &str {
        self.assemblyai
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_ASSEMBLYAI_BASE_URL)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.assemblyai
                .as_ref()
                .and_then(|a| a.poll_interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        )
    }

    pub fn max_poll_attempts(&self) -> u32 {
        self.assemblyai
            .as_ref()
            .and_then(|a| a.max_poll_attempts)
            .unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS)
    }

    // --- media ---

    pub fn work_dir(&self) -> PathBuf {
        self.media
            .as_ref()
            .and_then(|m| m.work_dir.clone())
            .unwrap_or_else(default_work_dir)
    }

    pub fn ffmpeg_path(&self) -> PathBuf {
        self.media
            .as_ref()
            .and_then(|m| m.ffmpeg_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG))
    }

    pub fn ffprobe_path(&self) -> PathBuf {
        self.media
            .as_ref()
            .and_then(|m| m.ffprobe_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFPROBE))
    }

    pub fn decoder_timeout(&self) -> Duration {
        Duration::from_secs(
            self.media
                .as_ref()
                .and_then(|m| m.decoder_timeout_secs)
                .unwrap_or(DEFAULT_DECODER_TIMEOUT_SECS),
        )
    }

    // --- history / logging ---

    pub fn history_max_turns(&self) -> usize {
        self.history
            .as_ref()
            .and_then(|h| h.max_turns)
            .unwrap_or(DEFAULT_HISTORY_MAX_TURNS)
    }

    pub fn max_sessions(&self) -> u64 {
        self.history
            .as_ref()
            .and_then(|h| h.max_sessions)
            .unwrap_or(DEFAULT_MAX_SESSIONS)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(
            self.history
                .as_ref()
                .and_then(|h| h.session_idle_secs)
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        )
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }
}
