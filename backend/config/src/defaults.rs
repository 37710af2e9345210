//! Config defaults: applies the built-in values to a parsed config.

use std::path::PathBuf;

use crate::schema::{
    AssemblyAiConfig, FramewiseConfig, HistoryConfig, LoggingConfig, MediaConfig, OpenAiConfig,
    ServerConfig,
};

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_ASSEMBLYAI_BASE_URL: &str = "https://api.assemblyai.com/v2";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
/// 450 checks at the default interval is fifteen minutes.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 450;

pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const DEFAULT_FFPROBE: &str = "ffprobe";
pub const DEFAULT_DECODER_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_HISTORY_MAX_TURNS: usize = 24;
pub const DEFAULT_MAX_SESSIONS: u64 = 1000;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("framewise")
}

/// Fill every unset field with its default.
pub fn apply_all_defaults(config: FramewiseConfig) -> FramewiseConfig {
    let config = apply_server_defaults(config);
    let config = apply_provider_defaults(config);
    let config = apply_media_defaults(config);
    apply_misc_defaults(config)
}

fn apply_server_defaults(mut config: FramewiseConfig) -> FramewiseConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server
        .static_dir
        .get_or_insert_with(|| PathBuf::from(DEFAULT_STATIC_DIR));
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

fn apply_provider_defaults(mut config: FramewiseConfig) -> FramewiseConfig {
    let openai = config.openai.get_or_insert_with(OpenAiConfig::default);
    openai
        .base_url
        .get_or_insert_with(|| DEFAULT_OPENAI_BASE_URL.to_string());
    openai
        .model
        .get_or_insert_with(|| DEFAULT_OPENAI_MODEL.to_string());
    openai.timeout_secs.get_or_insert(DEFAULT_OPENAI_TIMEOUT_SECS);

    let assemblyai = config.assemblyai.get_or_insert_with(AssemblyAiConfig::default);
    assemblyai
        .base_url
        .get_or_insert_with(|| DEFAULT_ASSEMBLYAI_BASE_URL.to_string());
    assemblyai.poll_interval_ms.get_or_insert(DEFAULT_POLL_INTERVAL_MS);
    assemblyai.max_poll_attempts.get_or_insert(DEFAULT_MAX_POLL_ATTEMPTS);
    config
}

fn apply_media_defaults(mut config: FramewiseConfig) -> FramewiseConfig {
    let media = config.media.get_or_insert_with(MediaConfig::default);
    media.work_dir.get_or_insert_with(default_work_dir);
    media
        .ffmpeg_path
        .get_or_insert_with(|| PathBuf::from(DEFAULT_FFMPEG));
    media
        .ffprobe_path
        .get_or_insert_with(|| PathBuf::from(DEFAULT_FFPROBE));
    media.decoder_timeout_secs.get_or_insert(DEFAULT_DECODER_TIMEOUT_SECS);
    config
}

fn apply_misc_defaults(mut config: FramewiseConfig) -> FramewiseConfig {
    let history = config.history.get_or_insert_with(HistoryConfig::default);
    history.max_turns.get_or_insert(DEFAULT_HISTORY_MAX_TURNS);
    history.max_sessions.get_or_insert(DEFAULT_MAX_SESSIONS);
    history.session_idle_secs.get_or_insert(DEFAULT_SESSION_IDLE_SECS);

    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| PathBuf::from(DEFAULT_LOG_DIR));
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(FramewiseConfig::default());
        assert_eq!(cfg.server.as_ref().unwrap().port, Some(DEFAULT_PORT));
        assert_eq!(
            cfg.openai.as_ref().unwrap().model.as_deref(),
            Some(DEFAULT_OPENAI_MODEL)
        );
        assert_eq!(
            cfg.assemblyai.as_ref().unwrap().max_poll_attempts,
            Some(DEFAULT_MAX_POLL_ATTEMPTS)
        );
        assert_eq!(cfg.history.as_ref().unwrap().max_turns, Some(24));
        assert_eq!(cfg.history.as_ref().unwrap().max_sessions, Some(DEFAULT_MAX_SESSIONS));
        assert!(cfg.media.as_ref().unwrap().work_dir.is_some());
        assert_eq!(cfg.openai.as_ref().unwrap().api_key, None);
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = FramewiseConfig {
            server: Some(ServerConfig {
                port: Some(8080),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.port(), 8080);
        assert_eq!(cfg.bind(), DEFAULT_BIND);
    }
}
