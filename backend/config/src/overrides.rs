//! Environment overrides applied after the file has been read.
//!
//! These keep the conventional variable names working (`PORT`,
//! `OPENAI_API_KEY`, `ASSEMBLYAI_API_KEY`, ...) so a bare `.env` file is
//! enough to run the service without any YAML.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use crate::schema::{
    AssemblyAiConfig, FramewiseConfig, LoggingConfig, MediaConfig, OpenAiConfig, ServerConfig,
};

pub fn apply_env_overrides(config: FramewiseConfig) -> FramewiseConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

pub fn apply_env_overrides_with(
    mut config: FramewiseConfig,
    env: &HashMap<String, String>,
) -> FramewiseConfig {
    let get = |name: &str| {
        env.get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(port) = get("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.server.get_or_insert_with(ServerConfig::default).port = Some(port),
            Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
        }
    }
    if let Some(bind) = get("FRAMEWISE_BIND") {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind);
    }

    if let Some(key) = get("OPENAI_API_KEY") {
        openai(&mut config).api_key = Some(key);
    }
    if let Some(url) = get("OPENAI_BASE_URL") {
        openai(&mut config).base_url = Some(url);
    }
    if let Some(model) = get("OPENAI_MODEL") {
        openai(&mut config).model = Some(model);
    }

    if let Some(key) = get("ASSEMBLYAI_API_KEY") {
        config
            .assemblyai
            .get_or_insert_with(AssemblyAiConfig::default)
            .api_key = Some(key);
    }

    if let Some(dir) = get("FRAMEWISE_WORK_DIR") {
        media(&mut config).work_dir = Some(PathBuf::from(dir));
    }
    if let Some(path) = get("FFMPEG_PATH") {
        media(&mut config).ffmpeg_path = Some(PathBuf::from(path));
    }
    if let Some(path) = get("FFPROBE_PATH") {
        media(&mut config).ffprobe_path = Some(PathBuf::from(path));
    }

    if let Some(level) = get("RUST_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }

    config
}

fn openai(config: &mut FramewiseConfig) -> &mut OpenAiConfig {
    config.openai.get_or_insert_with(OpenAiConfig::default)
}

fn media(config: &mut FramewiseConfig) -> &mut MediaConfig {
    config.media.get_or_insert_with(MediaConfig::default)
}
