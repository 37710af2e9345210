//! Locating and reading the config file.

use crate::schema::FramewiseConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FRAMEWISE_CONFIG";

/// Priority: `FRAMEWISE_CONFIG_DIR` env > `<os config dir>/framewise` > `.framewise`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FRAMEWISE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|d| d.join("framewise"))
        .unwrap_or_else(|| PathBuf::from(".framewise"))
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Which file to load: an explicit path, else `FRAMEWISE_CONFIG`, else the
/// default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_file_path(&config_dir()),
    }
}

/// Parse the config at `path`; a missing file yields the empty config.
pub async fn load_config(path: &Path) -> Result<FramewiseConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(FramewiseConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(FramewiseConfig::default());
    }

    let config: FramewiseConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
