//! `framewise-config`: runtime configuration for the framewise service.
//!
//! Load order: YAML file → `${ENV}` substitution → environment overrides →
//! defaults → validation.

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, resolve_config_path};
pub use overrides::{apply_env_overrides, apply_env_overrides_with};
pub use schema::FramewiseConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load the file at `path` and prepare it against the process environment.
///
/// Validation errors abort; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<FramewiseConfig> {
    let raw = load_config(path).await?;
    prepare(raw, &std::env::vars().collect())
}

/// Everything after parsing, against an explicit environment map.
pub fn prepare(raw: FramewiseConfig, env: &HashMap<String, String>) -> Result<FramewiseConfig> {
    let value = serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: FramewiseConfig = serde_json::from_value(value)
        .context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(apply_env_overrides_with(config, env));

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let summary: Vec<String> = report.errors.iter().map(|e| e.to_string()).collect();
        bail!("Invalid configuration: {}", summary.join("; "));
    }

    Ok(config)
}
