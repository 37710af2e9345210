//! Config validation: errors abort startup, warnings are only logged.

use crate::schema::FramewiseConfig;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &FramewiseConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_providers(config, &mut report);
    validate_server(config, &mut report);
    validate_limits(config, &mut report);
    report
}

fn validate_providers(config: &FramewiseConfig, report: &mut ValidationReport) {
    if config.openai_api_key().is_none() {
        report.error(
            "openai.apiKey",
            "OpenAI API key is required (set OPENAI_API_KEY)",
        );
    }
    if config.assemblyai_api_key().is_none() {
        report.warn(
            "assemblyai.apiKey",
            "No AssemblyAI key; video audio will be skipped and /upload-audio will fail",
        );
    }
    for (path, url) in [
        ("openai.baseUrl", config.openai_base_url()),
        ("assemblyai.baseUrl", config.assemblyai_base_url()),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error(path, format!("'{url}' is not an http(s) URL"));
        }
    }
}

fn validate_server(config: &FramewiseConfig, report: &mut ValidationReport) {
    let port = config.port();
    if port == 0 {
        report.error("server.port", "port must be > 0");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    if config.max_upload_bytes() == 0 {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
}

fn validate_limits(config: &FramewiseConfig, report: &mut ValidationReport) {
    if config.max_poll_attempts() == 0 {
        report.error("assemblyai.maxPollAttempts", "maxPollAttempts must be >= 1");
    }
    if config.poll_interval().is_zero() {
        report.warn("assemblyai.pollIntervalMs", "pollIntervalMs of 0 polls in a busy loop");
    }
    if config.history_max_turns() == 0 {
        report.error("history.maxTurns", "maxTurns must be >= 1");
    }
    if config.max_sessions() == 0 {
        report.error("history.maxSessions", "maxSessions must be >= 1");
    }
    if config.session_idle().is_zero() {
        report.error("history.sessionIdleSecs", "sessionIdleSecs must be > 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AssemblyAiConfig, OpenAiConfig};

    fn with_keys(openai: Option<&str>, assemblyai: Option<&str>) -> FramewiseConfig {
        FramewiseConfig {
            openai: Some(OpenAiConfig {
                api_key: openai.map(String::from),
                ..Default::default()
            }),
            assemblyai: Some(AssemblyAiConfig {
                api_key: assemblyai.map(String::from),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn fully_keyed_config_is_clean() {
        let report = validate(&with_keys(Some("sk-x"), Some("aai")));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_openai_key_is_error() {
        let report = validate(&with_keys(None, Some("aai")));
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "openai.apiKey");
    }

    #[test]
    fn missing_assemblyai_key_is_warning() {
        let report = validate(&with_keys(Some("sk-x"), None));
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "assemblyai.apiKey");
    }

    #[test]
    fn bad_base_url_is_error() {
        let mut cfg = with_keys(Some("sk-x"), Some("aai"));
        cfg.openai.as_mut().unwrap().base_url = Some("api.openai.com".into());
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "openai.baseUrl"));
    }
}
