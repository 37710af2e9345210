//! Structured Logger
//!
//! Console output for operators and a daily rolling NDJSON file for later
//! inspection. `RUST_LOG` wins over the configured level.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "framewise.log";

/// Install the global subscriber. Later calls are no-ops.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs. `None` means the log directory was unusable and only
/// the console receives output.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir.as_ref());

    let (file_layer, guard) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "framewise: file logging disabled ({}): {e}",
                log_dir.as_ref().display()
            );
            (None, None)
        }
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let first = init_logger(dir.path(), "debug");
        let second = init_logger(dir.path(), "not a valid directive ===");
        tracing::info!("logger initialised twice");
        assert!(first.is_some());
        drop(second);
    }
}
