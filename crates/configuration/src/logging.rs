use crate::error::ConfigError;
use crate::settings::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "refugio.log";

/// Installs the global tracing subscriber.
///
/// Timestamps are written in local time. `RUST_LOG` wins over `config.level`. When a log
/// directory is configured a daily rolling file is written next to stdout; the returned guard
/// must be kept alive until shutdown or buffered lines are lost.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339())
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_timer(LocalTime::rfc_3339()))
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        directory = ?config.directory,
        "Tracing initialised"
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_installs_once_with_a_file_layer() {
        let directory = std::env::temp_dir().join("refugio-logging-test");
        let config = LoggingConfig {
            level: "debug".to_string(),
            directory: Some(directory.to_string_lossy().into_owned()),
        };

        let guard = init_tracing(&config).unwrap();
        assert!(guard.is_some());
        tracing::info!("local timestamps");

        let again = init_tracing(&LoggingConfig::default());
        assert!(matches!(again, Err(ConfigError::LoggingError(_))));
    }
}
