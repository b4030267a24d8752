//! Logging setup for the CLI.
//!
//! Console output goes to stderr so it never mixes with prompts. An optional
//! daily rolling file `nsguard.log` captures the same events without colors.
//!
//! Log files are stored in `~/nsguard/logs` by default.
//! Override with `NSGUARD_LOG_DIR` or `log.dir` config.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const LOG_FILE_NAME: &str = "nsguard.log";

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(format!("{}/nsguard/logs", home))
}

/// Logging configuration for the CLI.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log directory (default: `~/nsguard/logs`)
    pub log_dir: PathBuf,
    /// Enable console output on stderr
    pub console_output: bool,
    /// Enable the rolling log file
    pub file_logging: bool,
    /// Level used when `RUST_LOG` is unset
    pub level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            file_logging: false,
            level: Level::WARN,
        }
    }
}

impl LoggingConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        let log_dir = std::env::var("NSGUARD_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_log_dir());

        let console_output = std::env::var("NSGUARD_LOG_CONSOLE")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        let file_logging = std::env::var("NSGUARD_LOG_FILE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let level = std::env::var("NSGUARD_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Level::WARN);

        Self {
            log_dir,
            console_output,
            file_logging,
            level,
        }
    }

    /// Create from application configuration.
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
    ) -> Self {
        Self {
            log_dir: log_dir.map(PathBuf::from).unwrap_or_else(default_log_dir),
            console_output,
            file_logging,
            level: level.parse().unwrap_or(Level::WARN),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }
}

/// Keeps the file writer alive; buffered output is flushed on drop.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut file_guard = None;

    if config.console_output {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(config.filter());
        layers.push(Box::new(console_layer));
    }

    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false)
            .with_filter(config.filter());
        layers.push(Box::new(file_layer));
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(log_dir = %config.log_dir.display(), "File logging initialized");
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.console_output);
        assert!(!config.file_logging);
        assert_eq!(config.level, Level::WARN);
        assert!(config.log_dir.ends_with("nsguard/logs"));
    }

    #[test]
    fn test_logging_config_from_config() {
        let config = LoggingConfig::from_config(
            Some("/tmp/nsguard-logs".to_string()),
            false,
            true,
            "debug".to_string(),
        );
        assert_eq!(config.log_dir, PathBuf::from("/tmp/nsguard-logs"));
        assert!(!config.console_output);
        assert!(config.file_logging);
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig::from_config(None, true, false, "loud".to_string());
        assert_eq!(config.level, Level::WARN);
    }
}
