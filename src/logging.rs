use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Daily-rolling log files go here; `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
    /// Used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            file_name: "zcomp.log".to_string(),
            default_filter: "zcomp=info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Installs the global subscriber. Returns `None` if the log dir cannot be
/// created or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Option<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let Some(log_dir) = &config.log_dir else {
        let subscriber = tracing_subscriber::registry().with(env_filter).with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true),
        );
        subscriber.try_init().ok()?;
        return Some(LoggingGuard {
            _guard: None,
            log_dir: None,
        });
    };

    std::fs::create_dir_all(log_dir).ok()?;
    let file_appender = tracing_appender::rolling::daily(log_dir, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    );
    subscriber.try_init().ok()?;

    tracing::info!(log_dir = %log_dir.display(), "tracing initialized");

    Some(LoggingGuard {
        _guard: Some(guard),
        log_dir: Some(log_dir.clone()),
    })
}

#[cfg(test)]
#[path = "../tests/unit/logging.rs"]
mod tests;
