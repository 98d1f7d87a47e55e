//! Log output for probe runs.
//!
//! Probe progress is the product output of a run, so events go to stdout at
//! `info` by default. A log file can be added; it receives the same events
//! without ANSI colors.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`).
    pub level: String,
    /// Optional file receiving a copy of every event.
    pub file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Install the global subscriber.
///
/// Reads `RUST_LOG` when set, otherwise `options.level`.
///
/// # Example
/// ```bash
/// RUST_LOG=debug preflight run sbc
/// ```
pub fn init(options: &LogOptions) -> Result<()> {
    let subscriber = subscriber(options)?;
    tracing::subscriber::set_global_default(subscriber).context("install tracing subscriber")
}

/// Build the subscriber without installing it.
pub fn subscriber(options: &LogOptions) -> Result<impl Subscriber + Send + Sync + 'static> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level)
            .with_context(|| format!("parse log level {:?}", options.level))?,
    };

    let file_layer = match &options.file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(file_appender(path)?)
                .with_ansi(false)
                .compact(),
        ),
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(std::io::stdout().is_terminal())
                .compact(),
        )
        .with(file_layer))
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_receives_events() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("probes.log");
        let options = LogOptions {
            level: "info".to_string(),
            file: Some(path.clone()),
        };

        let subscriber = subscriber(&options).expect("subscriber");
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(probe = "gpio", "probe started");
        });

        let contents = fs::read_to_string(&path).expect("read log");
        assert!(contents.contains("probe started"), "log: {contents}");
        assert!(contents.contains("gpio"), "log: {contents}");
    }

    #[test]
    fn rejects_path_without_file_name() {
        let options = LogOptions {
            level: "info".to_string(),
            file: Some(PathBuf::from("/")),
        };
        assert!(subscriber(&options).is_err());
    }
}
