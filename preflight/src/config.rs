//! Preflight configuration stored in `preflight.toml`.
//!
//! Every field has a default, so a missing file is valid. Command-line flags
//! override file values before validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use probe::logging::LogOptions;
use serde::Deserialize;

use crate::checks::Budget;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 50_000;

/// Preflight configuration (TOML).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreflightConfig {
    /// Directory scanned for `*.toml` suite files.
    pub suites_dir: PathBuf,

    /// Default per-command timeout for `command` checks, in seconds.
    pub command_timeout_secs: u64,

    /// Bytes kept per command output pipe; also the most `file_readable` reads.
    pub output_limit_bytes: usize,

    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset.
    pub level: String,
    /// Optional file receiving a copy of the log.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            suites_dir: PathBuf::from("suites"),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            log: LogConfig::default(),
        }
    }
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub suites_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl PreflightConfig {
    pub fn validate(&self) -> Result<()> {
        if self.suites_dir.as_os_str().is_empty() {
            return Err(anyhow!("suites_dir must be non-empty"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(anyhow!(
                "log.level must be one of {}",
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }

    /// Per-check budget handed to every probe of a run.
    pub fn budget(&self) -> Budget {
        Budget {
            timeout: Duration::from_secs(self.command_timeout_secs),
            byte_limit: self.output_limit_bytes,
        }
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.log.level.clone(),
            file: self.log.file.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PreflightConfig::default()`.
pub fn load_config(path: &Path) -> Result<PreflightConfig> {
    if !path.exists() {
        let cfg = PreflightConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PreflightConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Apply command-line overrides to a loaded config.
pub fn apply_overrides(mut base: PreflightConfig, overrides: &Overrides) -> Result<PreflightConfig> {
    if let Some(suites_dir) = &overrides.suites_dir {
        base.suites_dir = suites_dir.clone();
    }
    if let Some(log_file) = &overrides.log_file {
        base.log.file = Some(log_file.clone());
    }
    if let Some(log_level) = &overrides.log_level {
        base.log.level = log_level.clone();
    }
    base.validate()?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PreflightConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("preflight.toml");
        fs::write(&path, "command_timeout_secs = 5\n\n[log]\nfile = \"probes.log\"\n")
            .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.command_timeout_secs, 5);
        assert_eq!(cfg.output_limit_bytes, 50_000);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.file, Some(PathBuf::from("probes.log")));
        assert_eq!(cfg.budget().timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_invalid_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("preflight.toml");
        fs::write(&path, "command_timeout_secs = 0\n").expect("write");
        let err = load_config(&path).expect_err("zero timeout");
        assert!(format!("{err:#}").contains("command_timeout_secs"));

        fs::write(&path, "[log]\nlevel = \"loud\"\n").expect("write");
        let err = load_config(&path).expect_err("bad level");
        assert!(format!("{err:#}").contains("log.level"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = Overrides {
            suites_dir: Some(PathBuf::from("/opt/suites")),
            log_file: Some(PathBuf::from("run.log")),
            log_level: Some("debug".to_string()),
        };
        let merged = apply_overrides(PreflightConfig::default(), &overrides).expect("merge");
        assert_eq!(merged.suites_dir, PathBuf::from("/opt/suites"));
        assert_eq!(merged.log_options().file, Some(PathBuf::from("run.log")));
        assert_eq!(merged.log_options().level, "debug");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let overrides = Overrides {
            log_level: Some("verbose".to_string()),
            ..Overrides::default()
        };
        apply_overrides(PreflightConfig::default(), &overrides).expect_err("bad level");
    }
}
