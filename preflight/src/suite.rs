//! Suite file parsing and validation.
//!
//! Suites are TOML files declaring one batch of host checks.
//! See `suites/` for examples.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::warn;

/// A parsed suite file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SuiteFile {
    pub suite: SuiteMeta,
    #[serde(default)]
    pub probes: Vec<ProbeSpec>,
}

/// Suite metadata.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SuiteMeta {
    /// Unique identifier (slug format: `[a-z0-9_-]+`).
    pub id: String,
    /// Human-readable label used in batch logs.
    #[serde(default)]
    pub description: String,
}

/// A declared probe: a log name plus the check it runs.
///
/// Names are free-form; empty and duplicate names are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProbeSpec {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub check: Check,
}

/// Host check performed by a probe.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// Run a command; passes when it exits 0 within its timeout.
    Command {
        cmd: Vec<String>,
        timeout_secs: Option<u64>,
    },
    /// Passes when the path exists.
    FileExists { path: PathBuf },
    /// Passes when the file can be read.
    FileReadable { path: PathBuf },
    /// Passes when the environment variable is set.
    EnvVar { var: String },
}

impl SuiteFile {
    /// Load and validate a suite file from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read suite {}", path.display()))?;
        Self::parse_str(&contents).with_context(|| format!("load suite {}", path.display()))
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let suite: SuiteFile = toml::from_str(contents).context("parse suite")?;
        suite.validate()?;
        Ok(suite)
    }

    /// Label for batch logs: the description, or the id when it is empty.
    pub fn label(&self) -> &str {
        if self.suite.description.trim().is_empty() {
            &self.suite.id
        } else {
            &self.suite.description
        }
    }

    fn validate(&self) -> Result<()> {
        validate_suite_id(&self.suite.id)?;
        if self.probes.is_empty() {
            bail!("probes must be a non-empty array");
        }
        for (index, probe) in self.probes.iter().enumerate() {
            probe
                .check
                .validate()
                .with_context(|| format!("probes[{}] invalid", index))?;
        }
        Ok(())
    }
}

impl Check {
    fn validate(&self) -> Result<()> {
        match self {
            Check::Command { cmd, timeout_secs } => {
                if cmd.is_empty() || cmd[0].trim().is_empty() {
                    bail!("command.cmd must be a non-empty array");
                }
                if *timeout_secs == Some(0) {
                    bail!("command.timeout_secs must be > 0");
                }
            }
            Check::FileExists { path } | Check::FileReadable { path } => {
                if path.as_os_str().is_empty() {
                    bail!("path must be non-empty");
                }
            }
            Check::EnvVar { var } => {
                if var.trim().is_empty() {
                    bail!("env_var.var must be non-empty");
                }
            }
        }
        Ok(())
    }
}

/// Load every `*.toml` suite in `dir`, sorted by id.
///
/// A missing directory yields no suites. Two files declaring the same id are
/// an error naming both files.
pub fn discover_suites(dir: &Path) -> Result<Vec<SuiteFile>> {
    if !dir.is_dir() {
        warn!(suites_dir = %dir.display(), "suites directory not found");
        return Ok(Vec::new());
    }
    let mut paths = suite_paths(dir)?;
    paths.sort();

    let mut by_id: BTreeMap<String, (PathBuf, SuiteFile)> = BTreeMap::new();
    for path in paths {
        let suite = SuiteFile::load(&path)?;
        if let Some((first, _)) = by_id.get(&suite.suite.id) {
            bail!(
                "duplicate suite.id {} in {} and {}",
                suite.suite.id,
                first.display(),
                path.display()
            );
        }
        by_id.insert(suite.suite.id.clone(), (path, suite));
    }
    Ok(by_id.into_values().map(|(_, suite)| suite).collect())
}

fn suite_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read suites dir {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.context("read suite entry")?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Pick suites by id, in the requested order. An empty request selects all.
pub fn select_suites(suites: Vec<SuiteFile>, ids: &[String]) -> Result<Vec<SuiteFile>> {
    if ids.is_empty() {
        return Ok(suites);
    }
    ids.iter()
        .map(|id| {
            suites
                .iter()
                .find(|suite| &suite.suite.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("suite {} not found", id))
        })
        .collect()
}

/// Suite ids are selected on the command line, so they are kept to
/// lowercase slugs.
fn validate_suite_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("suite.id must be non-empty");
    }
    if let Some(bad) = id
        .chars()
        .find(|ch| !matches!(ch, 'a'..='z' | '0'..='9' | '-' | '_'))
    {
        bail!("suite.id {id:?} contains {bad:?}; use [a-z0-9_-] only");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SBC_SUITE: &str = r#"
[suite]
id = "sbc"
description = "single-board computer devices"

[[probes]]
name = "cpu temperature"
type = "file_readable"
path = "/sys/class/thermal/thermal_zone0/temp"

[[probes]]
name = "camera"
type = "file_exists"
path = "/dev/video0"

[[probes]]
name = "python"
type = "command"
cmd = ["python3", "--version"]
timeout_secs = 10

[[probes]]
name = "display"
type = "env_var"
var = "DISPLAY"
"#;

    #[test]
    fn parses_valid_suite() {
        let suite = SuiteFile::parse_str(SBC_SUITE).expect("suite parses");
        assert_eq!(suite.suite.id, "sbc");
        assert_eq!(suite.label(), "single-board computer devices");
        assert_eq!(suite.probes.len(), 4);
        assert_eq!(
            suite.probes[2].check,
            Check::Command {
                cmd: vec!["python3".to_string(), "--version".to_string()],
                timeout_secs: Some(10),
            }
        );
        assert_eq!(
            suite.probes[3].check,
            Check::EnvVar {
                var: "DISPLAY".to_string()
            }
        );
    }

    #[test]
    fn accepts_empty_and_duplicate_probe_names() {
        let input = r#"
[suite]
id = "dupes"

[[probes]]
type = "env_var"
var = "HOME"

[[probes]]
name = "same"
type = "env_var"
var = "HOME"

[[probes]]
name = "same"
type = "env_var"
var = "PATH"
"#;
        let suite = SuiteFile::parse_str(input).expect("suite parses");
        assert_eq!(suite.probes[0].name, "");
        assert_eq!(suite.probes[1].name, suite.probes[2].name);
        assert_eq!(suite.label(), "dupes");
    }

    #[test]
    fn rejects_invalid_id() {
        let input = r#"
[suite]
id = "Bad Id"

[[probes]]
type = "env_var"
var = "HOME"
"#;
        let err = SuiteFile::parse_str(input).expect_err("invalid id");
        assert!(err.to_string().contains("suite.id \"Bad Id\" contains 'B'"), "{err}");
    }

    #[test]
    fn rejects_malformed_probes() {
        let empty_cmd = r#"
[suite]
id = "cmd"

[[probes]]
type = "command"
cmd = []
"#;
        SuiteFile::parse_str(empty_cmd).expect_err("empty cmd");

        let zero_timeout = r#"
[suite]
id = "cmd"

[[probes]]
type = "command"
cmd = ["true"]
timeout_secs = 0
"#;
        SuiteFile::parse_str(zero_timeout).expect_err("zero timeout");

        let no_probes = r#"
[suite]
id = "empty"
"#;
        SuiteFile::parse_str(no_probes).expect_err("no probes");
    }

    #[test]
    fn discovers_sorted_suites_and_rejects_duplicates() {
        let temp = tempdir().expect("tempdir");
        let suite = |id: &str| {
            format!("[suite]\nid = \"{id}\"\n\n[[probes]]\ntype = \"env_var\"\nvar = \"PATH\"\n")
        };
        fs::write(temp.path().join("b.toml"), suite("rpi")).expect("write");
        fs::write(temp.path().join("a.toml"), suite("geo")).expect("write");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write");

        let suites = discover_suites(temp.path()).expect("discover");
        let ids: Vec<&str> = suites.iter().map(|s| s.suite.id.as_str()).collect();
        assert_eq!(ids, vec!["geo", "rpi"]);

        fs::write(temp.path().join("c.toml"), suite("geo")).expect("write");
        let err = discover_suites(temp.path()).expect_err("duplicate");
        let message = err.to_string();
        assert!(message.contains("duplicate suite.id geo"), "{message}");
        assert!(message.contains("a.toml") && message.contains("c.toml"), "{message}");
    }

    #[test]
    fn missing_dir_has_no_suites() {
        let temp = tempdir().expect("tempdir");
        let suites = discover_suites(&temp.path().join("missing")).expect("discover");
        assert!(suites.is_empty());
    }

    #[test]
    fn selects_requested_suites_in_order() {
        let suite = |id: &str| {
            SuiteFile::parse_str(&format!(
                "[suite]\nid = \"{id}\"\n\n[[probes]]\ntype = \"env_var\"\nvar = \"PATH\"\n"
            ))
            .expect("suite")
        };
        let all = vec![suite("geo"), suite("img"), suite("num")];

        let picked = select_suites(all.clone(), &["num".to_string(), "geo".to_string()])
            .expect("select");
        let ids: Vec<&str> = picked.iter().map(|s| s.suite.id.as_str()).collect();
        assert_eq!(ids, vec!["num", "geo"]);

        assert_eq!(select_suites(all.clone(), &[]).expect("all").len(), 3);
        let err = select_suites(all, &["rpi".to_string()]).expect_err("unknown");
        assert!(err.to_string().contains("suite rpi not found"));
    }
}
