//! Conversion of declared checks into runnable probes.
//!
//! Each check kind reports its own error type so the failure kind in the logs
//! tells a missing file (`io::Error`) apart from a failing command
//! (`CommandError`) or an unset variable (`VarError`).

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use probe::Probe;
use thiserror::Error;
use tracing::debug;

use crate::process::run_bounded;
use crate::suite::{Check, ProbeSpec};

/// Maximum characters of file contents echoed into debug logs.
const PREVIEW_CHARS: usize = 200;

/// What one check may spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Wall time for a `command` check before its process group is killed.
    pub timeout: Duration,
    /// Bytes kept per command output pipe, and bytes read by `file_readable`.
    pub byte_limit: usize,
}

impl Budget {
    /// The same budget with a probe's own timeout, when it declares one.
    fn with_timeout_secs(self, secs: Option<u64>) -> Self {
        match secs {
            Some(secs) => Self {
                timeout: Duration::from_secs(secs),
                ..self
            },
            None => self,
        }
    }
}

/// Where and how checks run.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Base for relative paths and the working directory of commands.
    pub workdir: PathBuf,
    pub budget: Budget,
}

/// Failure of a `command` check.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("`{cmd}` could not be run: {reason}")]
    Run { cmd: String, reason: String },
    #[error("`{cmd}` timed out after {secs}s")]
    TimedOut { cmd: String, secs: u64 },
    #[error("`{cmd}` exited with {status}: {stderr}")]
    Exited {
        cmd: String,
        status: String,
        stderr: String,
    },
}

/// Build the probe for a declared check.
pub fn build_probe(spec: &ProbeSpec, ctx: &CheckContext) -> Probe<'static> {
    let name = spec.name.clone();
    match &spec.check {
        Check::Command { cmd, timeout_secs } => {
            let cmd = cmd.clone();
            let workdir = ctx.workdir.clone();
            let budget = ctx.budget.with_timeout_secs(*timeout_secs);
            Probe::new(name, move || check_command(&cmd, &workdir, budget))
        }
        Check::FileExists { path } => {
            let path = ctx.workdir.join(path);
            Probe::new(name, move || check_file_exists(&path))
        }
        Check::FileReadable { path } => {
            let path = ctx.workdir.join(path);
            let limit = ctx.budget.byte_limit;
            Probe::new(name, move || check_file_readable(&path, limit))
        }
        Check::EnvVar { var } => {
            let var = var.clone();
            Probe::new(name, move || check_env_var(&var))
        }
    }
}

fn check_command(cmd: &[String], workdir: &Path, budget: Budget) -> Result<(), CommandError> {
    let cmd_line = cmd.join(" ");
    let (program, args) = cmd.split_first().ok_or_else(|| CommandError::Run {
        cmd: cmd_line.clone(),
        reason: "empty command".to_string(),
    })?;

    let mut command = Command::new(program);
    command.args(args).current_dir(workdir);

    let report = run_bounded(command, budget.timeout, budget.byte_limit).map_err(|err| {
        CommandError::Run {
            cmd: cmd_line.clone(),
            reason: format!("{err:#}"),
        }
    })?;

    if report.timed_out {
        return Err(CommandError::TimedOut {
            cmd: cmd_line,
            secs: budget.timeout.as_secs(),
        });
    }
    if !report.status.success() {
        return Err(CommandError::Exited {
            cmd: cmd_line,
            status: report.status.to_string(),
            stderr: report.stderr.text(),
        });
    }

    debug!(cmd = %cmd_line, stdout = %report.stdout.text(), "command output");
    Ok(())
}

fn check_file_exists(path: &Path) -> io::Result<()> {
    fs::metadata(path).map_err(|err| with_path(err, path))?;
    debug!(path = %path.display(), "path exists");
    Ok(())
}

/// Read up to `limit` bytes. A device with nothing pending still counts as
/// readable instead of blocking the batch.
fn check_file_readable(path: &Path, limit: usize) -> io::Result<()> {
    let file = open_nonblocking(path).map_err(|err| with_path(err, path))?;
    let mut contents = Vec::new();
    let limit = u64::try_from(limit).unwrap_or(u64::MAX);
    match file.take(limit).read_to_end(&mut contents) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::WouldBlock => {
            debug!(path = %path.display(), "no data pending");
        }
        Err(err) => return Err(with_path(err, path)),
    }
    let text = String::from_utf8_lossy(&contents);
    let preview: String = text.trim().chars().take(PREVIEW_CHARS).collect();
    debug!(path = %path.display(), bytes = contents.len(), preview = %preview, "file read");
    Ok(())
}

#[cfg(unix)]
fn open_nonblocking(path: &Path) -> io::Result<File> {
    use nix::fcntl::OFlag;
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)
}

#[cfg(not(unix))]
fn open_nonblocking(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

fn check_env_var(var: &str) -> Result<(), env::VarError> {
    let value = env::var(var)?;
    debug!(var, len = value.len(), "environment variable set");
    Ok(())
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {err}", path.display()))
}
