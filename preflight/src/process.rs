//! Child processes for `command` checks.
//!
//! The child leads its own process group, so a timeout takes down everything
//! it started. Output is kept in per-pipe buffers filled by reader threads;
//! once the child is gone those threads get a short grace period to hit EOF
//! and are then left behind, so a detached descendant holding a pipe cannot
//! stall the batch.

use std::io::{ErrorKind, Read};
use std::mem;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// How long reader threads may keep draining after the child has exited.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const CHUNK_BYTES: usize = 8192;

/// Bytes kept from one output pipe. Anything past the limit is counted, not stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub dropped: usize,
}

impl Captured {
    fn keep(&mut self, chunk: &[u8], limit: usize) {
        let room = limit.saturating_sub(self.bytes.len());
        let take = chunk.len().min(room);
        self.bytes.extend_from_slice(&chunk[..take]);
        self.dropped += chunk.len() - take;
    }

    /// Lossy UTF-8 text, trimmed.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).trim().to_string()
    }
}

/// How a child process ended and what it printed.
#[derive(Debug)]
pub struct ChildReport {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    pub timed_out: bool,
}

type Shared = Arc<Mutex<Captured>>;

/// Run `cmd` to completion or until `timeout`, keeping at most `byte_limit`
/// bytes of each output pipe.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), byte_limit))]
pub fn run_bounded(mut cmd: Command, timeout: Duration, byte_limit: usize) -> Result<ChildReport> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    own_process_group(&mut cmd);

    let mut child = cmd.spawn().context("spawn command")?;
    debug!(pid = child.id(), "child spawned");

    let (done_tx, done_rx) = mpsc::channel();
    let stdout = Shared::default();
    let stderr = Shared::default();
    let mut readers = 0;
    if let Some(pipe) = child.stdout.take() {
        drain(pipe, Arc::clone(&stdout), byte_limit, done_tx.clone());
        readers += 1;
    }
    if let Some(pipe) = child.stderr.take() {
        drain(pipe, Arc::clone(&stderr), byte_limit, done_tx.clone());
        readers += 1;
    }
    drop(done_tx);

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(
                pid = child.id(),
                timeout_secs = timeout.as_secs(),
                "command timed out, killing its process group"
            );
            kill_group(&mut child)?;
            (child.wait().context("reap killed command")?, true)
        }
    };

    let open = settle(&done_rx, readers);
    if open > 0 {
        warn!(open, "output pipes still held by a descendant, not waiting for them");
    }

    let report = ChildReport {
        status,
        stdout: take(&stdout),
        stderr: take(&stderr),
        timed_out,
    };
    debug!(
        exit_code = ?report.status.code(),
        timed_out,
        stdout_dropped = report.stdout.dropped,
        stderr_dropped = report.stderr.dropped,
        "child finished"
    );
    Ok(report)
}

fn drain<R: Read + Send + 'static>(mut pipe: R, sink: Shared, limit: usize, done: Sender<()>) {
    thread::spawn(move || {
        let mut chunk = [0u8; CHUNK_BYTES];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .keep(&chunk[..n], limit),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    debug!(error = %err, "stopped reading child output");
                    break;
                }
            }
        }
        // The receiver is gone once the grace period ran out.
        let _ = done.send(());
    });
}

/// Wait up to `DRAIN_GRACE` for readers to reach EOF; returns how many are still open.
fn settle(done: &Receiver<()>, mut open: usize) -> usize {
    let deadline = Instant::now() + DRAIN_GRACE;
    while open > 0 {
        let left = deadline.saturating_duration_since(Instant::now());
        if done.recv_timeout(left).is_err() {
            break;
        }
        open -= 1;
    }
    open
}

fn take(shared: &Shared) -> Captured {
    mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner))
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_group(child: &mut Child) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(child.id()).context("child pid out of range")?;
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(errno).with_context(|| format!("kill process group {pgid}")),
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> Result<()> {
    child.kill().context("kill command")
}
