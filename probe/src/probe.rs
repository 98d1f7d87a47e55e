//! Named probes and their per-invocation bookkeeping.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use tracing::{error, info};

use crate::core::failure::Failure;
use crate::core::run_state::RunState;

type Action<'a> = Box<dyn FnMut() -> Result<(), Failure> + 'a>;

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(Failure),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// A named unit of verification work.
///
/// Names are only used for logging; empty and duplicate names are allowed.
pub struct Probe<'a> {
    name: String,
    action: Action<'a>,
}

impl<'a> Probe<'a> {
    /// Wrap `action` under `name`.
    ///
    /// The error type's short name becomes the failure kind when the action
    /// returns `Err`.
    pub fn new<F, E>(name: impl Into<String>, mut action: F) -> Self
    where
        F: FnMut() -> Result<(), E> + 'a,
        E: Into<anyhow::Error>,
    {
        Self {
            name: name.into(),
            action: Box::new(move || action().map_err(Failure::from_error)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the probe once, recording the attempt in `state`.
    ///
    /// Errors and panics raised by the action are logged and counted, never
    /// propagated. Counters accumulate across repeated invocations.
    pub fn run(&mut self, state: &mut RunState) -> Outcome {
        info!(probe = %self.name, "probe started");
        state.record_attempt();
        let started = Instant::now();

        let result = match catch_unwind(AssertUnwindSafe(|| (self.action)())) {
            Ok(result) => result,
            Err(payload) => Err(Failure::from_panic(payload)),
        };

        match result {
            Ok(()) => {
                info!(
                    probe = %self.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "probe complete"
                );
                Outcome::Passed
            }
            Err(failure) => {
                state.record_failure();
                error!(
                    probe = %self.name,
                    kind = failure.kind(),
                    error = failure.message(),
                    "probe failed"
                );
                Outcome::Failed(failure)
            }
        }
    }
}

impl fmt::Debug for Probe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe").field("name", &self.name).finish_non_exhaustive()
    }
}
