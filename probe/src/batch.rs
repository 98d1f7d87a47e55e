//! Sequential execution of an explicit probe list.

use tracing::{error, info};

use crate::core::run_state::RunState;
use crate::core::verdict::Verdict;
use crate::probe::Probe;

/// Run every probe once, in order, and return the resulting counters.
///
/// Each probe is isolated: a failure is recorded and the next probe still
/// runs. No per-probe results are retained.
pub fn run_batch<'a, I>(probes: I) -> RunState
where
    I: IntoIterator<Item = Probe<'a>>,
{
    let mut state = RunState::new();
    for mut probe in probes {
        probe.run(&mut state);
    }
    state
}

/// An ordered, labelled list of probes registered explicitly by the caller.
#[derive(Debug)]
pub struct Batch<'a> {
    label: String,
    probes: Vec<Probe<'a>>,
}

impl<'a> Batch<'a> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            probes: Vec::new(),
        }
    }

    /// Register `action` under `name` (builder style).
    pub fn probe<F, E>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> Result<(), E> + 'a,
        E: Into<anyhow::Error>,
    {
        self.probes.push(Probe::new(name, action));
        self
    }

    pub fn push(&mut self, probe: Probe<'a>) {
        self.probes.push(probe);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Run all registered probes and log the batch summary.
    pub fn run(self) -> RunState {
        info!(batch = %self.label, probes = self.probes.len(), "batch started");
        let state = run_batch(self.probes);
        log_summary(&self.label, &state);
        state
    }
}

/// Log the binary pass/fail summary of a finished batch.
pub fn log_summary(label: &str, state: &RunState) -> Verdict {
    info!(batch = %label, total = state.total(), "performed {} probes", state.total());
    let verdict = state.verdict();
    match verdict {
        Verdict::Success => info!(batch = %label, "all probes were successful"),
        Verdict::Failure { failed } => error!(batch = %label, failed, "{failed} probes failed"),
    }
    verdict
}
