//! Pass/fail counters for a single batch run.

use crate::core::verdict::Verdict;

/// Counters tracking how many probes were attempted and how many failed.
///
/// Created fresh for each batch. Only the runner mutates the counters; callers
/// read them once the batch is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    total: usize,
    failed: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of probe invocations attempted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of probe invocations whose action failed.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn passed(&self) -> usize {
        self.total - self.failed
    }

    pub fn verdict(&self) -> Verdict {
        if self.failed == 0 {
            Verdict::Success
        } else {
            Verdict::Failure {
                failed: self.failed,
            }
        }
    }

    /// Fold a finished batch into a running total across batches.
    pub fn merge(&mut self, other: RunState) {
        self.total += other.total;
        self.failed += other.failed;
    }

    pub(crate) fn record_attempt(&mut self) {
        self.total += 1;
    }

    /// Must follow the `record_attempt` of the same invocation.
    pub(crate) fn record_failure(&mut self) {
        debug_assert!(self.failed < self.total, "failure recorded without attempt");
        self.failed += 1;
    }
}
