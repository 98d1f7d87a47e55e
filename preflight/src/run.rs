//! Suite execution orchestration.
//!
//! Each suite becomes one batch with its own fresh counters.

use probe::{Batch, RunState};
use tracing::{info, instrument};

use crate::checks::{CheckContext, build_probe};
use crate::suite::SuiteFile;

/// Counters of a finished suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRun {
    pub suite_id: String,
    pub state: RunState,
}

/// Run every probe of a suite in declaration order.
#[instrument(skip_all, fields(suite_id = %suite.suite.id))]
pub fn run_suite(suite: &SuiteFile, ctx: &CheckContext) -> SuiteRun {
    let mut batch = Batch::new(suite.label());
    for spec in &suite.probes {
        batch.push(build_probe(spec, ctx));
    }
    let state = batch.run();
    SuiteRun {
        suite_id: suite.suite.id.clone(),
        state,
    }
}

/// Run suites one after another; a failing suite does not stop later ones.
pub fn run_suites(suites: &[SuiteFile], ctx: &CheckContext) -> Vec<SuiteRun> {
    info!(suites = suites.len(), "starting suites");
    suites.iter().map(|suite| run_suite(suite, ctx)).collect()
}
