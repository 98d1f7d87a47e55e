//! CLI command implementations.

use std::env;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::checks::CheckContext;
use crate::config::PreflightConfig;
use crate::report::{print_summary, summarize};
use crate::run::run_suites;
use crate::suite::{discover_suites, select_suites};

/// List all available suites.
pub fn list_suites(cfg: &PreflightConfig) -> Result<i32> {
    let suites = discover_suites(&cfg.suites_dir)?;
    for suite in suites {
        println!(
            "{}\t{}\t{} probes",
            suite.suite.id,
            suite.label(),
            suite.probes.len()
        );
    }
    Ok(probe::exit_codes::OK)
}

/// Load every suite file, failing on the first invalid one.
pub fn validate_suites(cfg: &PreflightConfig) -> Result<i32> {
    let suites = discover_suites(&cfg.suites_dir)?;
    let probes: usize = suites.iter().map(|suite| suite.probes.len()).sum();
    info!(suites = suites.len(), probes, "suites valid");
    println!("validate: suites={} probes={}", suites.len(), probes);
    Ok(probe::exit_codes::OK)
}

/// Run the requested suites (all when none are named) and report the verdict
/// as an exit code.
pub fn run_suites_by_id(cfg: &PreflightConfig, ids: &[String]) -> Result<i32> {
    let suites = discover_suites(&cfg.suites_dir)?;
    let suites = select_suites(suites, ids)?;
    if suites.is_empty() {
        warn!(suites_dir = %cfg.suites_dir.display(), "no suites selected, nothing to run");
    }
    debug!(suites = suites.len(), suites_dir = %cfg.suites_dir.display(), "suites loaded");

    let ctx = CheckContext {
        workdir: env::current_dir().context("read current directory")?,
        budget: cfg.budget(),
    };
    let runs = run_suites(&suites, &ctx);
    let summary = summarize(&runs);
    print_summary(&runs, &summary);
    Ok(summary.verdict().exit_code())
}
