//! Summary of a multi-suite run.

use probe::{RunState, Verdict, log_summary};

use crate::run::SuiteRun;

/// Combined counters across suites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub suites: usize,
    pub failed_suites: usize,
    pub overall: RunState,
}

impl Summary {
    pub fn verdict(&self) -> Verdict {
        self.overall.verdict()
    }
}

pub fn summarize(runs: &[SuiteRun]) -> Summary {
    let mut overall = RunState::new();
    let mut failed_suites = 0;
    for run in runs {
        overall.merge(run.state);
        if !run.state.verdict().is_success() {
            failed_suites += 1;
        }
    }
    Summary {
        suites: runs.len(),
        failed_suites,
        overall,
    }
}

/// Log the overall verdict and print one stdout line per suite plus a total.
pub fn print_summary(runs: &[SuiteRun], summary: &Summary) {
    log_summary("all suites", &summary.overall);
    for run in runs {
        println!(
            "summary: suite={} total={} failed={}",
            run.suite_id,
            run.state.total(),
            run.state.failed()
        );
    }
    println!(
        "summary: suites={} failed_suites={} total={} failed={}",
        summary.suites,
        summary.failed_suites,
        summary.overall.total(),
        summary.overall.failed()
    );
}

#[cfg(test)]
mod tests {
    use probe::{Probe, run_batch};

    use super::*;

    fn suite_run(id: &str, results: &[bool]) -> SuiteRun {
        let probes = results.iter().map(|passes| {
            let passes = *passes;
            Probe::new(id, move || {
                if passes {
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("failed"))
                }
            })
        });
        SuiteRun {
            suite_id: id.to_string(),
            state: run_batch(probes),
        }
    }

    #[test]
    fn summarizes_counts_across_suites() {
        let runs = vec![
            suite_run("num", &[true, true]),
            suite_run("geo", &[true, false, false]),
            suite_run("img", &[false]),
        ];
        let summary = summarize(&runs);
        assert_eq!(summary.suites, 3);
        assert_eq!(summary.failed_suites, 2);
        assert_eq!(summary.overall.total(), 6);
        assert_eq!(summary.overall.failed(), 3);
        assert_eq!(summary.verdict(), Verdict::Failure { failed: 3 });
    }

    #[test]
    fn no_runs_is_success() {
        let summary = summarize(&[]);
        assert_eq!(summary.verdict(), Verdict::Success);
        assert_eq!(summary.overall.total(), 0);
    }
}
