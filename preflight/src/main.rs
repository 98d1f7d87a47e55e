//! Host smoke-test runner.
//!
//! Loads probe suites from TOML files, runs each suite as one batch, and exits
//! non-zero when any probe failed.

mod checks;
mod cli;
mod config;
mod process;
mod report;
mod run;
mod suite;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use probe::exit_codes;

use crate::config::{Overrides, apply_overrides, load_config};

#[derive(Parser)]
#[command(name = "preflight", version, about = "Smoke-test probes for a target host")]
struct Cli {
    /// Configuration file (defaults apply when missing).
    #[arg(long, global = true, default_value = "preflight.toml")]
    config: PathBuf,

    /// Directory containing `*.toml` suite files.
    #[arg(long, global = true)]
    suites_dir: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level when `RUST_LOG` is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print suite ids, labels, and probe counts.
    List,
    /// Load and validate every suite file.
    Validate,
    /// Run suites by id, or every suite when none are named.
    Run { suites: Vec<String> },
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let overrides = Overrides {
        suites_dir: cli.suites_dir,
        log_file: cli.log_file,
        log_level: cli.log_level,
    };
    let cfg = apply_overrides(load_config(&cli.config)?, &overrides)?;
    probe::logging::init(&cfg.log_options())?;

    match cli.command {
        Command::List => cli::list_suites(&cfg),
        Command::Validate => cli::validate_suites(&cfg),
        Command::Run { suites } => cli::run_suites_by_id(&cfg, &suites),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_without_suites() {
        let cli = Cli::parse_from(["preflight", "run"]);
        assert!(matches!(cli.command, Command::Run { ref suites } if suites.is_empty()));
        assert_eq!(cli.config, PathBuf::from("preflight.toml"));
    }

    #[test]
    fn parse_run_with_suites_and_flags() {
        let cli = Cli::parse_from([
            "preflight",
            "run",
            "sbc",
            "host",
            "--suites-dir",
            "/etc/preflight",
            "--log-file",
            "run.log",
        ]);
        match cli.command {
            Command::Run { suites } => assert_eq!(suites, vec!["sbc", "host"]),
            _ => panic!("expected run"),
        }
        assert_eq!(cli.suites_dir, Some(PathBuf::from("/etc/preflight")));
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
    }
}
