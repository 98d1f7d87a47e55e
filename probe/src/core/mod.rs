//! Deterministic bookkeeping shared by the probe runner.
//!
//! Core modules are free of I/O and logging. They hold the counters and
//! classifications the runner reports on.

pub mod failure;
pub mod run_state;
pub mod verdict;
