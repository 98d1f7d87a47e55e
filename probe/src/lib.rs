//! Sequential probe runner with per-probe error isolation.
//!
//! A probe is a named action that either succeeds or fails. The runner executes
//! an explicit, ordered list of probes, counts attempts and failures in a
//! [`RunState`], and logs each failure's kind and message without letting it
//! reach sibling probes.
//!
//! - **[`core`]**: Counters and classifications. No I/O.
//! - **[`probe`]** / **[`batch`]**: Invocation, error capture, and summaries.
//! - **[`logging`]**: Subscriber setup for stdout and an optional log file.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod logging;
pub mod probe;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::batch::{Batch, log_summary, run_batch};
pub use crate::core::failure::Failure;
pub use crate::core::run_state::RunState;
pub use crate::core::verdict::Verdict;
pub use crate::probe::{Outcome, Probe};
