//! Binary classification of a finished run.

use crate::exit_codes;

/// Overall result of one or more batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No probe failed.
    Success,
    /// At least one probe failed.
    Failure { failed: usize },
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    /// Process exit code reporting this verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Success => exit_codes::OK,
            Verdict::Failure { .. } => exit_codes::FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_exits_non_zero() {
        assert_eq!(Verdict::Success.exit_code(), exit_codes::OK);
        assert_eq!(Verdict::Failure { failed: 3 }.exit_code(), exit_codes::FAILED);
        assert!(!Verdict::Failure { failed: 1 }.is_success());
    }
}
