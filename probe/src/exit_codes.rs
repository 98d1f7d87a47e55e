//! Stable exit codes for probe-running binaries.

/// Every probe passed.
pub const OK: i32 = 0;
/// Invalid configuration, unreadable suite, or another operational error.
pub const INVALID: i32 = 1;
/// At least one probe failed.
pub const FAILED: i32 = 2;
