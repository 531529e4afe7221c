//! Stable exit codes for `evc-sessions`.
//!
//! One-shot commands that reach the script exit with the script's own code.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, script not found, or script not runnable.
pub const INVALID: i32 = 1;
/// The script could not be run to completion (spawn failure, I/O, timeout).
pub const EXEC_FAILED: i32 = 2;
/// The script was killed by a signal.
pub const INTERRUPTED: i32 = 130;
