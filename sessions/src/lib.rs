//! Orchestration engine for a project's `sessions.sh` work-session script.
//!
//! The engine finds the script by walking up from the working directory,
//! checks it can run, invokes it from the project root (blocking or
//! streaming), and reads session state back out of its text output.
//!
//! - **[`core`]**: Pure logic (command catalog, output parsing, branch names).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, filesystem lookup,
//!   process execution).
//!
//! [`session::Sessions`] composes both into the commands a presentation layer
//! needs; [`menu`] is the interactive one shipped with the binary.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod menu;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::SessionError;
pub use session::{Sessions, StatusReport};
