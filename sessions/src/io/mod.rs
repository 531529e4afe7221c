//! I/O helpers for the session engine.

pub mod config;
pub mod locate;
pub mod process;
pub mod script;
