//! Deterministic, pure logic shared by the session engine.
//!
//! Core modules must be free of I/O side effects. They operate on strings and
//! in-memory values and return deterministic outputs suitable for tests.

pub mod command;
pub mod issues;
pub mod session_info;
