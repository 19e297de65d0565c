//! stepjob End-to-End Test Infrastructure
//!
//! The harness stands in for the cluster: it writes a fake scheduler, a
//! recording mail program and throwaway job scripts into a temp directory,
//! then points an [`stepjob_exec::EngineConfig`] at them.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p stepjob-tests
//! ```
//!
//! Tests that spawn programs need a POSIX `sh` and are compiled on unix only.

#[cfg(unix)]
pub mod harness;
