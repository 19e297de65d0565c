//! stepjob CLI library.
//!
//! Command implementations, config loading and logging setup for the
//! `stepjob` binary.

pub mod commands;
pub mod config;
pub mod logging;
