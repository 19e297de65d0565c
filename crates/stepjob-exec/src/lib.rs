//! stepjob execution engines
//!
//! This crate runs the job scripts described by `stepjob-spec` requests and
//! reports their outcome.
//!
//! # Overview
//!
//! Two engines implement the [`Engine`] trait:
//!
//! - **[`ScheduledEngine`]** - submits through the cluster scheduler's blocking
//!   allocate-and-run command (`salloc` by default) and reads the job id from
//!   the scheduler's stderr
//! - **[`DirectEngine`]** - runs the script as a plain child process
//!
//! Both capture stdout and stderr in memory, stage them as two temporary
//! files, mail them through the configured [`Notifier`], delete the files and
//! finally fail with `NonZeroExit` if the job did not succeed. Mail problems are
//! logged and never change the step's result.
//!
//! The [`step`] module builds pipeline-facing step functions on top of an
//! engine.
//!
//! # Requirements
//!
//! The scheduler and mail programs are searched for in:
//!
//! 1. The explicit path in [`EngineConfig`]
//! 2. `STEPJOB_SCHEDULER` / `STEPJOB_MAIL` environment variables
//! 3. System PATH
//!
//! # Crate Structure
//!
//! - [`engine`] - Engine trait and the shared finish sequence
//! - [`scheduled`] - Scheduler-backed engine and job id extraction
//! - [`direct`] - Child-process engine
//! - [`notify`] - Notifiers
//! - [`artifacts`] - Temporary stdout/stderr files
//! - [`config`] - Configuration and program lookup
//! - [`step`] - Step function factory
//! - [`error`] - Error types

pub mod artifacts;
pub mod config;
pub mod direct;
pub mod engine;
pub mod error;
pub mod notify;
pub mod scheduled;
pub mod step;

use std::sync::Arc;

// Re-export main types at crate root
pub use config::{EngineConfig, NotifyConfig, SchedulerConfig};
pub use direct::DirectEngine;
pub use engine::{Engine, ExecutionResult};
pub use error::{ExecError, ExecResult, NotifyError};
pub use notify::{MailNotifier, Notice, Notifier, NullNotifier};
pub use scheduled::{extract_job_id, ScheduledEngine};
pub use step::{make_step, StepFunction, StepOptions};

/// Which engine a step runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Through the cluster scheduler.
    #[default]
    Scheduled,
    /// As a plain child process.
    Direct,
}

impl EngineKind {
    /// Returns the string identifier for this engine kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Scheduled => "scheduled",
            EngineKind::Direct => "direct",
        }
    }
}

/// Builds the engine for a kind, notifying as described by `config.notify`.
pub fn build_engine(kind: EngineKind, config: EngineConfig) -> Arc<dyn Engine> {
    match kind {
        EngineKind::Scheduled => Arc::new(ScheduledEngine::new(config)),
        EngineKind::Direct => Arc::new(DirectEngine::new(config)),
    }
}
