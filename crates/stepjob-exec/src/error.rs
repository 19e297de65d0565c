//! Error types for job execution.

use std::path::PathBuf;

use stepjob_spec::{CodedError, StepError};
use thiserror::Error;

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ExecError>;

/// Errors that can occur while running a job.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Step-level failure: classification, argument shape, job id or exit code.
    #[error(transparent)]
    Step(#[from] StepError),

    /// An external program could not be located.
    #[error("{program} executable not found. Ensure it is installed and in PATH, or set {env_var}")]
    ProgramNotFound {
        program: String,
        env_var: &'static str,
    },

    /// Failed to spawn the scheduler or job script.
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the captured output for the notification.
    #[error("Failed to write captured output: {0}")]
    ArtifactWrite(#[source] std::io::Error),
}

impl ExecError {
    /// Creates a new spawn failed error.
    pub fn spawn_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    /// Returns the wrapped step error, if any.
    pub fn as_step(&self) -> Option<&StepError> {
        match self {
            ExecError::Step(err) => Some(err),
            _ => None,
        }
    }
}

impl CodedError for ExecError {
    fn code(&self) -> &'static str {
        match self {
            ExecError::Step(err) => err.code(),
            ExecError::ProgramNotFound { .. } => "EXEC_001",
            ExecError::SpawnFailed { .. } => "EXEC_002",
            ExecError::ArtifactWrite(_) => "EXEC_003",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ExecError::Step(err) => err.category(),
            _ => "exec",
        }
    }
}

/// Failures of the best-effort notification channel.
///
/// These never reach the caller of a step; engines log and drop them.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The mail program could not be located.
    #[error("mail program '{0}' not found")]
    ProgramNotFound(String),

    /// The mail program could not be started or waited on.
    #[error("failed to run mail program: {0}")]
    Io(#[from] std::io::Error),

    /// The mail program exited unsuccessfully.
    #[error("mail program exited with status {0}")]
    Failed(i32),
}
