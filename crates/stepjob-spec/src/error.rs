//! Error types for step classification, argument assembly and job outcomes.

use thiserror::Error;

use crate::flags::FileRole;
use crate::shape::{ArgSlot, JobType};

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Errors raised while building or running a pipeline step.
///
/// None of these are retried by this crate; they propagate to the enclosing
/// pipeline, which is expected to abort the affected step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// No flag is registered for this extension in the requested role.
    #[error("{role} file extension '{extension}' not recognised")]
    UnrecognizedExtension { extension: String, role: FileRole },

    /// Job type is not one of transform, originate or download.
    #[error("'{job_type}' is not an allowed job type (expected transform, originate or download)")]
    InvalidJobType { job_type: String },

    /// Positional arguments were left over after assembly.
    #[error("{remaining} positional argument(s) left unconsumed")]
    UnconsumedArguments { remaining: usize },

    /// Fewer positional arguments were supplied than the shape declares.
    #[error("missing positional argument for {slot}")]
    MissingArgument { slot: ArgSlot },

    /// A positional argument had the wrong kind for its slot.
    #[error("argument for {slot} has the wrong kind")]
    ArgumentKindMismatch { slot: ArgSlot },

    /// The scheduler's diagnostic stream carried no job identifier.
    #[error("no job id found in scheduler output for job {job_name}")]
    JobIdNotFound { job_name: String },

    /// The external process or scheduler exited unsuccessfully.
    #[error("Job {job_name} failed with non-zero exit code {exit_code}")]
    NonZeroExit { job_name: String, exit_code: i32 },

    /// A typed call was made on a step built for another job type.
    #[error("step built as {actual} cannot be called as {requested}")]
    StepKindMismatch { requested: JobType, actual: JobType },
}

impl StepError {
    /// Creates a new unrecognized extension error.
    pub fn unrecognized_extension(extension: impl Into<String>, role: FileRole) -> Self {
        Self::UnrecognizedExtension {
            extension: extension.into(),
            role,
        }
    }

    /// Creates a new invalid job type error.
    pub fn invalid_job_type(job_type: impl Into<String>) -> Self {
        Self::InvalidJobType {
            job_type: job_type.into(),
        }
    }

    /// Creates a new non-zero exit error.
    pub fn non_zero_exit(job_name: impl Into<String>, exit_code: i32) -> Self {
        Self::NonZeroExit {
            job_name: job_name.into(),
            exit_code,
        }
    }

    /// Creates a new step kind mismatch error.
    pub fn step_kind_mismatch(requested: JobType, actual: JobType) -> Self {
        Self::StepKindMismatch { requested, actual }
    }

    /// Creates a new job id not found error.
    pub fn job_id_not_found(job_name: impl Into<String>) -> Self {
        Self::JobIdNotFound {
            job_name: job_name.into(),
        }
    }
}

/// Common trait for errors that report a stable machine-readable code.
///
/// Implemented by every error type in the workspace so the CLI can render
/// failures uniformly, both as colored text and as JSON diagnostics.
pub trait CodedError: std::error::Error {
    /// Get the error code for reporting, e.g. "STEP_003".
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category for grouping related errors.
    fn category(&self) -> &'static str;
}

impl CodedError for StepError {
    fn code(&self) -> &'static str {
        match self {
            StepError::UnrecognizedExtension { .. } => "STEP_001",
            StepError::InvalidJobType { .. } => "STEP_002",
            StepError::UnconsumedArguments { .. } => "STEP_003",
            StepError::MissingArgument { .. } => "STEP_004",
            StepError::ArgumentKindMismatch { .. } => "STEP_005",
            StepError::JobIdNotFound { .. } => "STEP_006",
            StepError::NonZeroExit { .. } => "STEP_007",
            StepError::StepKindMismatch { .. } => "STEP_008",
        }
    }

    fn category(&self) -> &'static str {
        "step"
    }
}
