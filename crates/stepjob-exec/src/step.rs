//! Step function factory.
//!
//! A pipeline framework calls step functions with positional arguments whose
//! number and meaning depend on the kind of step. [`make_step`] fixes that
//! calling convention once, at construction, and returns a [`StepFunction`]
//! that assembles the job script's command line and hands it to an engine.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stepjob_exec::{make_step, EngineConfig, ScheduledEngine, StepOptions};
//! use stepjob_spec::StepArg;
//!
//! let engine = Arc::new(ScheduledEngine::new(EngineConfig::default()));
//! let step = make_step("transform", false, StepOptions::new("src/sh/trim.sh", "trim"), engine)?;
//! step.call(vec![StepArg::files(vec!["x.fq"]), StepArg::files(vec!["y.bam"])])?;
//! # Ok::<(), stepjob_exec::ExecError>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepjob_spec::{
    ArgAssembler, ArgSlot, FileTree, JobShape, JobType, ResourceHints, StepArg, StepError,
    StepResult, SubmissionRequest,
};
use tracing::debug;

use crate::engine::Engine;
use crate::error::ExecResult;

/// Per-step settings fixed when the step function is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepOptions {
    /// Path of the external job script.
    pub script: PathBuf,
    /// Human-readable job name, used for the scheduler and notifications.
    pub job_name: String,
    /// Scheduler resource hints.
    #[serde(default)]
    pub resources: ResourceHints,
}

impl StepOptions {
    /// Creates options with default resource hints.
    pub fn new(script: impl Into<PathBuf>, job_name: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            job_name: job_name.into(),
            resources: ResourceHints::default(),
        }
    }

    /// Sets the resource hints.
    pub fn resources(mut self, resources: ResourceHints) -> Self {
        self.resources = resources;
        self
    }
}

/// A generated step function.
///
/// The positional layout is computed once from the [`JobShape`]; every call
/// consumes its arguments strictly left to right against it.
pub struct StepFunction {
    assembler: ArgAssembler,
    options: StepOptions,
    engine: Arc<dyn Engine>,
}

impl std::fmt::Debug for StepFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepFunction")
            .field("shape", &self.assembler.shape())
            .field("options", &self.options)
            .field("engine", &self.engine.name())
            .finish()
    }
}

/// Builds a step function, validating the job type by name.
///
/// # Errors
///
/// Returns [`StepError::InvalidJobType`] unless `job_type` is `transform`,
/// `originate` or `download`.
pub fn make_step(
    job_type: &str,
    has_extras: bool,
    options: StepOptions,
    engine: Arc<dyn Engine>,
) -> StepResult<StepFunction> {
    let job_type = JobType::parse(job_type)?;
    Ok(StepFunction::new(
        JobShape::new(job_type).with_extras(has_extras),
        options,
        engine,
    ))
}

impl StepFunction {
    /// Builds a step function for an already validated shape.
    pub fn new(shape: JobShape, options: StepOptions, engine: Arc<dyn Engine>) -> Self {
        let assembler = ArgAssembler::new(shape);
        debug!(
            target: "stepjob::step",
            job = %options.job_name,
            slots = ?assembler.slots(),
            engine = engine.name(),
            "step function built"
        );
        Self {
            assembler,
            options,
            engine,
        }
    }

    /// Returns the step's shape.
    pub fn shape(&self) -> JobShape {
        self.assembler.shape()
    }

    /// Returns the positional parameters this step expects, in order.
    pub fn slots(&self) -> &[ArgSlot] {
        self.assembler.slots()
    }

    /// Returns the step options.
    pub fn options(&self) -> &StepOptions {
        &self.options
    }

    /// Assembles the submission request without running anything.
    pub fn assemble(&self, args: Vec<StepArg>) -> StepResult<SubmissionRequest> {
        let tokens = self.assembler.assemble(args)?;
        Ok(SubmissionRequest::new(
            self.options.script.clone(),
            tokens,
            self.options.resources,
            self.options.job_name.clone(),
        ))
    }

    /// Assembles the request and runs it on the configured engine.
    ///
    /// Blocks until the job has finished, its output has been mailed and the
    /// captured output removed.
    pub fn call(&self, args: Vec<StepArg>) -> ExecResult<()> {
        let request = self.assemble(args)?;
        self.engine.execute(&request)?;
        Ok(())
    }

    /// Calls a transform step: `(input_files, output_files[, extras])`.
    pub fn call_transform(
        &self,
        inputs: impl Into<FileTree>,
        outputs: impl Into<FileTree>,
        extras: Option<StepArg>,
    ) -> ExecResult<()> {
        self.expect_type(JobType::Transform)?;
        let mut args = vec![StepArg::Files(inputs.into()), StepArg::Files(outputs.into())];
        args.extend(extras);
        self.call(args)
    }

    /// Calls an originate step: `(output_files[, extras])`.
    pub fn call_originate(
        &self,
        outputs: impl Into<FileTree>,
        extras: Option<StepArg>,
    ) -> ExecResult<()> {
        self.expect_type(JobType::Originate)?;
        let mut args = vec![StepArg::Files(outputs.into())];
        args.extend(extras);
        self.call(args)
    }

    /// Calls a download step: `(output_files, login, password[, extras])`.
    pub fn call_download(
        &self,
        outputs: impl Into<FileTree>,
        login: impl Into<String>,
        password: impl Into<String>,
        extras: Option<StepArg>,
    ) -> ExecResult<()> {
        self.expect_type(JobType::Download)?;
        let mut args = vec![
            StepArg::Files(outputs.into()),
            StepArg::Text(login.into()),
            StepArg::Text(password.into()),
        ];
        args.extend(extras);
        self.call(args)
    }

    fn expect_type(&self, wanted: JobType) -> StepResult<()> {
        if self.shape().job_type == wanted {
            Ok(())
        } else {
            Err(StepError::step_kind_mismatch(wanted, self.shape().job_type))
        }
    }
}
