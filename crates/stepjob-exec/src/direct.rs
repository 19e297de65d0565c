//! Runs job scripts as plain child processes, inside the caller's own
//! resource allocation.

use std::path::Path;
use std::process::{Command, Stdio};

use stepjob_spec::SubmissionRequest;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::{finish, Engine, ExecutionResult};
use crate::error::{ExecError, ExecResult};
use crate::notify::{notifier_from_config, Notifier};

/// Runs `<script> <args...>` directly. Resource hints are ignored.
pub struct DirectEngine {
    config: EngineConfig,
    notifier: Box<dyn Notifier>,
}

impl DirectEngine {
    /// Creates an engine that notifies as described by `config.notify`.
    pub fn new(config: EngineConfig) -> Self {
        let notifier = notifier_from_config(&config.notify);
        Self { config, notifier }
    }

    /// Creates an engine with a custom notifier.
    pub fn with_notifier(config: EngineConfig, notifier: Box<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn command(script: &Path, request: &SubmissionRequest) -> Command {
        let mut cmd = Command::new(script);
        cmd.args(request.args()).stdin(Stdio::null());
        cmd
    }
}

impl Engine for DirectEngine {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn execute(&self, request: &SubmissionRequest) -> ExecResult<ExecutionResult> {
        let mut cmd = Self::command(request.script(), request);

        debug!(target: "stepjob::engine", engine = "direct", command = ?cmd, "spawning");
        // Output buffers stdout and stderr concurrently, so a chatty script
        // cannot deadlock on a full pipe.
        let output = cmd
            .output()
            .map_err(|e| ExecError::spawn_failed(request.script(), e))?;

        let result = ExecutionResult::from_output(output, None);
        let artifact_dir = self.config.resolved_artifact_dir();
        finish(result, request, &artifact_dir, self.notifier.as_ref())
    }
}
