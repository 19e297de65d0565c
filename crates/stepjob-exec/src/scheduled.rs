//! Runs job scripts through the cluster scheduler's blocking allocate-and-run
//! command.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use regex::bytes::Regex;
use stepjob_spec::{StepError, SubmissionRequest};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::engine::{finish, Engine, ExecutionResult};
use crate::error::{ExecError, ExecResult};
use crate::notify::{notifier_from_config, Notifier};

static JOB_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn job_id_regex() -> &'static Regex {
    JOB_ID_REGEX.get_or_init(|| Regex::new(r"[0-9]+").expect("invalid regex pattern"))
}

/// Extracts the job id from the scheduler's diagnostic output.
///
/// Takes the first run of ASCII digits anywhere in the stream, e.g. `4242` in
/// `salloc: Granted job allocation 4242`. A banner containing unrelated
/// numbers ahead of the allocation line would be picked up instead; this
/// matches what the job scripts and log tooling expect today.
pub fn extract_job_id(diagnostics: &[u8]) -> Option<String> {
    job_id_regex()
        .find(diagnostics)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

/// Submits jobs through the scheduler and blocks until they finish.
///
/// The command line is
/// `<scheduler> --ntasks=N --cpus-per-task=C --mem-per-cpu=M --job-name=J --nice=X <script> <args...>`.
pub struct ScheduledEngine {
    config: EngineConfig,
    notifier: Box<dyn Notifier>,
}

impl ScheduledEngine {
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

    /// Builds the scheduler invocation for a request.
    pub fn command(&self, scheduler: &Path, request: &SubmissionRequest) -> Command {
        let res = request.resources();
        let mut cmd = Command::new(scheduler);
        cmd.arg(format!("--ntasks={}", res.ntasks))
            .arg(format!("--cpus-per-task={}", res.cpus_per_task))
            .arg(format!("--mem-per-cpu={}", res.mem_per_cpu))
            .arg(format!("--job-name={}", request.job_name()))
            .arg(format!("--nice={}", res.nice))
            .arg(request.script())
            .args(request.args())
            .stdin(Stdio::null());
        cmd
    }
}

impl Engine for ScheduledEngine {
    fn name(&self) -> &'static str {
        "scheduled"
    }

    fn execute(&self, request: &SubmissionRequest) -> ExecResult<ExecutionResult> {
        let scheduler = self.config.scheduler.resolve()?;
        let mut cmd = self.command(&scheduler, request);

        debug!(target: "stepjob::engine", engine = "scheduled", command = ?cmd, "submitting");
        let output = cmd
            .output()
            .map_err(|e| ExecError::spawn_failed(scheduler.clone(), e))?;

        let job_id = extract_job_id(&output.stderr)
            .ok_or_else(|| StepError::job_id_not_found(request.job_name()))?;

        let result = ExecutionResult::from_output(output, Some(job_id));
        let artifact_dir = self.config.resolved_artifact_dir();
        let result = finish(result, request, &artifact_dir, self.notifier.as_ref())?;

        if let Some(id) = &result.job_id {
            info!(target: "stepjob::engine", job = request.job_name(), job_id = %id, "job {} run with job id {}", request.job_name(), id);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stepjob_spec::ResourceHints;

    #[test]
    fn test_extract_job_id() {
        assert_eq!(
            extract_job_id(b"salloc: Granted job allocation 4242\nsalloc: Relinquishing job allocation 4242\n"),
            Some("4242".to_string())
        );
        assert_eq!(extract_job_id(b"no digits here"), None);
        assert_eq!(extract_job_id(b""), None);
    }

    #[test]
    fn test_extract_job_id_takes_first_digit_run() {
        assert_eq!(
            extract_job_id(b"slurm 23.02 banner\nGranted job allocation 99"),
            Some("23".to_string())
        );
    }

    #[test]
    fn test_extract_job_id_tolerates_invalid_utf8() {
        assert_eq!(extract_job_id(b"\xff\xfe job 17"), Some("17".to_string()));
    }

    #[test]
    fn test_command_layout() {
        let engine = ScheduledEngine::with_notifier(
            EngineConfig::default(),
            Box::new(crate::notify::NullNotifier),
        );
        let request = SubmissionRequest::new(
            "src/sh/align.sh",
            vec!["--fq".into(), "x.fq".into(), "-c".into(), "y.bam".into()],
            ResourceHints::default().cpus_per_task(8).mem_per_cpu(2000).nice(10),
            "align",
        );
        let cmd = engine.command(Path::new("salloc"), &request);
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--ntasks=1",
                "--cpus-per-task=8",
                "--mem-per-cpu=2000",
                "--job-name=align",
                "--nice=10",
                "src/sh/align.sh",
                "--fq",
                "x.fq",
                "-c",
                "y.bam",
            ]
        );
    }
}
