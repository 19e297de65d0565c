//! The execution contract shared by the scheduled and direct engines.
//!
//! Every run follows the same sequence once the external process has exited:
//!
//! 1. Write captured stdout/stderr to two uniquely named temporary files
//! 2. Notify, whatever the exit code (delivery failures are only logged)
//! 3. Delete both files
//! 4. Fail with `NonZeroExit` if the process did not succeed
//!
//! Step 3 also runs when step 2 panics or any later step returns early,
//! because the files are owned by [`Artifacts`] and removed on drop.
//! If step 1 fails there is nothing to attach, so step 2 is skipped with a
//! warning and the exit code still decides the outcome.

use std::path::Path;
use std::process::{ExitStatus, Output};

use stepjob_spec::{StepError, SubmissionRequest};
use tracing::warn;

use crate::artifacts::Artifacts;
use crate::error::ExecResult;
use crate::notify::{Notice, Notifier};

/// Runs a submission request to completion.
///
/// Implementations block until the external process has finished, the
/// notification has been attempted and the captured output removed.
pub trait Engine: Send + Sync {
    /// Short engine name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs the request and returns the captured result on success.
    ///
    /// # Errors
    ///
    /// Returns `NonZeroExit` (after notifying) if the job failed, and engine
    /// specific errors for failures before the job could run.
    fn execute(&self, request: &SubmissionRequest) -> ExecResult<ExecutionResult>;
}

/// Output and status of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Captured stdout, fully buffered.
    pub stdout: Vec<u8>,
    /// Captured stderr, fully buffered.
    pub stderr: Vec<u8>,
    /// Exit code; `-1` if the process was killed by a signal.
    pub exit_code: i32,
    /// Scheduler-assigned job id (scheduled engine only).
    pub job_id: Option<String>,
}

impl ExecutionResult {
    /// Creates a result from a finished process.
    pub fn from_output(output: Output, job_id: Option<String>) -> Self {
        Self {
            exit_code: exit_code(&output.status),
            stdout: output.stdout,
            stderr: output.stderr,
            job_id,
        }
    }

    /// Returns true if the job exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns stdout as text, replacing invalid UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Returns stderr as text, replacing invalid UTF-8.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Stages the captured output, notifies, cleans up and checks the exit code.
pub(crate) fn finish(
    result: ExecutionResult,
    request: &SubmissionRequest,
    artifact_dir: &Path,
    notifier: &dyn Notifier,
) -> ExecResult<ExecutionResult> {
    let job_name = request.job_name();
    let prefix = match &result.job_id {
        Some(id) => format!("{}.{}.", job_name, id),
        None => format!("{}.", job_name),
    };

    match Artifacts::write(artifact_dir, &prefix, &result.stdout, &result.stderr) {
        Ok(artifacts) => {
            let notice = Notice {
                job_name,
                job_id: result.job_id.as_deref(),
                success: result.success(),
                exit_code: result.exit_code,
                stdout_path: artifacts.stdout_path(),
                stderr_path: artifacts.stderr_path(),
            };
            if let Err(e) = notifier.notify(&notice) {
                warn!(target: "stepjob::notify", job = job_name, error = %e, "notification not delivered");
            }
            artifacts.cleanup();
        }
        Err(e) => {
            warn!(
                target: "stepjob::notify",
                job = job_name,
                dir = %artifact_dir.display(),
                error = %e,
                "could not stage output for mailing, notification skipped"
            );
        }
    }

    if !result.success() {
        return Err(StepError::non_zero_exit(job_name, result.exit_code).into());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecError, NotifyError};
    use std::sync::Mutex;
    use stepjob_spec::ResourceHints;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, bool, bool)>>,
        fail: bool,
    }

    impl Notifier for Recorder {
        fn notify(&self, notice: &Notice<'_>) -> Result<(), NotifyError> {
            let attachments_exist = notice.stdout_path.exists() && notice.stderr_path.exists();
            self.seen.lock().unwrap().push((
                notice.job_name.to_string(),
                notice.success,
                attachments_exist,
            ));
            if self.fail {
                Err(NotifyError::Failed(1))
            } else {
                Ok(())
            }
        }
    }

    fn request() -> SubmissionRequest {
        SubmissionRequest::new("job.sh", vec![], ResourceHints::default(), "sort_bam")
    }

    fn result(exit_code: i32) -> ExecutionResult {
        ExecutionResult {
            stdout: b"out".to_vec(),
            stderr: b"err".to_vec(),
            exit_code,
            job_id: None,
        }
    }

    #[test]
    fn test_success_notifies_and_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        let out = finish(result(0), &request(), dir.path(), &recorder).unwrap();
        assert!(out.success());
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![("sort_bam".to_string(), true, true)]
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failure_notifies_cleans_then_errors() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        let err = finish(result(3), &request(), dir.path(), &recorder).unwrap_err();
        assert!(matches!(
            err,
            ExecError::Step(StepError::NonZeroExit { exit_code: 3, .. })
        ));
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
        assert!(!recorder.seen.lock().unwrap()[0].1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_notify_failure_does_not_mask_result() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };

        assert!(finish(result(0), &request(), dir.path(), &recorder).is_ok());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unwritable_artifact_dir_keeps_job_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing-dir");
        let recorder = Recorder::default();

        let err = finish(result(3), &request(), &missing, &recorder).unwrap_err();
        assert!(matches!(
            err,
            ExecError::Step(StepError::NonZeroExit { exit_code: 3, .. })
        ));

        let out = finish(result(0), &request(), &missing, &recorder).unwrap();
        assert!(out.success());

        assert!(recorder.seen.lock().unwrap().is_empty());
        assert!(!missing.exists());
    }

    #[test]
    fn test_lossy_accessors() {
        let r = result(0);
        assert_eq!(r.stdout_lossy(), "out");
        assert_eq!(r.stderr_lossy(), "err");
    }
}
