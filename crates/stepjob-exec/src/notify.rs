//! Job outcome notifications.
//!
//! Notification is a best-effort side channel: engines call the notifier once
//! per job, whatever the exit code, and only log a failed delivery.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// What a notifier is told about a finished job.
#[derive(Debug, Clone, Copy)]
pub struct Notice<'a> {
    /// Job name.
    pub job_name: &'a str,
    /// Scheduler job id, for scheduled runs.
    pub job_id: Option<&'a str>,
    /// Whether the job exited successfully.
    pub success: bool,
    /// Exit code of the job (or scheduler).
    pub exit_code: i32,
    /// File holding the captured stdout.
    pub stdout_path: &'a Path,
    /// File holding the captured stderr.
    pub stderr_path: &'a Path,
}

impl Notice<'_> {
    /// Formats the subject line: `<prefix> Pipeline step <job> finished|FAILED`.
    pub fn subject(&self, prefix: &str) -> String {
        let status = if self.success { "finished" } else { "FAILED" };
        let head = if prefix.is_empty() {
            String::new()
        } else {
            format!("{} ", prefix)
        };
        format!("{}Pipeline step {} {}", head, self.job_name, status)
    }
}

/// Delivers job outcome notices.
pub trait Notifier: Send + Sync {
    /// Sends a notice. Attachments only exist for the duration of this call.
    fn notify(&self, notice: &Notice<'_>) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: &Notice<'_>) -> Result<(), NotifyError> {
        (**self).notify(notice)
    }
}

/// Sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: &Notice<'_>) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Mails the notice with stdout and stderr attached.
///
/// Runs `<mail> -s <subject> -A <stdout> -A <stderr> <recipient>` with an
/// empty body and waits for it to exit.
#[derive(Debug, Clone)]
pub struct MailNotifier {
    config: NotifyConfig,
}

impl MailNotifier {
    /// Creates a mail notifier from its configuration.
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }

    /// Builds the mail command for a notice.
    fn command(&self, program: &Path, notice: &Notice<'_>) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("-s")
            .arg(notice.subject(&self.config.subject_prefix))
            .arg("-A")
            .arg(notice.stdout_path)
            .arg("-A")
            .arg(notice.stderr_path)
            .arg(&self.config.recipient)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    fn program(&self) -> Result<PathBuf, NotifyError> {
        self.config
            .resolve()
            .ok_or_else(|| NotifyError::ProgramNotFound(self.config.program.clone()))
    }
}

impl Notifier for MailNotifier {
    fn notify(&self, notice: &Notice<'_>) -> Result<(), NotifyError> {
        let program = self.program()?;
        debug!(
            target: "stepjob::notify",
            program = %program.display(),
            recipient = %self.config.recipient,
            job = notice.job_name,
            success = notice.success,
            "sending notification"
        );
        let status = self.command(&program, notice).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Failed(status.code().unwrap_or(-1)))
        }
    }
}

/// Builds the notifier described by a configuration.
pub fn notifier_from_config(config: &NotifyConfig) -> Box<dyn Notifier> {
    if config.enabled {
        Box::new(MailNotifier::new(config.clone()))
    } else {
        Box::new(NullNotifier)
    }
}
