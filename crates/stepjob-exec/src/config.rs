//! Engine configuration: scheduler and mail programs, notification settings
//! and where captured output is staged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};

/// Environment variable overriding the scheduler executable.
pub const SCHEDULER_ENV: &str = "STEPJOB_SCHEDULER";
/// Environment variable overriding the mail executable.
pub const MAIL_ENV: &str = "STEPJOB_MAIL";
/// Default scheduler program, used in blocking allocate-and-run mode.
pub const DEFAULT_SCHEDULER: &str = "salloc";
/// Default mail program.
pub const DEFAULT_MAIL: &str = "mail";
/// Default subject prefix for notifications.
pub const DEFAULT_SUBJECT_PREFIX: &str = "[stepjob]";

/// Top-level configuration shared by both engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Scheduler settings (scheduled engine only).
    pub scheduler: SchedulerConfig,
    /// Notification settings.
    pub notify: NotifyConfig,
    /// Directory for the transient stdout/stderr attachments.
    /// Defaults to the system temp directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Sets the scheduler executable path.
    pub fn scheduler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scheduler.path = Some(path.into());
        self
    }

    /// Replaces the notification settings.
    pub fn notify(mut self, notify: NotifyConfig) -> Self {
        self.notify = notify;
        self
    }

    /// Sets the artifact directory.
    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Returns the directory artifacts are written to.
    pub fn resolved_artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Scheduler executable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Program name looked up on PATH.
    pub program: String,
    /// Explicit executable path; takes precedence over everything else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SCHEDULER.to_string(),
            path: None,
        }
    }
}

impl SchedulerConfig {
    /// Finds the scheduler executable.
    pub fn resolve(&self) -> ExecResult<PathBuf> {
        find_program(self.path.as_deref(), SCHEDULER_ENV, &self.program).ok_or_else(|| {
            ExecError::ProgramNotFound {
                program: self.program.clone(),
                env_var: SCHEDULER_ENV,
            }
        })
    }
}

/// Notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Whether notifications are sent at all.
    pub enabled: bool,
    /// Mail recipient.
    pub recipient: String,
    /// Text placed before "Pipeline step ..." in the subject.
    pub subject_prefix: String,
    /// Mail program name looked up on PATH.
    pub program: String,
    /// Explicit mail executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipient: default_recipient(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            program: DEFAULT_MAIL.to_string(),
            path: None,
        }
    }
}

impl NotifyConfig {
    /// Creates an enabled config mailing the given recipient.
    pub fn with_recipient(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            ..Default::default()
        }
    }

    /// Creates a config that sends nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets the subject prefix.
    pub fn subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    /// Sets the mail executable path.
    pub fn mail_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Finds the mail executable, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        find_program(self.path.as_deref(), MAIL_ENV, &self.program)
    }
}

fn default_recipient() -> String {
    std::env::var("USER")
        .ok()
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| "root".to_string())
}

/// Locates an executable.
///
/// Checked in order:
/// 1. Explicit path from the configuration
/// 2. The given environment variable
/// 3. The program name on PATH
pub fn find_program(explicit: Option<&Path>, env_var: &str, program: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Ok(path) = std::env::var(env_var) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    which::which(program).ok()
}
