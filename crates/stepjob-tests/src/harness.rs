//! Fake cluster programs and helpers for inspecting what a step left behind.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use stepjob_exec::{EngineConfig, NotifyConfig};
use tempfile::TempDir;

/// Job id printed by the default fake scheduler.
pub const FAKE_JOB_ID: &str = "4242";

/// Recipient configured by [`StepHarness::engine_config`].
pub const RECIPIENT: &str = "pipeline-tester";

/// One invocation of the recording mail program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailCall {
    pub args: Vec<String>,
}

impl MailCall {
    /// Value following `-s`.
    pub fn subject(&self) -> Option<&str> {
        self.value_after("-s")
    }

    /// Paths following each `-A`.
    pub fn attachments(&self) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|w| w[0] == "-A")
            .map(|w| w[1].as_str())
            .collect()
    }

    /// Last argument.
    pub fn recipient(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    fn value_after(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].as_str())
    }
}

/// A temp directory holding fake programs, job scripts and the artifact
/// directory for one test.
pub struct StepHarness {
    /// Working directory for everything the test creates.
    pub work_dir: TempDir,
}

impl StepHarness {
    /// Create a new harness with an empty artifact directory.
    pub fn new() -> Self {
        let work_dir = TempDir::new().expect("Failed to create work dir");
        fs::create_dir(work_dir.path().join("artifacts")).expect("Failed to create artifact dir");
        Self { work_dir }
    }

    /// Get the working directory path.
    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    /// Directory the engines stage stdout/stderr files in.
    pub fn artifact_dir(&self) -> PathBuf {
        self.path().join("artifacts")
    }

    /// Number of files currently in the artifact directory.
    pub fn artifact_count(&self) -> usize {
        fs::read_dir(self.artifact_dir())
            .expect("Failed to read artifact dir")
            .count()
    }

    /// Writes an executable `sh` script with the given body.
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        path
    }

    /// A job script that echoes its arguments on stdout, writes `note` on
    /// stderr and exits with `exit_code`.
    pub fn job_script(&self, name: &str, exit_code: i32) -> PathBuf {
        self.write_script(
            name,
            &format!(
                "echo \"args: $*\"\necho \"note from {}\" >&2\nexit {}",
                name, exit_code
            ),
        )
    }

    /// A scheduler that records its arguments, announces [`FAKE_JOB_ID`] on
    /// stderr, runs the script that follows its `--key=value` options and
    /// exits with the script's status.
    pub fn fake_scheduler(&self) -> PathBuf {
        self.scheduler_with_banner(&format!("salloc: Granted job allocation {}", FAKE_JOB_ID))
    }

    /// Like [`fake_scheduler`](Self::fake_scheduler), with a custom stderr
    /// banner in place of the allocation line.
    pub fn scheduler_with_banner(&self, banner: &str) -> PathBuf {
        let log = self.path().join("scheduler.args");
        self.write_script(
            "salloc",
            &format!(
                r#"printf '%s\n' "$@" > "{log}"
echo "{banner}" >&2
while [ $# -gt 0 ]; do
  case "$1" in
    --*=*) shift ;;
    *) break ;;
  esac
done
"$@"
exit $?"#,
                log = log.display(),
                banner = banner,
            ),
        )
    }

    /// Arguments the fake scheduler was last invoked with.
    pub fn scheduler_args(&self) -> Vec<String> {
        read_lines(&self.path().join("scheduler.args"))
    }

    /// A mail program that appends its arguments to `mail.log` and the
    /// contents of every attachment to `mail.attachments`.
    pub fn recording_mail(&self) -> PathBuf {
        let log = self.path().join("mail.log");
        let attachments = self.path().join("mail.attachments");
        self.write_script(
            "mail",
            &format!(
                r#"printf '%s\n' "$@" >> "{log}"
echo "---" >> "{log}"
while [ $# -gt 0 ]; do
  if [ "$1" = "-A" ]; then
    cat "$2" >> "{attachments}"
    shift
  fi
  shift
done"#,
                log = log.display(),
                attachments = attachments.display(),
            ),
        )
    }

    /// Every recorded mail invocation, oldest first.
    pub fn mail_calls(&self) -> Vec<MailCall> {
        let mut calls = Vec::new();
        let mut current = Vec::new();
        for line in read_lines(&self.path().join("mail.log")) {
            if line == "---" {
                calls.push(MailCall {
                    args: std::mem::take(&mut current),
                });
            } else {
                current.push(line);
            }
        }
        calls
    }

    /// Concatenated contents of all mailed attachments.
    pub fn mailed_attachments(&self) -> String {
        fs::read_to_string(self.path().join("mail.attachments")).unwrap_or_default()
    }

    /// Config wired to the fake scheduler, the recording mail program and
    /// the harness artifact directory.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .scheduler_path(self.fake_scheduler())
            .artifact_dir(self.artifact_dir())
            .notify(
                NotifyConfig::with_recipient(RECIPIENT)
                    .subject_prefix("[test]")
                    .mail_path(self.recording_mail()),
            )
    }
}

impl Default for StepHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
