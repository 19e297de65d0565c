//! Transient stdout/stderr files backing the notification attachments.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{ExecError, ExecResult};

/// Suffix of the captured stdout file.
pub const STDOUT_SUFFIX: &str = ".out.txt";
/// Suffix of the captured stderr file.
pub const STDERR_SUFFIX: &str = ".err.txt";

/// The two captured-output files of one job run.
///
/// File names are unique per invocation, so concurrent steps never collide.
/// Both files are deleted by [`Artifacts::cleanup`] or, on any early return,
/// when the value is dropped.
#[derive(Debug)]
pub struct Artifacts {
    stdout: NamedTempFile,
    stderr: NamedTempFile,
}

impl Artifacts {
    /// Writes captured output into two fresh files under `dir`.
    ///
    /// `prefix` typically is `"<job_name>."`, or `"<job_name>.<job_id>."` for
    /// scheduled jobs.
    pub fn write(dir: &Path, prefix: &str, stdout: &[u8], stderr: &[u8]) -> ExecResult<Self> {
        let stdout = write_one(dir, prefix, STDOUT_SUFFIX, stdout)?;
        let stderr = write_one(dir, prefix, STDERR_SUFFIX, stderr)?;
        Ok(Self { stdout, stderr })
    }

    /// Path of the captured stdout file.
    pub fn stdout_path(&self) -> &Path {
        self.stdout.path()
    }

    /// Path of the captured stderr file.
    pub fn stderr_path(&self) -> &Path {
        self.stderr.path()
    }

    /// Deletes both files. Failures are logged, never returned.
    pub fn cleanup(self) {
        for file in [self.stdout, self.stderr] {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                warn!(target: "stepjob::engine", path = %path.display(), error = %e, "failed to remove captured output");
            }
        }
    }
}

fn write_one(dir: &Path, prefix: &str, suffix: &str, data: &[u8]) -> ExecResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(ExecError::ArtifactWrite)?;
    file.write_all(data).map_err(ExecError::ArtifactWrite)?;
    file.flush().map_err(ExecError::ArtifactWrite)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = Artifacts::write(dir.path(), "align.", b"hello", b"oops").unwrap();

        let out = artifacts.stdout_path().to_path_buf();
        let err = artifacts.stderr_path().to_path_buf();
        assert_eq!(std::fs::read(&out).unwrap(), b"hello");
        assert_eq!(std::fs::read(&err).unwrap(), b"oops");

        let out_name = out.file_name().unwrap().to_string_lossy().into_owned();
        assert!(out_name.starts_with("align."));
        assert!(out_name.ends_with(".out.txt"));
        assert!(err.to_string_lossy().ends_with(".err.txt"));

        artifacts.cleanup();
        assert!(!out.exists());
        assert!(!err.exists());
    }

    #[test]
    fn test_drop_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _artifacts = Artifacts::write(dir.path(), "job.", b"", b"").unwrap();
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = Artifacts::write(dir.path(), "same.", b"", b"").unwrap();
        let b = Artifacts::write(dir.path(), "same.", b"", b"").unwrap();
        assert_ne!(a.stdout_path(), b.stdout_path());
        assert_ne!(a.stderr_path(), b.stderr_path());
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let result = Artifacts::write(Path::new("/nonexistent/stepjob"), "x.", b"", b"");
        assert!(matches!(result, Err(ExecError::ArtifactWrite(_))));
    }
}
