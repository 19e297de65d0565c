//! JSON output types for the `--json` flag.
//!
//! Error codes are passed through from the library error types
//! (`STEP_xxx`, `EXEC_xxx`) so scripts can branch on them.

use serde::Serialize;
use stepjob_spec::CodedError;

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g. "STEP_001")
    pub code: String,
    /// Error family ("step" or "exec")
    pub category: String,
    /// Human-readable error message
    pub message: String,
}

impl JsonError {
    /// Builds a JSON error from any coded library error.
    pub fn from_coded(err: &dyn CodedError) -> Self {
        Self {
            code: err.code().to_string(),
            category: err.category().to_string(),
            message: err.message(),
        }
    }
}

/// One file in `classify` output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

/// Output of `classify --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutput {
    pub success: bool,
    pub role: String,
    pub files: Vec<ClassifiedFile>,
}

/// One row of `classify --list --json`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableEntry {
    pub extension: String,
    pub flag: String,
}

/// Output of `marshal --json`.
#[derive(Debug, Clone, Serialize)]
pub struct MarshalOutput {
    pub success: bool,
    pub role: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

/// Output of `run --json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub success: bool,
    pub job_name: String,
    pub engine: String,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
