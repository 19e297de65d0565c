//! File extension to command-line flag classification.
//!
//! The external job script receives every file as a `<flag> <path>` pair. The
//! flag depends on whether the file is read (input) or written (output) by the
//! script, and on its extension. The table below is a fixed contract with the
//! job scripts and must not drift:
//!
//! | Extension | Input | Output |
//! |-----------|-------|--------|
//! | `.bam` | `-b` | `-c` |
//! | `.bai` | | `-d` |
//! | `.fa`, `.fasta` | `-f` | `-g` |
//! | `.fastq`, `.fq` | `--fq` | `--ofq` |
//! | `.dict` | | `-h` |
//! | `.fai` | | `-i` |
//! | `.gtf` | `-j` | `-k` |
//! | `.bed` | `-l` | `-m` |
//! | `.pdf` | | `-r` |
//! | `.table` | `-t` | `-u` |
//! | `.vcf` | `-v` | `-w` |
//! | `.html`, `.txt`, `.Rds` | `-y` | `-z` |
//!
//! Credentials for download jobs use `-e` (login) and `-p` (password); those
//! are literal and never derived from an extension.

use serde::Serialize;
use tracing::trace;

use crate::error::{StepError, StepResult};

/// Suffix stripped once before classification, so `x.vcf.gz` classifies as `.vcf`.
pub const COMPRESSION_SUFFIX: &str = ".gz";

/// Flag preceding the login of a download job.
pub const LOGIN_FLAG: FlagToken = FlagToken("-e");

/// Flag preceding the password of a download job.
pub const PASSWORD_FLAG: FlagToken = FlagToken("-p");

/// Whether a file is consumed or produced by the job script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// Read by the job script.
    Input,
    /// Written by the job script.
    Output,
}

impl FileRole {
    /// Returns the lowercase name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Input => "input",
            FileRole::Output => "output",
        }
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" | "in" => Ok(FileRole::Input),
            "output" | "out" => Ok(FileRole::Output),
            other => Err(format!(
                "unknown file role '{}' (expected input or output)",
                other
            )),
        }
    }
}

/// A command-line switch understood by the job script, e.g. `-b` or `--fq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FlagToken(&'static str);

impl FlagToken {
    /// Returns the switch text.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for FlagToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<FlagToken> for String {
    fn from(token: FlagToken) -> Self {
        token.0.to_string()
    }
}

const INPUT_FLAGS: &[(&str, FlagToken)] = &[
    (".bam", FlagToken("-b")),
    (".fa", FlagToken("-f")),
    (".fasta", FlagToken("-f")),
    (".fastq", FlagToken("--fq")),
    (".fq", FlagToken("--fq")),
    (".gtf", FlagToken("-j")),
    (".bed", FlagToken("-l")),
    (".table", FlagToken("-t")),
    (".vcf", FlagToken("-v")),
    (".html", FlagToken("-y")),
    (".txt", FlagToken("-y")),
    (".Rds", FlagToken("-y")),
];

const OUTPUT_FLAGS: &[(&str, FlagToken)] = &[
    (".bam", FlagToken("-c")),
    (".bai", FlagToken("-d")),
    (".fa", FlagToken("-g")),
    (".fasta", FlagToken("-g")),
    (".fastq", FlagToken("--ofq")),
    (".fq", FlagToken("--ofq")),
    (".dict", FlagToken("-h")),
    (".fai", FlagToken("-i")),
    (".gtf", FlagToken("-k")),
    (".bed", FlagToken("-m")),
    (".pdf", FlagToken("-r")),
    (".table", FlagToken("-u")),
    (".vcf", FlagToken("-w")),
    (".html", FlagToken("-z")),
    (".txt", FlagToken("-z")),
    (".Rds", FlagToken("-z")),
];

/// The fixed (role, extension) to flag mapping.
///
/// Read-only for the life of the process; shared freely between threads.
#[derive(Debug)]
pub struct ExtensionTable {
    input: &'static [(&'static str, FlagToken)],
    output: &'static [(&'static str, FlagToken)],
}

static STANDARD_TABLE: ExtensionTable = ExtensionTable {
    input: INPUT_FLAGS,
    output: OUTPUT_FLAGS,
};

impl ExtensionTable {
    /// Returns the table shared by every job script.
    pub fn standard() -> &'static ExtensionTable {
        &STANDARD_TABLE
    }

    /// Returns the registered (extension, flag) pairs for a role, in table order.
    pub fn entries(&self, role: FileRole) -> &'static [(&'static str, FlagToken)] {
        match role {
            FileRole::Input => self.input,
            FileRole::Output => self.output,
        }
    }

    /// Looks up the flag for an already-normalized extension (leading dot included).
    pub fn lookup(&self, role: FileRole, extension: &str) -> Option<FlagToken> {
        self.entries(role)
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, token)| *token)
    }
}

/// Returns the final dot-suffix of the last path component, dot included.
///
/// Only `/` separates path components; a backslash is part of the name.
/// Names without a dot, and names whose last dot is preceded only by dots
/// (`.bashrc`, `..x`), have no extension and return an empty string.
fn split_extension(file_name: &str) -> (&str, &str) {
    let base_start = file_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let base = &file_name[base_start..];
    match base.rfind('.') {
        Some(dot) if !base[..dot].bytes().all(|b| b == b'.') => {
            file_name.split_at(base_start + dot)
        }
        _ => (file_name, ""),
    }
}

/// Returns the extension used for classification.
///
/// A trailing compression suffix is stripped exactly once, so the extension
/// of `reads.fq.gz` is `.fq` but that of `reads.fq.gz.gz` is `.gz`.
pub fn normalized_extension(file_name: &str) -> &str {
    let (stem, ext) = split_extension(file_name);
    if ext == COMPRESSION_SUFFIX {
        split_extension(stem).1
    } else {
        ext
    }
}

/// Maps a file name to the flag the job script expects for it.
///
/// # Errors
///
/// Returns [`StepError::UnrecognizedExtension`] when the (role, extension) pair
/// has no entry. Falling back to a default flag would silently corrupt the
/// job script's argument parsing, so this is always a hard error.
///
/// # Example
/// ```
/// use stepjob_spec::flags::{classify, FileRole};
///
/// assert_eq!(classify("sample.vcf.gz", FileRole::Output).unwrap().as_str(), "-w");
/// assert!(classify("notes.docx", FileRole::Input).is_err());
/// ```
pub fn classify(file_name: &str, role: FileRole) -> StepResult<FlagToken> {
    let extension = normalized_extension(file_name);
    trace!(target: "stepjob::classify", file_name, %role, extension, "classify");
    ExtensionTable::standard()
        .lookup(role, extension)
        .ok_or_else(|| StepError::unrecognized_extension(extension, role))
}

/// Classifies a file and returns the `[flag, file_name]` token pair.
pub fn classify_pair(file_name: &str, role: FileRole) -> StepResult<[String; 2]> {
    let flag = classify(file_name, role)?;
    Ok([flag.into(), file_name.to_string()])
}
