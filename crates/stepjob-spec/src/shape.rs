//! Job shapes: which positional arguments a step accepts and how they become
//! job script tokens.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::files::{marshal, FileTree};
use crate::flags::{FileRole, LOGIN_FLAG, PASSWORD_FLAG};

/// The calling convention family of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Reads input files and writes output files.
    Transform,
    /// Writes output files from nothing.
    Originate,
    /// Fetches output files using a login and password.
    Download,
}

impl JobType {
    /// Every allowed job type.
    pub const ALL: [JobType; 3] = [JobType::Transform, JobType::Originate, JobType::Download];

    /// Returns the lowercase identifier for this job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Transform => "transform",
            JobType::Originate => "originate",
            JobType::Download => "download",
        }
    }

    /// Parses a job type name, case-insensitively.
    pub fn parse(name: &str) -> StepResult<JobType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "transform" => Ok(JobType::Transform),
            "originate" => Ok(JobType::Originate),
            "download" => Ok(JobType::Download),
            _ => Err(StepError::invalid_job_type(name)),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::parse(s)
    }
}

/// One positional parameter of a generated step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgSlot {
    InputFiles,
    OutputFiles,
    Login,
    Password,
    Extras,
}

impl ArgSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgSlot::InputFiles => "input_files",
            ArgSlot::OutputFiles => "output_files",
            ArgSlot::Login => "login",
            ArgSlot::Password => "password",
            ArgSlot::Extras => "extras",
        }
    }
}

impl std::fmt::Display for ArgSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional argument handed to a step function by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    /// A plain string: a credential, a single file, or a single extra token.
    Text(String),
    /// A possibly nested collection of file names.
    Files(FileTree),
    /// A list of extra tokens passed through verbatim.
    Tokens(Vec<String>),
}

impl StepArg {
    /// Wraps anything convertible to a [`FileTree`].
    pub fn files(files: impl Into<FileTree>) -> Self {
        StepArg::Files(files.into())
    }

    /// Wraps a plain string.
    pub fn text(text: impl Into<String>) -> Self {
        StepArg::Text(text.into())
    }

    /// Wraps a list of extra tokens.
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StepArg::Tokens(tokens.into_iter().map(Into::into).collect())
    }
}

/// Describes the calling convention of a generated step function.
///
/// Arguments are always assembled in the same order: inputs, outputs,
/// credentials, extras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobShape {
    /// The job type.
    pub job_type: JobType,
    /// Whether a trailing extras argument is accepted.
    #[serde(default)]
    pub has_extras: bool,
}

impl JobShape {
    /// Creates a shape without extras.
    pub fn new(job_type: JobType) -> Self {
        Self {
            job_type,
            has_extras: false,
        }
    }

    /// Sets whether a trailing extras argument is accepted.
    pub fn with_extras(mut self, has_extras: bool) -> Self {
        self.has_extras = has_extras;
        self
    }

    /// Returns the ordered positional slots a step of this shape accepts.
    pub fn slots(&self) -> Vec<ArgSlot> {
        let mut slots = Vec::with_capacity(4);
        if self.job_type == JobType::Transform {
            slots.push(ArgSlot::InputFiles);
        }
        slots.push(ArgSlot::OutputFiles);
        if self.job_type == JobType::Download {
            slots.push(ArgSlot::Login);
            slots.push(ArgSlot::Password);
        }
        if self.has_extras {
            slots.push(ArgSlot::Extras);
        }
        slots
    }

    /// Returns the number of positional arguments a step of this shape accepts.
    pub fn arity(&self) -> usize {
        self.slots().len()
    }
}

/// Turns positional step arguments into job script tokens.
///
/// Built once per step; holds the precomputed slot list so every call consumes
/// its arguments strictly left to right against the same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgAssembler {
    shape: JobShape,
    slots: Vec<ArgSlot>,
}

impl ArgAssembler {
    /// Creates an assembler for a shape.
    pub fn new(shape: JobShape) -> Self {
        Self {
            shape,
            slots: shape.slots(),
        }
    }

    /// Returns the shape this assembler was built for.
    pub fn shape(&self) -> JobShape {
        self.shape
    }

    /// Returns the precomputed positional slots.
    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    /// Consumes positional arguments and returns the flattened token list.
    ///
    /// # Errors
    ///
    /// - [`StepError::MissingArgument`] if fewer arguments than slots are given
    /// - [`StepError::ArgumentKindMismatch`] if an argument does not fit its slot
    /// - [`StepError::UnconsumedArguments`] if arguments remain after the last slot
    /// - [`StepError::UnrecognizedExtension`] if a file cannot be classified
    pub fn assemble(&self, args: Vec<StepArg>) -> StepResult<Vec<String>> {
        let mut args = args.into_iter();
        let mut tokens = Vec::new();

        for &slot in &self.slots {
            let arg = args.next().ok_or(StepError::MissingArgument { slot })?;
            match slot {
                ArgSlot::InputFiles => tokens.extend(marshal_slot(arg, slot, FileRole::Input)?),
                ArgSlot::OutputFiles => tokens.extend(marshal_slot(arg, slot, FileRole::Output)?),
                ArgSlot::Login => {
                    tokens.push(LOGIN_FLAG.into());
                    tokens.push(credential(arg, slot)?);
                }
                ArgSlot::Password => {
                    tokens.push(PASSWORD_FLAG.into());
                    tokens.push(credential(arg, slot)?);
                }
                ArgSlot::Extras => tokens.extend(verbatim(arg)),
            }
        }

        let remaining = args.count();
        if remaining > 0 {
            return Err(StepError::UnconsumedArguments { remaining });
        }

        debug!(target: "stepjob::step", job_type = %self.shape.job_type, ?tokens, "assembled arguments");
        Ok(tokens)
    }
}

fn marshal_slot(arg: StepArg, slot: ArgSlot, role: FileRole) -> StepResult<Vec<String>> {
    match arg {
        StepArg::Files(files) => marshal(&files, role),
        StepArg::Text(name) => marshal(&FileTree::File(name), role),
        StepArg::Tokens(_) => Err(StepError::ArgumentKindMismatch { slot }),
    }
}

fn credential(arg: StepArg, slot: ArgSlot) -> StepResult<String> {
    match arg {
        StepArg::Text(value) => Ok(value),
        _ => Err(StepError::ArgumentKindMismatch { slot }),
    }
}

fn verbatim(arg: StepArg) -> Vec<String> {
    match arg {
        StepArg::Text(token) => vec![token],
        StepArg::Tokens(tokens) => tokens,
        StepArg::Files(files) => files.flatten().into_iter().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_type_parse() {
        assert_eq!(JobType::parse("transform").unwrap(), JobType::Transform);
        assert_eq!(JobType::parse("Originate").unwrap(), JobType::Originate);
        assert_eq!("DOWNLOAD".parse::<JobType>().unwrap(), JobType::Download);
        assert_eq!(
            JobType::parse("merge").unwrap_err(),
            StepError::invalid_job_type("merge")
        );
    }

    #[test]
    fn test_slots_per_shape() {
        use ArgSlot::*;
        let cases = [
            (JobShape::new(JobType::Transform), vec![InputFiles, OutputFiles]),
            (JobShape::new(JobType::Originate), vec![OutputFiles]),
            (JobShape::new(JobType::Download), vec![OutputFiles, Login, Password]),
            (
                JobShape::new(JobType::Transform).with_extras(true),
                vec![InputFiles, OutputFiles, Extras],
            ),
            (
                JobShape::new(JobType::Download).with_extras(true),
                vec![OutputFiles, Login, Password, Extras],
            ),
        ];
        for (shape, expected) in cases {
            assert_eq!(shape.slots(), expected);
            assert_eq!(shape.arity(), expected.len());
        }
    }

    #[test]
    fn test_transform_inputs_then_outputs() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Transform));
        let tokens = assembler
            .assemble(vec![StepArg::files(vec!["x.fq"]), StepArg::files(vec!["y.bam"])])
            .unwrap();
        assert_eq!(tokens, vec!["--fq", "x.fq", "-c", "y.bam"]);
    }

    #[test]
    fn test_download_credentials_are_literal() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Download));
        let tokens = assembler
            .assemble(vec![
                StepArg::files(vec!["z.fa"]),
                StepArg::text("u"),
                StepArg::text("p"),
            ])
            .unwrap();
        assert_eq!(tokens, vec!["-g", "z.fa", "-e", "u", "-p", "p"]);
    }

    #[test]
    fn test_extras_appended_verbatim() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Originate).with_extras(true));
        let tokens = assembler
            .assemble(vec![
                StepArg::files("genome.fa"),
                StepArg::tokens(["GRCh38", "--weird.bam"]),
            ])
            .unwrap();
        assert_eq!(tokens, vec!["-g", "genome.fa", "GRCh38", "--weird.bam"]);

        let tokens = assembler
            .assemble(vec![StepArg::files("genome.fa"), StepArg::files(vec!["a.xyz"])])
            .unwrap();
        assert_eq!(tokens, vec!["-g", "genome.fa", "a.xyz"]);
    }

    #[test]
    fn test_too_many_arguments() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Originate));
        let err = assembler
            .assemble(vec![StepArg::files("a.bam"), StepArg::text("surplus")])
            .unwrap_err();
        assert_eq!(err, StepError::UnconsumedArguments { remaining: 1 });
    }

    #[test]
    fn test_too_few_arguments() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Download));
        let err = assembler
            .assemble(vec![StepArg::files("a.fa"), StepArg::text("login")])
            .unwrap_err();
        assert_eq!(
            err,
            StepError::MissingArgument {
                slot: ArgSlot::Password
            }
        );
    }

    #[test]
    fn test_kind_mismatch() {
        let assembler = ArgAssembler::new(JobShape::new(JobType::Download));
        let err = assembler
            .assemble(vec![
                StepArg::files("a.fa"),
                StepArg::files(vec!["not-a-login"]),
                StepArg::text("p"),
            ])
            .unwrap_err();
        assert_eq!(err, StepError::ArgumentKindMismatch { slot: ArgSlot::Login });
    }

    #[test]
    fn test_shape_deserializes() {
        let shape: JobShape = serde_json::from_str(r#"{"job_type": "download"}"#).unwrap();
        assert_eq!(shape, JobShape::new(JobType::Download));
    }
}
