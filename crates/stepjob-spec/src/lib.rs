//! stepjob step library
//!
//! This crate holds the pure, side-effect-free half of stepjob: everything that
//! turns a pipeline step's arguments into the command line of an external job
//! script, without running anything.
//!
//! # Overview
//!
//! - **Classification**: each file is mapped to a flag from its role (input or
//!   output) and its extension, e.g. an output `.bam` becomes `-c out.bam`
//! - **Marshalling**: nested file groups are flattened in order and expanded
//!   into `flag, value` token pairs
//! - **Shapes**: a [`JobShape`] fixes which positional arguments a step takes
//!   (inputs, outputs, credentials, extras) and the order they are assembled in
//! - **Requests**: a [`SubmissionRequest`] bundles script, tokens, resource
//!   hints and job name for an execution engine
//!
//! # Example
//!
//! ```
//! use stepjob_spec::{ArgAssembler, JobShape, JobType, StepArg};
//!
//! let assembler = ArgAssembler::new(JobShape::new(JobType::Transform));
//! let tokens = assembler
//!     .assemble(vec![StepArg::files(vec!["x.fq"]), StepArg::files(vec!["y.bam"])])
//!     .unwrap();
//! assert_eq!(tokens, ["--fq", "x.fq", "-c", "y.bam"]);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy shared by the whole workspace
//! - [`flags`]: The extension table and classifier
//! - [`files`]: Nested file collections and the marshaller
//! - [`shape`]: Job types, shapes and positional argument assembly
//! - [`request`]: Resource hints and submission requests

pub mod error;
pub mod files;
pub mod flags;
pub mod request;
pub mod shape;

// Re-export commonly used types at the crate root
pub use error::{CodedError, StepError, StepResult};
pub use files::{marshal, FileTree};
pub use flags::{classify, classify_pair, ExtensionTable, FileRole, FlagToken};
pub use request::{ResourceHints, SubmissionRequest};
pub use shape::{ArgAssembler, ArgSlot, JobShape, JobType, StepArg};
