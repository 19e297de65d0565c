//! Run command implementation
//!
//! Builds a step function from the command line, then either prints the
//! assembled job command (`--dry-run`) or runs it to completion.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use stepjob_exec::{build_engine, make_step, EngineKind, ExecError, StepOptions};
use stepjob_spec::{CodedError, FileTree, JobType, ResourceHints, StepArg};

use super::json_output::{print_json, JsonError, RunOutput};
use crate::config::load_engine_config;

/// Arguments of `stepjob run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Job type: transform, originate or download
    #[arg(long = "type", value_name = "TYPE")]
    pub job_type: String,

    /// Path to the job script
    #[arg(long)]
    pub script: PathBuf,

    /// Job name used for the scheduler and the notification subject
    #[arg(long)]
    pub name: String,

    /// Input file (can be repeated)
    #[arg(long = "input", value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output file (can be repeated)
    #[arg(long = "output", value_name = "FILE")]
    pub outputs: Vec<String>,

    /// Login for download jobs
    #[arg(long)]
    pub login: Option<String>,

    /// Password for download jobs
    #[arg(long)]
    pub password: Option<String>,

    /// Extra token passed verbatim after the file flags (can be repeated)
    #[arg(long = "extra", value_name = "TOKEN", allow_hyphen_values = true)]
    pub extras: Vec<String>,

    /// Run the script as a child process instead of through the scheduler
    #[arg(long)]
    pub direct: bool,

    /// Number of tasks requested from the scheduler
    #[arg(long)]
    pub ntasks: Option<u32>,

    /// CPUs per task
    #[arg(long)]
    pub cpus_per_task: Option<u32>,

    /// Memory per CPU in MB
    #[arg(long)]
    pub mem_per_cpu: Option<u32>,

    /// Scheduling niceness
    #[arg(long, allow_hyphen_values = true)]
    pub nice: Option<i32>,

    /// Engine config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the assembled command line without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Output machine-readable JSON (no colored output)
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Resource hints with command-line overrides applied.
    pub fn resources(&self) -> ResourceHints {
        let mut hints = ResourceHints::default();
        if let Some(n) = self.ntasks {
            hints = hints.ntasks(n);
        }
        if let Some(c) = self.cpus_per_task {
            hints = hints.cpus_per_task(c);
        }
        if let Some(m) = self.mem_per_cpu {
            hints = hints.mem_per_cpu(m);
        }
        if let Some(x) = self.nice {
            hints = hints.nice(x);
        }
        hints
    }

    /// The engine the step runs on.
    pub fn engine_kind(&self) -> EngineKind {
        if self.direct {
            EngineKind::Direct
        } else {
            EngineKind::Scheduled
        }
    }

    /// Positional step arguments for a job type, in calling order.
    ///
    /// A missing login or password is left out so that argument assembly
    /// reports the missing slot.
    pub fn step_args(&self, job_type: JobType) -> Result<Vec<StepArg>> {
        if job_type != JobType::Transform && !self.inputs.is_empty() {
            bail!("--input is only accepted by transform steps");
        }
        if job_type != JobType::Download && (self.login.is_some() || self.password.is_some()) {
            bail!("--login/--password are only accepted by download steps");
        }

        let mut args = Vec::new();
        if job_type == JobType::Transform {
            args.push(StepArg::Files(FileTree::from(self.inputs.clone())));
        }
        args.push(StepArg::Files(FileTree::from(self.outputs.clone())));
        if job_type == JobType::Download {
            args.extend(self.login.clone().map(StepArg::Text));
            args.extend(self.password.clone().map(StepArg::Text));
        }
        if !self.extras.is_empty() {
            args.push(StepArg::Tokens(self.extras.clone()));
        }
        Ok(args)
    }
}

/// Run the run command
///
/// # Returns
/// Exit code: 0 if the step succeeded (or was assembled, for `--dry-run`),
/// 1 on any step failure
pub fn run(args: &RunArgs) -> Result<ExitCode> {
    let config = load_engine_config(args.config.as_deref())?;
    let kind = args.engine_kind();
    let options = StepOptions::new(&args.script, &args.name).resources(args.resources());
    let engine = build_engine(kind, config);

    let step = match make_step(&args.job_type, !args.extras.is_empty(), options, engine) {
        Ok(step) => step,
        Err(e) => return report(args, kind, &ExecError::from(e)),
    };
    let step_args = args.step_args(step.shape().job_type)?;

    if args.dry_run {
        return match step.assemble(step_args) {
            Ok(request) => {
                let line = request.command_line();
                if args.json {
                    print_json(&RunOutput {
                        success: true,
                        job_name: args.name.clone(),
                        engine: kind.as_str().to_string(),
                        dry_run: true,
                        command_line: Some(line),
                        error: None,
                    })?;
                } else {
                    println!("{}", line);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report(args, kind, &ExecError::from(e)),
        };
    }

    match step.call(step_args) {
        Ok(()) => {
            if args.json {
                print_json(&RunOutput {
                    success: true,
                    job_name: args.name.clone(),
                    engine: kind.as_str().to_string(),
                    dry_run: false,
                    command_line: None,
                    error: None,
                })?;
            } else {
                println!("{} {} finished", "ok".green(), args.name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report(args, kind, &e),
    }
}

fn report(args: &RunArgs, kind: EngineKind, err: &ExecError) -> Result<ExitCode> {
    if args.json {
        print_json(&RunOutput {
            success: false,
            job_name: args.name.clone(),
            engine: kind.as_str().to_string(),
            dry_run: args.dry_run,
            command_line: None,
            error: Some(JsonError::from_coded(err)),
        })?;
    } else {
        eprintln!(
            "{} [{}] {}",
            "error:".red().bold(),
            err.code(),
            err.message()
        );
    }
    Ok(ExitCode::from(1))
}
