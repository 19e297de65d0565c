//! stepjob CLI - run bioinformatics pipeline job scripts
//!
//! This binary classifies files into job-script flags, assembles job
//! commands and runs them through the cluster scheduler or directly.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

// Use modules from the library crate
use stepjob_cli::commands;
use stepjob_cli::commands::run::RunArgs;
use stepjob_cli::logging::{self, LogConfig, LogFormat};
use stepjob_spec::FileRole;

/// stepjob - Pipeline step runner
#[derive(Parser)]
#[command(name = "stepjob")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter, e.g. `debug` or `stepjob::engine=debug` (default: RUST_LOG, then warn)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format (text or json)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flag each file is passed to a job script with
    Classify {
        /// File names to classify
        #[arg(required_unless_present = "list")]
        files: Vec<String>,

        /// Role of the files (input or output)
        #[arg(short, long, default_value = "input")]
        role: FileRole,

        /// List the registered extensions for the role instead
        #[arg(long)]
        list: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the flag/name token sequence for a list of files
    Marshal {
        /// File names, in order
        #[arg(required = true)]
        files: Vec<String>,

        /// Role of the files (input or output)
        #[arg(short, long)]
        role: FileRole,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Run a job script as a pipeline step
    Run(RunArgs),

    /// Check system dependencies and configuration
    Doctor {
        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        format: cli.log_format,
        level: cli.log_level,
    };
    if let Err(e) = logging::init(&log_config) {
        eprintln!("{}: {}", colored::Colorize::red("error"), e);
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Commands::Classify {
            files,
            role,
            list,
            json,
        } => commands::classify::run(&files, role, list, json),
        Commands::Marshal { files, role, json } => commands::marshal::run(&files, role, json),
        Commands::Run(args) => commands::run::run(&args),
        Commands::Doctor { config } => commands::doctor::run(config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_classify() {
        let cli = Cli::try_parse_from(["stepjob", "classify", "a.bam", "b.vcf.gz", "--role", "output"])
            .unwrap();
        match cli.command {
            Commands::Classify {
                files,
                role,
                list,
                json,
            } => {
                assert_eq!(files, vec!["a.bam", "b.vcf.gz"]);
                assert_eq!(role, FileRole::Output);
                assert!(!list);
                assert!(!json);
            }
            _ => panic!("expected classify command"),
        }
    }

    #[test]
    fn test_cli_parses_classify_list() {
        let cli = Cli::try_parse_from(["stepjob", "classify", "--list", "--json"]).unwrap();
        match cli.command {
            Commands::Classify {
                files,
                role,
                list,
                json,
            } => {
                assert!(files.is_empty());
                assert_eq!(role, FileRole::Input);
                assert!(list);
                assert!(json);
            }
            _ => panic!("expected classify command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_role() {
        let err = Cli::try_parse_from(["stepjob", "classify", "a.bam", "--role", "sideways"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_cli_requires_files_for_marshal() {
        let err = Cli::try_parse_from(["stepjob", "marshal", "--role", "input"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("FILES"));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "stepjob",
            "run",
            "--type",
            "download",
            "--script",
            "src/sh/fetch.sh",
            "--name",
            "fetch_ref",
            "--output",
            "z.fa",
            "--login",
            "u",
            "--password",
            "p",
            "--mem-per-cpu",
            "8000",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.job_type, "download");
                assert_eq!(args.script, PathBuf::from("src/sh/fetch.sh"));
                assert_eq!(args.name, "fetch_ref");
                assert_eq!(args.outputs, vec!["z.fa"]);
                assert_eq!(args.login.as_deref(), Some("u"));
                assert_eq!(args.password.as_deref(), Some("p"));
                assert_eq!(args.mem_per_cpu, Some(8000));
                assert!(args.dry_run);
                assert!(!args.direct);
                assert!(!args.json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_classify_needs_files_or_list() {
        let err = Cli::try_parse_from(["stepjob", "classify"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["stepjob", "classify", "--list", "-r", "output"]).unwrap();
        match cli.command {
            Commands::Classify { files, list, .. } => {
                assert!(files.is_empty());
                assert!(list);
            }
            _ => panic!("expected classify command"),
        }
    }

    #[test]
    fn test_cli_requires_script_for_run() {
        let err = Cli::try_parse_from(["stepjob", "run", "--type", "originate", "--name", "x"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("--script"));
    }

    #[test]
    fn test_cli_parses_global_logging_flags() {
        let cli = Cli::try_parse_from([
            "stepjob",
            "doctor",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Doctor { config: None }));
    }
}
