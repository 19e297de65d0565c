//! Doctor command implementation
//!
//! Checks that the external programs a step needs can be found and that
//! captured output can be staged.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use stepjob_exec::config::{MAIL_ENV, SCHEDULER_ENV};
use stepjob_exec::EngineConfig;

use crate::config::load_engine_config;

/// Run the doctor command
///
/// Checks:
/// - Scheduler executable
/// - Mail executable (when notifications are enabled)
/// - Artifact directory permissions
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_engine_config(config_path)?;

    println!("{}", "stepjob doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!(
        "  {} stepjob-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let mut all_ok = true;

    println!("{}", "Programs:".bold());
    match config.scheduler.resolve() {
        Ok(path) => println!("  {} scheduler: {}", "ok".green(), path.display()),
        Err(e) => {
            println!("  {} {}", "!!".red(), e);
            println!(
                "     {}",
                format!("Set {} or scheduler.path, or use `run --direct`.", SCHEDULER_ENV)
                    .dimmed()
            );
            all_ok = false;
        }
    }

    if config.notify.enabled {
        match config.notify.resolve() {
            Some(path) => println!(
                "  {} mail: {} (to {})",
                "ok".green(),
                path.display(),
                config.notify.recipient
            ),
            None => {
                // Steps still run; notifications are logged as skipped.
                println!("  {} mail program '{}' not found", "!!".yellow(), config.notify.program);
                println!(
                    "     {}",
                    format!("Set {} or notify.path to enable notifications.", MAIL_ENV).dimmed()
                );
            }
        }
    } else {
        println!("  {} mail: notifications disabled", "->".yellow());
    }
    println!();

    println!("{}", "Permissions:".bold());
    if !check_artifact_dir(&config) {
        all_ok = false;
    }
    println!();

    if all_ok {
        println!("{}", "All checks passed.".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", "Some checks failed.".red().bold());
        Ok(ExitCode::from(1))
    }
}

fn check_artifact_dir(config: &EngineConfig) -> bool {
    let dir = config.resolved_artifact_dir();
    let test_file = dir.join(".stepjob_write_test");
    match std::fs::write(&test_file, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&test_file);
            println!(
                "  {} Artifact directory is writable ({})",
                "ok".green(),
                dir.display()
            );
            true
        }
        Err(e) => {
            println!(
                "  {} Cannot write to artifact directory {}: {}",
                "!!".red(),
                dir.display(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_dir_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default().artifact_dir(dir.path());
        assert!(check_artifact_dir(&config));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let config = EngineConfig::default().artifact_dir(dir.path().join("missing"));
        assert!(!check_artifact_dir(&config));
    }
}
