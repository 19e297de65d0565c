//! Marshal command implementation

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use stepjob_spec::{marshal, FileRole, FileTree};

use super::json_output::{print_json, JsonError, MarshalOutput};

/// Run the marshal command
///
/// Prints the flag/name token sequence the job script would receive for
/// `files`, space separated on one line.
pub fn run(files: &[String], role: FileRole, json: bool) -> Result<ExitCode> {
    let tree = FileTree::from(files.to_vec());
    let result = marshal(&tree, role);

    if json {
        let output = match &result {
            Ok(tokens) => MarshalOutput {
                success: true,
                role: role.to_string(),
                tokens: tokens.clone(),
                error: None,
            },
            Err(e) => MarshalOutput {
                success: false,
                role: role.to_string(),
                tokens: Vec::new(),
                error: Some(JsonError::from_coded(e)),
            },
        };
        print_json(&output)?;
        return Ok(exit_code(result.is_ok()));
    }

    match result {
        Ok(tokens) => {
            println!("{}", tokens.join(" "));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            Ok(ExitCode::from(1))
        }
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
