//! Classify command implementation
//!
//! Prints the flag each file would be passed with, or the whole extension
//! table for a role.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use stepjob_spec::{classify, ExtensionTable, FileRole};

use super::json_output::{print_json, ClassifiedFile, ClassifyOutput, JsonError, TableEntry};

/// Classifies every file for the given role.
pub fn classify_files(files: &[String], role: FileRole) -> Vec<ClassifiedFile> {
    files
        .iter()
        .map(|file| match classify(file, role) {
            Ok(flag) => ClassifiedFile {
                file: file.clone(),
                flag: Some(flag.to_string()),
                error: None,
            },
            Err(e) => ClassifiedFile {
                file: file.clone(),
                flag: None,
                error: Some(JsonError::from_coded(&e)),
            },
        })
        .collect()
}

/// Returns the registered extensions for a role, in table order.
pub fn table(role: FileRole) -> Vec<TableEntry> {
    ExtensionTable::standard()
        .entries(role)
        .iter()
        .map(|(extension, flag)| TableEntry {
            extension: extension.to_string(),
            flag: flag.to_string(),
        })
        .collect()
}

/// Run the classify command
///
/// # Returns
/// Exit code: 0 if every file was recognized, 1 otherwise
pub fn run(files: &[String], role: FileRole, list: bool, json: bool) -> Result<ExitCode> {
    if list {
        return run_list(role, json);
    }

    let classified = classify_files(files, role);
    let success = classified.iter().all(|c| c.error.is_none());

    if json {
        print_json(&ClassifyOutput {
            success,
            role: role.to_string(),
            files: classified,
        })?;
    } else {
        for entry in &classified {
            match (&entry.flag, &entry.error) {
                (Some(flag), _) => println!("{:<6} {}", flag.green(), entry.file),
                (None, Some(err)) => {
                    println!("{:<6} {} ({})", "!!".red(), entry.file, err.message.dimmed())
                }
                (None, None) => {}
            }
        }
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn run_list(role: FileRole, json: bool) -> Result<ExitCode> {
    let rows = table(role);
    if json {
        print_json(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", format!("{} extensions", role).cyan().bold());
    for row in &rows {
        println!("  {:<10} {}", row.extension, row.flag.green());
    }
    println!();
    println!(
        "{}",
        "A trailing .gz is stripped once before lookup.".dimmed()
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_files_mixed() {
        let files = vec!["x.fq.gz".to_string(), "notes.docx".to_string()];
        let classified = classify_files(&files, FileRole::Input);

        assert_eq!(classified[0].flag.as_deref(), Some("--fq"));
        assert!(classified[0].error.is_none());
        assert_eq!(classified[1].flag, None);
        assert_eq!(classified[1].error.as_ref().unwrap().code, "STEP_001");
    }

    #[test]
    fn test_table_follows_role() {
        let input = table(FileRole::Input);
        assert!(input.iter().any(|e| e.extension == ".fq" && e.flag == "--fq"));
        assert!(!input.iter().any(|e| e.extension == ".bai"));

        let output = table(FileRole::Output);
        assert!(output.iter().any(|e| e.extension == ".bai" && e.flag == "-d"));
    }
}
