//! Output formatting for update results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal summary for humans
//! - JSON: structured output for scripts and CI

use colored::*;
use serde::Serialize;

use crate::update::{FileOutcome, FileReport, UpdateSummary};

/// JSON report structure.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub extension: &'a str,
    pub functions: usize,
    pub methods: usize,
    pub replaced: usize,
    pub problems: usize,
    pub files: &'a [FileReport],
}

impl<'a> JsonReport<'a> {
    pub fn new(extension: &'a str, summary: &'a UpdateSummary) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            extension,
            functions: summary.functions(),
            methods: summary.methods(),
            replaced: summary.replaced(),
            problems: summary.problem_count(),
            files: &summary.files,
        }
    }
}

/// Write results in JSON format.
pub fn write_json(extension: &str, summary: &UpdateSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(extension, summary))?;
    println!("{}", json);
    Ok(())
}

/// The closing line of every run.
pub fn done_line(summary: &UpdateSummary) -> String {
    format!(
        "Done with {} functions and {} methods, {} replaced",
        summary.functions(),
        summary.methods(),
        summary.replaced()
    )
}

/// Short human description of an outcome.
pub fn describe_outcome(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::NoDeclarations => "no arginfo".to_string(),
        FileOutcome::Unreadable { reason } => format!("unreadable: {}", reason),
        FileOutcome::EmptyStub => "no stub info generated".to_string(),
        FileOutcome::StubFailed { reason } => format!("stub generation failed: {}", reason),
        FileOutcome::GeneratorFailed { exit_code, .. } => {
            format!("arginfo generation failed with exit code {}", exit_code)
        }
        FileOutcome::UpToDate => "up to date".to_string(),
        FileOutcome::Updated => "updated".to_string(),
        FileOutcome::WriteFailed { reason } => format!("write failed: {}", reason),
    }
}

/// Write results in human-readable format.
pub fn write_pretty(summary: &UpdateSummary) {
    let problems: Vec<&FileReport> = summary.files.iter().filter(|f| f.has_problems()).collect();

    if !problems.is_empty() {
        println!("{}", "Problems:".yellow().bold());
        for file in &problems {
            println!(
                "  {} {}",
                file.path.display().to_string().bold(),
                describe_outcome(&file.outcome).dimmed()
            );
            for name in &file.missing {
                println!("    {} {}", "missing".yellow(), name);
            }
        }
        println!();
    }

    let line = done_line(summary);
    if problems.is_empty() {
        println!("{}", line.green());
    } else {
        println!("{}", line.yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(functions: usize, methods: usize, replaced: usize, outcome: FileOutcome) -> FileReport {
        FileReport {
            path: PathBuf::from("ext/swow.c"),
            functions,
            methods,
            non_standard: 0,
            replaced,
            missing: Vec::new(),
            outcome,
        }
    }

    #[test]
    fn test_done_line() {
        let summary = UpdateSummary {
            files: vec![
                file(1, 2, 1, FileOutcome::Updated),
                file(0, 3, 0, FileOutcome::UpToDate),
            ],
        };
        assert_eq!(
            done_line(&summary),
            "Done with 1 functions and 5 methods, 1 replaced"
        );
    }

    #[test]
    fn test_json_report_shape() {
        let summary = UpdateSummary {
            files: vec![file(1, 0, 0, FileOutcome::EmptyStub)],
        };
        let json = serde_json::to_value(JsonReport::new("swow", &summary)).unwrap();

        assert_eq!(json["extension"], "swow");
        assert_eq!(json["functions"], 1);
        assert_eq!(json["problems"], 1);
        assert_eq!(json["files"][0]["outcome"]["status"], "empty_stub");
        assert_eq!(json["files"][0]["path"], "ext/swow.c");
    }

    #[test]
    fn test_describe_outcome() {
        assert_eq!(
            describe_outcome(&FileOutcome::GeneratorFailed {
                exit_code: 1,
                output: "boom".to_string()
            }),
            "arginfo generation failed with exit code 1"
        );
        assert_eq!(describe_outcome(&FileOutcome::UpToDate), "up to date");
    }
}
