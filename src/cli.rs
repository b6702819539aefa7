//! Command line arguments and the `check` command

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::report::{check_file, format_json, FileReport, ReportError};

#[derive(Parser)]
#[command(name = "scan-workflow-lsp")]
#[command(about = "Validate GitHub Actions workflows that run a Black Duck security scan")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the language server protocol on stdio (default)
    Serve,

    /// Validate workflow files and print a report
    Check {
        #[arg(required = true, help = "Workflow YAML files to validate")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },
}

/// Check every file and print the reports to stdout
///
/// Exits with 1 when any file has an error diagnostic and 2 when a file
/// could not be read or a report could not be rendered.
pub fn run_check(files: &[PathBuf], json: bool) -> ExitCode {
    let mut reports = Vec::new();
    let mut failed = false;

    for path in files {
        match check_file(path) {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!("{}", err);
                eprintln!("error: {}", err);
                failed = true;
            }
        }
    }

    match render_reports(&reports, json) {
        Ok(out) if out.is_empty() => {}
        Ok(out) => println!("{}", out),
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    }

    if failed {
        ExitCode::from(2)
    } else if reports.iter().any(FileReport::has_errors) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn render_reports(reports: &[FileReport], json: bool) -> Result<String, ReportError> {
    if json {
        return format_json(reports);
    }
    Ok(reports
        .iter()
        .map(FileReport::render_text)
        .collect::<Vec<_>>()
        .join("\n\n"))
}
