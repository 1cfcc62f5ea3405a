//! Command-line interface module for sortdir.
//!
//! This module handles:
//! - Argument parsing and the usage tip
//! - Source validation and destination scaffolding
//! - Running traversal and relocation to completion
//! - Reporting the result and removing the emptied source tree

use crate::config::{ConfigError, DestinationRoot, SortConfig};
use crate::file_category::CategoryTable;
use crate::file_organizer::{OrganizeError, RelocationSummary, Relocator};
use crate::output::OutputFormatter;
use crate::traversal::{self, CleanupReport};
use chrono::Local;
use clap::{ArgAction, Parser};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, info};

/// Printed when the command line is not exactly one source path.
pub const USAGE_TIP: &str = "Run sortdir with ONLY one argument --> full path to unsorted folder:
sortdir <path to folder>
";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Cli {
    /// Path to the unsorted folder.
    pub source: PathBuf,

    /// Log more (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the run report as JSON instead of the extension lines.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Log level selected by the `-v` count.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    pub fn report_format(&self) -> ReportFormat {
        if self.json {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        }
    }
}

/// How the final report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Destination tree followed by the known/unknown extension lines.
    Text,
    /// A single JSON document.
    Json,
    /// Nothing at all.
    Quiet,
}

/// Errors that abort a run.
#[derive(Debug)]
pub enum SortError {
    /// Preparing the destination failed.
    Config(ConfigError),
    /// Listing, moving or extracting failed.
    Organize(OrganizeError),
    /// Removing the emptied source tree failed.
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The JSON report could not be produced.
    Report(serde_json::Error),
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortError::Config(e) => write!(f, "{}", e),
            SortError::Organize(e) => write!(f, "{}", e),
            SortError::Cleanup { path, source } => {
                write!(f, "Failed to clean up {}: {}", path.display(), source)
            }
            SortError::Report(e) => write!(f, "Failed to write report: {}", e),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortError::Config(e) => Some(e),
            SortError::Organize(e) => Some(e),
            SortError::Cleanup { source, .. } => Some(source),
            SortError::Report(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SortError {
    fn from(e: ConfigError) -> Self {
        SortError::Config(e)
    }
}

impl From<OrganizeError> for SortError {
    fn from(e: OrganizeError) -> Self {
        SortError::Organize(e)
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The `sorted_*` directory files were moved into.
    pub destination: PathBuf,
    /// What relocation did.
    pub summary: RelocationSummary,
    /// Which source directories were removed afterwards.
    pub cleanup: CleanupReport,
}

/// How a run ended without an error.
#[derive(Debug)]
pub enum RunOutcome {
    /// The source path does not exist or is not a directory; nothing was done.
    InvalidSource(PathBuf),
    /// The source was sorted.
    Sorted(RunReport),
}

/// Runs one sorting pass over `config.source`.
///
/// # Examples
///
/// ```no_run
/// use sortdir::cli::{run_cli, ReportFormat, RunOutcome};
/// use sortdir::config::SortConfig;
///
/// let config = SortConfig::new("/path/to/unsorted").expect("no cwd");
/// match run_cli(&config, ReportFormat::Text) {
///     Ok(RunOutcome::Sorted(report)) => println!("Sorted into {}", report.destination.display()),
///     Ok(RunOutcome::InvalidSource(_)) => {}
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(config: &SortConfig, format: ReportFormat) -> Result<RunOutcome, SortError> {
    if !config.source.is_dir() {
        let shown = std::path::absolute(&config.source).unwrap_or_else(|_| config.source.clone());
        if config.source.exists() {
            OutputFormatter::error(&format!("\"{}\" is not a folder.", shown.display()));
        } else {
            OutputFormatter::error(&format!("Folder \"{}\" does not exist.", shown.display()));
        }
        return Ok(RunOutcome::InvalidSource(shown));
    }

    let source = canonical(&config.source)?;
    let parent = canonical(&config.destination_parent)?;
    let destination = DestinationRoot::generate(&parent, Local::now())?;
    destination.create_scaffold()?;
    info!(source = %source.display(), destination = %destination.path().display(), "sorting");

    let exclude = Some(destination.path()).filter(|d| d.starts_with(&source));
    let files = traversal::list_files_excluding(&source, exclude).map_err(|e| {
        OrganizeError::TraversalFailed {
            path: source.clone(),
            source: e,
        }
    })?;

    let table = CategoryTable::default();
    let summary =
        Relocator::new(&source, &destination, &table, config.max_sweep_passes).relocate(&files)?;

    if summary.sweep_exhausted {
        OutputFormatter::warning("Some files could not be swept out of the source folder.");
    }

    if format == ReportFormat::Text {
        let tree = traversal::render_tree(destination.path()).map_err(|e| {
            OrganizeError::TraversalFailed {
                path: destination.path().to_path_buf(),
                source: e,
            }
        })?;
        OutputFormatter::tree(&tree);
        OutputFormatter::extension_summary(&summary);
    }

    let cleanup = traversal::remove_empty_dirs(&source, exclude).map_err(|e| SortError::Cleanup {
        path: source.clone(),
        source: e,
    })?;
    if !cleanup.root_removed {
        info!(source = %source.display(), "source folder kept, it is not empty");
    }

    let report = RunReport {
        destination: destination.path().to_path_buf(),
        summary,
        cleanup,
    };

    match format {
        ReportFormat::Text => OutputFormatter::success(&format!(
            "Sorted into {}",
            report.destination.display()
        )),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(SortError::Report)?;
            OutputFormatter::plain(&json);
        }
        ReportFormat::Quiet => {}
    }

    Ok(RunOutcome::Sorted(report))
}

fn canonical(path: &Path) -> Result<PathBuf, SortError> {
    fs::canonicalize(path).map_err(|e| {
        SortError::Organize(OrganizeError::TraversalFailed {
            path: path.to_path_buf(),
            source: e,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_single_source() {
        let cli = Cli::try_parse_from(["sortdir", "/tmp/unsorted"]).expect("should parse");
        assert_eq!(cli.source, PathBuf::from("/tmp/unsorted"));
        assert_eq!(cli.log_level(), Level::WARN);
        assert_eq!(cli.report_format(), ReportFormat::Text);
    }

    #[test]
    fn test_cli_rejects_missing_and_extra_arguments() {
        assert!(Cli::try_parse_from(["sortdir"]).is_err());
        assert!(Cli::try_parse_from(["sortdir", "a", "b"]).is_err());
        let help = Cli::try_parse_from(["sortdir", "--help"]).expect_err("help exits early");
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["sortdir", "-vv", "--json", "dir"]).expect("should parse");
        assert_eq!(cli.log_level(), Level::DEBUG);
        assert_eq!(cli.report_format(), ReportFormat::Json);
    }

    #[test]
    fn test_run_cli_missing_source() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let config = SortConfig::with_destination_parent(temp.path().join("nope"), temp.path());

        let outcome = run_cli(&config, ReportFormat::Quiet).expect("not an error");
        assert!(matches!(outcome, RunOutcome::InvalidSource(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0, "nothing created");
    }

    #[test]
    fn test_sort_error_display() {
        let err = SortError::Cleanup {
            path: PathBuf::from("/src"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to clean up /src: denied");
    }
}
