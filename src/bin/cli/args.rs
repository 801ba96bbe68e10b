//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the xcreport CLI binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Xcode test-result post-processing for CI pipelines
#[derive(Parser)]
#[command(name = "xcreport")]
#[command(version = VERSION)]
#[command(about = "🧪 xcreport - Xcode test-result post-processing for CI")]
#[command(long_about = "
Turn .xcresult bundles into reports your team can read and your CI can act on.

Common Usage:

  # Extract test results into test-data.json (+ GitHub Actions outputs)
  xcreport parse ./TestResults.xcresult

  # Generate a Markdown report for the PR comment
  xcreport report test-data.json report.md --commit $GITHUB_SHA --branch main

  # Generate a self-contained interactive HTML report with coverage
  xcreport html test-data.json report.html --coverage coverage-data.json

  # Extract line coverage
  xcreport coverage ./TestResults.xcresult

  # Track history and detect flaky tests
  xcreport history save test-data.json .test-history
  xcreport history compare test-data.json .test-history
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract test results from an .xcresult bundle
    Parse(ParseArgs),

    /// Generate a Markdown test report from test data
    Report(ReportArgs),

    /// Generate an interactive HTML test report from test data
    Html(HtmlArgs),

    /// Extract line coverage from an .xcresult bundle
    Coverage(CoverageArgs),

    /// Manage test history and analyze trends
    #[command(subcommand)]
    History(HistoryCommands),
}

/// Arguments for the `parse` command.
#[derive(Args)]
pub struct ParseArgs {
    /// Path to the .xcresult bundle
    pub xcresult: PathBuf,

    /// Where to write the extracted test data
    #[arg(long, default_value = "test-data.json")]
    pub json: PathBuf,
}

/// Arguments for the `report` command.
#[derive(Args)]
pub struct ReportArgs {
    /// Test data produced by `xcreport parse`
    pub test_data: PathBuf,

    /// Output Markdown file
    pub output: PathBuf,

    /// Git commit SHA to stamp into the report
    #[arg(long)]
    pub commit: Option<String>,

    /// Branch name to stamp into the report
    #[arg(long)]
    pub branch: Option<String>,

    /// Number of snapshot-test failures to call out
    #[arg(long, default_value_t = 0)]
    pub snapshot_count: u64,
}

/// Arguments for the `html` command.
#[derive(Args)]
pub struct HtmlArgs {
    /// Test data produced by `xcreport parse`
    pub test_data: PathBuf,

    /// Output HTML file
    pub output: PathBuf,

    /// Coverage data produced by `xcreport coverage`
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Git commit SHA to stamp into the report
    #[arg(long)]
    pub commit: Option<String>,

    /// Branch name to stamp into the report
    #[arg(long)]
    pub branch: Option<String>,
}

/// Arguments for the `coverage` command.
#[derive(Args)]
pub struct CoverageArgs {
    /// Path to the .xcresult bundle
    pub xcresult: PathBuf,

    /// Where to write the extracted coverage data
    #[arg(long, default_value = "coverage-data.json")]
    pub json: PathBuf,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Save a test run to the history directory
    Save(HistorySaveArgs),

    /// Analyze trends and detect flaky tests
    Analyze(HistoryAnalyzeArgs),

    /// Compare a test run with the most recent history entry
    Compare(HistoryCompareArgs),
}

/// Arguments for `history save`.
#[derive(Args)]
pub struct HistorySaveArgs {
    /// Test data produced by `xcreport parse`
    pub test_data: PathBuf,

    /// History directory
    pub history_dir: PathBuf,
}

/// Arguments for `history analyze`.
#[derive(Args)]
pub struct HistoryAnalyzeArgs {
    /// History directory
    pub history_dir: PathBuf,
}

/// Arguments for `history compare`.
#[derive(Args)]
pub struct HistoryCompareArgs {
    /// Test data for the current run
    pub current: PathBuf,

    /// History directory
    pub history_dir: PathBuf,
}

/// Metadata stamped into generated reports.
#[derive(Debug, Clone, Default)]
pub struct ReportMeta {
    /// Git commit SHA, rendered truncated to 12 characters
    pub commit: Option<String>,
    /// Branch name
    pub branch: Option<String>,
    /// Snapshot-test failure count
    pub snapshot_count: u64,
}
