//! xcreport CLI - Xcode test-result post-processing for CI pipelines
//!
//! This binary turns `.xcresult` bundles into Markdown/HTML reports,
//! coverage summaries, GitHub Actions outputs, and flaky-test history.

use clap::Parser;

mod cli;

use cli::{Cli, Commands, HistoryCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging. Diagnostics go to stderr so stdout stays
    // machine-readable for commands that print JSON.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Parse(args) => {
            cli::parse_command(args).await?;
        }
        Commands::Report(args) => {
            cli::report_command(args).await?;
        }
        Commands::Html(args) => {
            cli::html_command(args).await?;
        }
        Commands::Coverage(args) => {
            cli::coverage_command(args).await?;
        }
        Commands::History(command) => match command {
            HistoryCommands::Save(args) => {
                cli::history_save_command(args).await?;
            }
            HistoryCommands::Analyze(args) => {
                cli::history_analyze_command(args).await?;
            }
            HistoryCommands::Compare(args) => {
                cli::history_compare_command(args).await?;
            }
        },
    }

    Ok(())
}
