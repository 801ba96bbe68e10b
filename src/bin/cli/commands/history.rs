//! History subcommands: save runs, analyze trends, compare against the last run.

use anyhow::Context;

use xcreport::core::report::TestReport;
use xcreport::history::HistoryStore;
use xcreport::io::github::{comparison_lines, GithubOutput};
use xcreport::io::persistence::load_json;

use crate::cli::args::{HistoryAnalyzeArgs, HistoryCompareArgs, HistorySaveArgs};
use crate::cli::output::display::print_comparison_summary;

/// Save a test run into the history directory.
pub async fn history_save_command(args: HistorySaveArgs) -> anyhow::Result<()> {
    let report: TestReport = load_json(&args.test_data)
        .await
        .with_context(|| format!("failed to read {}", args.test_data.display()))?;

    let store = HistoryStore::new(&args.history_dir);
    let path = store.save(&report).await?;
    eprintln!("Saved history entry: {}", path.display());
    Ok(())
}

/// Analyze retained history for trends and flaky tests.
pub async fn history_analyze_command(args: HistoryAnalyzeArgs) -> anyhow::Result<()> {
    let store = HistoryStore::new(&args.history_dir);
    let analysis = store.analyze().await;

    if analysis.runs == 0 {
        eprintln!("No history entries in {}", args.history_dir.display());
    } else {
        eprintln!(
            "Analyzed {} run(s), {} flaky test(s)",
            analysis.runs,
            analysis.flaky_tests.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

/// Compare the current run against the newest history entry.
pub async fn history_compare_command(args: HistoryCompareArgs) -> anyhow::Result<()> {
    let current: TestReport = load_json(&args.current)
        .await
        .with_context(|| format!("failed to read {}", args.current.display()))?;

    let store = HistoryStore::new(&args.history_dir);
    let comparison = store.compare(&current).await;

    print_comparison_summary(&comparison);

    if let Some(github) = GithubOutput::from_env() {
        github
            .append(&comparison_lines(&comparison))
            .await
            .context("failed to write GitHub Actions output")?;
        eprintln!("Wrote GitHub Actions output");
    }

    println!("{}", serde_json::to_string_pretty(&comparison)?);
    Ok(())
}
