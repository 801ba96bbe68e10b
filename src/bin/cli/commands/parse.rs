//! The `parse` command: bundle in, test-data.json + CI outputs out.

use anyhow::Context;
use tracing::info;

use xcreport::io::github::{test_report_lines, GithubOutput};
use xcreport::io::persistence::save_json;
use xcreport::io::xcresulttool::ResultBundleReader;

use crate::cli::args::ParseArgs;
use crate::cli::output::display::print_run_summary;

/// Extract test results from an .xcresult bundle.
pub async fn parse_command(args: ParseArgs) -> anyhow::Result<()> {
    if !args.xcresult.exists() {
        anyhow::bail!("{} not found", args.xcresult.display());
    }
    let bundle = args.xcresult.to_string_lossy().into_owned();
    info!(bundle, "parsing result bundle");

    let reader = ResultBundleReader::new();
    let report = reader.load_report(&bundle).await;
    info!(tests = report.summary.tests, "extraction complete");

    print_run_summary(&report);

    if let Some(github) = GithubOutput::from_env() {
        github
            .append(&test_report_lines(&report))
            .await
            .context("failed to write GitHub Actions output")?;
        eprintln!("Wrote GitHub Actions output");
    }

    save_json(&report, &args.json)
        .await
        .with_context(|| format!("failed to write {}", args.json.display()))?;
    eprintln!("Wrote JSON: {}", args.json.display());

    Ok(())
}
