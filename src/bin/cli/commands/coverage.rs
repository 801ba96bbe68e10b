//! The `coverage` command: bundle in, coverage-data.json + CI outputs out.

use anyhow::Context;
use tracing::{info, warn};

use xcreport::core::coverage::CoverageReport;
use xcreport::io::github::{coverage_lines, GithubOutput};
use xcreport::io::persistence::save_json;
use xcreport::io::xcresulttool::ResultBundleReader;

use crate::cli::args::CoverageArgs;

/// Extract line coverage from an .xcresult bundle.
pub async fn coverage_command(args: CoverageArgs) -> anyhow::Result<()> {
    if !args.xcresult.exists() {
        anyhow::bail!("{} not found", args.xcresult.display());
    }
    let bundle = args.xcresult.to_string_lossy().into_owned();
    info!(bundle, "extracting coverage");

    let reader = ResultBundleReader::new();
    let coverage = match reader.load_coverage(&bundle).await {
        Some(coverage) => coverage,
        None => {
            warn!("could not extract coverage data, emitting zero report");
            CoverageReport::default()
        }
    };

    eprintln!("{}", coverage.text_summary());

    if let Some(github) = GithubOutput::from_env() {
        github
            .append(&coverage_lines(&coverage))
            .await
            .context("failed to write GitHub Actions output")?;
        eprintln!("Wrote GitHub Actions output");
    }

    save_json(&coverage, &args.json)
        .await
        .with_context(|| format!("failed to write {}", args.json.display()))?;
    eprintln!("Wrote coverage data to: {}", args.json.display());

    Ok(())
}
