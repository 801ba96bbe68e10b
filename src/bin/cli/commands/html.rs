//! The `html` command: test-data.json (+ coverage) in, HTML out.

use anyhow::Context;

use xcreport::core::coverage::CoverageReport;
use xcreport::core::report::TestReport;
use xcreport::io::persistence::{load_json, load_json_or_default, write_text};

use crate::cli::args::{HtmlArgs, ReportMeta};
use crate::cli::output::html_report::generate_html_report;

/// Generate an interactive HTML test report.
pub async fn html_command(args: HtmlArgs) -> anyhow::Result<()> {
    let report: TestReport = load_json_or_default(&args.test_data).await;

    // Coverage is optional; a missing or unreadable file just drops the
    // coverage section.
    let mut coverage: Option<CoverageReport> = None;
    if let Some(path) = &args.coverage {
        coverage = load_json(path).await.ok();
        if coverage.is_none() {
            tracing::warn!(path = %path.display(), "coverage data unavailable, omitting section");
        }
    }

    let meta = ReportMeta {
        commit: args.commit,
        branch: args.branch,
        snapshot_count: 0,
    };

    let content = generate_html_report(&report, coverage.as_ref(), &meta);
    write_text(&content, &args.output)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    eprintln!("Generated HTML report: {}", args.output.display());
    Ok(())
}
