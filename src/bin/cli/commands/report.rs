//! The `report` command: test-data.json in, Markdown out.

use anyhow::Context;

use xcreport::core::report::TestReport;
use xcreport::io::persistence::{load_json_or_default, write_text};

use crate::cli::args::{ReportArgs, ReportMeta};
use crate::cli::output::markdown_report::generate_markdown_report;

/// Generate a Markdown test report.
///
/// A missing or unreadable data file produces the "no test data" report
/// rather than an error, so a broken CI step upstream still yields a
/// readable artifact.
pub async fn report_command(args: ReportArgs) -> anyhow::Result<()> {
    let report: TestReport = load_json_or_default(&args.test_data).await;
    let meta = ReportMeta {
        commit: args.commit,
        branch: args.branch,
        snapshot_count: args.snapshot_count,
    };

    let content = generate_markdown_report(&report, &meta);
    write_text(&content, &args.output)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    eprintln!("Generated report: {}", args.output.display());
    Ok(())
}
