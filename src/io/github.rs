//! GitHub Actions output formatting.
//!
//! CI steps communicate through the file named by `$GITHUB_OUTPUT`: scalar
//! `key=value` lines, and heredoc blocks (`key<<MARKER ... MARKER`) for
//! multi-line values. This module builds those lines for each report kind
//! and appends them to the output file.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::core::coverage::CoverageReport;
use crate::core::errors::{Result, XcreportError};
use crate::core::report::TestReport;
use crate::history::HistoryComparison;

/// Environment variable naming the Actions output file.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Append-only writer for the Actions output file.
pub struct GithubOutput {
    path: PathBuf,
}

impl GithubOutput {
    /// The writer configured from `$GITHUB_OUTPUT`, when set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(GITHUB_OUTPUT_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .map(|value| Self::new(PathBuf::from(value)))
    }

    /// A writer for an explicit output file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append pre-rendered output lines to the file.
    pub async fn append(&self, lines: &[String]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|err| {
                XcreportError::io(format!("failed to open {}", self.path.display()), err)
            })?;
        let mut content = lines.join("\n");
        content.push('\n');
        file.write_all(content.as_bytes()).await.map_err(|err| {
            XcreportError::io(format!("failed to write {}", self.path.display()), err)
        })?;
        Ok(())
    }
}

/// Render a heredoc block: `key<<MARKER`, the values, then the marker.
fn heredoc(key: &str, marker: &str, values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut lines = vec![format!("{key}<<{marker}")];
    lines.extend(values);
    lines.push(marker.to_string());
    lines
}

/// Output lines for a test report: summary scalars, failed tests, and the
/// per-class summary block.
pub fn test_report_lines(report: &TestReport) -> Vec<String> {
    let summary = &report.summary;
    let mut lines = vec![
        format!("tests={}", summary.tests),
        format!("passed={}", summary.passed),
        format!("failed={}", summary.failed),
        format!("skipped={}", summary.skipped),
        format!("duration={}", summary.duration_formatted),
        format!("pass_rate={}", summary.pass_rate),
    ];

    if !report.failed_tests.is_empty() {
        lines.extend(heredoc(
            "failed_tests",
            "ENDOFFAILEDTESTS",
            report
                .failed_tests
                .iter()
                .take(30)
                .map(|t| format!("{}.{}", t.class, t.method)),
        ));
    }

    if !report.classes.is_empty() {
        lines.extend(heredoc(
            "class_summary",
            "ENDOFCLASSSUMMARY",
            report.classes.iter().map(|(name, group)| {
                format!(
                    "{name}|{}|{}|{}|{}",
                    group.stats.total,
                    group.stats.passed,
                    group.stats.failed,
                    group.stats.duration_formatted
                )
            }),
        ));
    }

    lines
}

/// Output lines for a coverage report.
pub fn coverage_lines(coverage: &CoverageReport) -> Vec<String> {
    let mut lines = vec![
        format!("coverage={:.1}", coverage.total_coverage),
        format!("coverage_formatted={:.1}%", coverage.total_coverage),
        format!("covered_lines={}", coverage.covered_lines),
        format!("executable_lines={}", coverage.executable_lines),
    ];

    if !coverage.targets.is_empty() {
        lines.extend(heredoc(
            "coverage_targets",
            "EOF",
            coverage.targets.iter().map(|t| {
                format!(
                    "{}|{}|{}|{}",
                    t.name, t.coverage_formatted, t.covered_lines, t.executable_lines
                )
            }),
        ));
    }

    lines
}

/// Output lines for a history comparison. Unchanged metrics are omitted.
pub fn comparison_lines(comparison: &HistoryComparison) -> Vec<String> {
    let mut lines = Vec::new();
    let changes = &comparison.changes;

    if changes.tests.change != 0 {
        lines.push(format!(
            "test_count_change={}",
            changes.tests.change_formatted
        ));
    }
    if changes.failed.change != 0 {
        lines.push(format!(
            "failure_change={}",
            changes.failed.change_formatted
        ));
    }
    if changes.duration.faster {
        lines.push(format!(
            "duration_change=faster by {:.1}s",
            changes.duration.change.abs()
        ));
    } else if changes.duration.change > 0.0 {
        lines.push(format!(
            "duration_change=slower by {:.1}s",
            changes.duration.change
        ));
    }

    if !comparison.new_failures.is_empty() {
        lines.extend(heredoc(
            "new_failures",
            "EOF",
            comparison.new_failures.iter().take(10).cloned(),
        ));
    }
    if !comparison.fixed_tests.is_empty() {
        lines.extend(heredoc(
            "fixed_tests",
            "EOF",
            comparison.fixed_tests.iter().take(10).cloned(),
        ));
    }
    if !comparison.flaky_tests.is_empty() {
        lines.extend(heredoc(
            "flaky_tests",
            "EOF",
            comparison.flaky_tests.iter().take(5).map(|f| {
                format!("{} ({}/{} failures)", f.test, f.failures, f.total)
            }),
        ));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{format_duration, TestCaseRecord, TestStatus};
    use crate::history::{CountChange, DurationChange};

    fn sample_report() -> TestReport {
        let record = |class: &str, method: &str, status| TestCaseRecord {
            name: method.to_string(),
            method: method.to_string(),
            class: class.to_string(),
            identifier: format!("{class}/{method}()"),
            status,
            duration: 1.0,
            duration_formatted: format_duration(1.0),
            failures: Vec::new(),
            summary_ref: None,
        };
        TestReport::from_records(
            vec![
                record("LoginTests", "testLogin", TestStatus::Success),
                record("LoginTests", "testLogout", TestStatus::Failure),
            ],
            None,
        )
    }

    #[test]
    fn test_report_lines_include_summary_and_blocks() {
        let lines = test_report_lines(&sample_report());
        assert!(lines.contains(&"tests=2".to_string()));
        assert!(lines.contains(&"failed=1".to_string()));
        assert!(lines.contains(&"pass_rate=50.0%".to_string()));

        let joined = lines.join("\n");
        assert!(joined.contains("failed_tests<<ENDOFFAILEDTESTS\nLoginTests.testLogout\nENDOFFAILEDTESTS"));
        assert!(joined.contains("class_summary<<ENDOFCLASSSUMMARY\nLoginTests|2|1|1|2.00s\nENDOFCLASSSUMMARY"));
    }

    #[test]
    fn comparison_lines_skip_unchanged_metrics() {
        let comparison = HistoryComparison {
            has_previous: true,
            changes: crate::history::MetricChanges {
                failed: CountChange {
                    current: 3,
                    previous: 1,
                    change: 2,
                    change_formatted: "+2".into(),
                },
                duration: DurationChange {
                    current: 10.0,
                    previous: 14.5,
                    change: -4.5,
                    faster: true,
                },
                ..Default::default()
            },
            new_failures: vec!["A.testX".into()],
            ..Default::default()
        };

        let lines = comparison_lines(&comparison);
        let joined = lines.join("\n");
        assert!(!joined.contains("test_count_change"));
        assert!(joined.contains("failure_change=+2"));
        assert!(joined.contains("duration_change=faster by 4.5s"));
        assert!(joined.contains("new_failures<<EOF\nA.testX\nEOF"));
    }

    #[tokio::test]
    async fn append_accumulates_across_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        let output = GithubOutput::new(&path);

        output.append(&["a=1".to_string()]).await.unwrap();
        output.append(&["b=2".to_string()]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "a=1\nb=2\n");
    }
}
