//! Markdown report rendering, sized for a PR comment.

use chrono::Utc;

use xcreport::core::model::TestStatus;
use xcreport::core::report::TestReport;

use crate::cli::args::ReportMeta;

/// Render the full Markdown report.
pub fn generate_markdown_report(report: &TestReport, meta: &ReportMeta) -> String {
    let mut out = String::new();

    push_header(&mut out, meta);
    push_summary(&mut out, report);
    push_class_table(&mut out, report);
    push_failed_tests(&mut out, report);
    push_all_tests(&mut out, report);
    push_snapshot_section(&mut out, meta);
    push_artifacts(&mut out, meta);

    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_header(out: &mut String, meta: &ReportMeta) {
    push_line(out, "# 🧪 Xcode Test Results");
    push_line(out, "");
    push_line(
        out,
        &format!(
            "**Generated:** {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ),
    );
    if let Some(commit) = meta.commit.as_deref().filter(|c| !c.is_empty()) {
        let short: String = commit.chars().take(12).collect();
        push_line(out, &format!("**Commit:** `{short}`"));
    }
    if let Some(branch) = meta.branch.as_deref().filter(|b| !b.is_empty()) {
        push_line(out, &format!("**Branch:** `{branch}`"));
    }
    push_line(out, "");
}

fn push_summary(out: &mut String, report: &TestReport) {
    let summary = &report.summary;
    push_line(out, "## Summary");
    push_line(out, "");

    if report.build_failed() {
        push_line(out, "### 🔴 BUILD FAILED");
        push_line(out, "");
        push_line(out, "The build failed before tests could run.");
        push_line(out, "");
        push_build_errors(out, report);
        return;
    }

    if summary.tests == 0 {
        push_line(out, "_No test results available_");
        push_build_errors(out, report);
        push_line(out, "");
        return;
    }

    if summary.failed == 0 {
        push_line(out, "### ✅ ALL TESTS PASSED");
    } else {
        let plural = if summary.failed == 1 { "" } else { "S" };
        push_line(out, &format!("### ❌ {} TEST{plural} FAILED", summary.failed));
    }
    push_line(out, "");

    push_line(out, "| Metric | Value |");
    push_line(out, "|--------|-------|");
    push_line(out, &format!("| **Total Tests** | {} |", summary.tests));
    push_line(out, &format!("| **Passed** | {} ✓ |", summary.passed));
    push_line(out, &format!("| **Failed** | {} ✗ |", summary.failed));
    if summary.skipped > 0 {
        push_line(out, &format!("| **Skipped** | {} ⊘ |", summary.skipped));
    }
    push_line(
        out,
        &format!("| **Duration** | {} |", summary.duration_formatted),
    );
    push_line(out, &format!("| **Pass Rate** | {} |", summary.pass_rate));
    push_line(out, "");
}

fn push_build_errors(out: &mut String, report: &TestReport) {
    let Some(build) = &report.build else {
        return;
    };
    if build.errors.is_empty() {
        return;
    }
    push_line(out, "");
    push_line(out, "### Build Errors");
    push_line(out, "");
    push_line(out, "```");
    for error in build.errors.iter().take(10) {
        push_line(out, &truncate(error, 300));
    }
    if build.errors.len() > 10 {
        push_line(
            out,
            &format!("... and {} more errors", build.errors.len() - 10),
        );
    }
    push_line(out, "```");
    push_line(out, "");
}

fn push_class_table(out: &mut String, report: &TestReport) {
    if report.classes.is_empty() {
        return;
    }
    push_line(out, "## Tests by Class");
    push_line(out, "");
    push_line(out, "| Status | Class | Tests | Passed | Failed | Duration |");
    push_line(out, "|--------|-------|-------|--------|--------|----------|");

    for (name, group) in &report.classes {
        let stats = &group.stats;
        let status = if stats.failed == 0 { "✅" } else { "❌" };
        let failed_cell = if stats.failed > 0 {
            format!("**{}**", stats.failed)
        } else {
            "0".to_string()
        };
        push_line(
            out,
            &format!(
                "| {status} | {name} | {} | {} | {failed_cell} | {} |",
                stats.total, stats.passed, stats.duration_formatted
            ),
        );
    }
    push_line(out, "");
}

fn push_failed_tests(out: &mut String, report: &TestReport) {
    if report.failed_tests.is_empty() {
        return;
    }
    push_line(out, "## Failed Tests");
    push_line(out, "");

    for test in &report.failed_tests {
        push_line(out, &format!("### ❌ {}.{}", test.class, test.method));
        push_line(out, "");
        push_line(
            out,
            &format!("- **Duration:** {}", test.duration_formatted),
        );

        for failure in test.failures.iter().take(3) {
            if !failure.message.is_empty() {
                push_line(
                    out,
                    &format!("- **Error:** {}", truncate(&failure.message, 500)),
                );
            }
            if !failure.file.is_empty() && failure.line > 0 {
                push_line(
                    out,
                    &format!("- **Location:** `{}:{}`", failure.file, failure.line),
                );
            }
        }
        push_line(out, "");
    }
}

// The full test list is collapsed and capped so the report stays a
// reasonable PR comment on large suites.
fn push_all_tests(out: &mut String, report: &TestReport) {
    if report.tests.is_empty() || report.tests.len() > 200 {
        return;
    }
    push_line(out, "## All Tests");
    push_line(out, "");
    push_line(out, "<details>");
    push_line(out, "<summary>Click to expand full test list</summary>");
    push_line(out, "");
    push_line(out, "| Status | Class | Test | Duration |");
    push_line(out, "|--------|-------|------|----------|");

    for test in &report.tests {
        let icon = match test.status {
            TestStatus::Success => "✅",
            TestStatus::Failure => "❌",
            TestStatus::Skipped => "⊘",
            TestStatus::Unknown => "❓",
        };
        push_line(
            out,
            &format!(
                "| {icon} | {} | {} | {} |",
                test.class, test.method, test.duration_formatted
            ),
        );
    }

    push_line(out, "");
    push_line(out, "</details>");
    push_line(out, "");
}

fn push_snapshot_section(out: &mut String, meta: &ReportMeta) {
    if meta.snapshot_count == 0 {
        return;
    }
    push_line(
        out,
        &format!("## 📸 Snapshot Failures ({})", meta.snapshot_count),
    );
    push_line(out, "");
    push_line(
        out,
        "Download the **snapshot-failures** artifact to view visual difference images.",
    );
    push_line(out, "");
}

fn push_artifacts(out: &mut String, meta: &ReportMeta) {
    push_line(out, "---");
    push_line(out, "");
    push_line(out, "## 📦 Artifacts");
    push_line(out, "");
    push_line(out, "| Artifact | Description |");
    push_line(out, "|----------|-------------|");
    push_line(
        out,
        "| **test-results** | Full `.xcresult` bundle - open in Xcode for detailed analysis |",
    );
    push_line(out, "| **test-report** | This Markdown report |");
    push_line(out, "| **test-data** | JSON data file for custom tooling |");
    if meta.snapshot_count > 0 {
        push_line(
            out,
            "| **snapshot-failures** | PNG images showing visual differences |",
        );
    }
    push_line(out, "");

    push_line(out, "### How to View in Xcode");
    push_line(out, "");
    push_line(out, "1. Download the **test-results** artifact");
    push_line(out, "2. Unzip the downloaded file");
    push_line(out, "3. Double-click the `.xcresult` bundle to open in Xcode");
    push_line(
        out,
        "4. Navigate to failed tests to see stack traces and failure details",
    );
    push_line(out, "");
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcreport::core::model::{format_duration, FailureDetail, TestCaseRecord};
    use xcreport::core::report::BuildInfo;

    fn record(class: &str, method: &str, status: TestStatus) -> TestCaseRecord {
        TestCaseRecord {
            name: method.to_string(),
            method: method.to_string(),
            class: class.to_string(),
            identifier: format!("{class}/{method}()"),
            status,
            duration: 1.5,
            duration_formatted: format_duration(1.5),
            failures: Vec::new(),
            summary_ref: None,
        }
    }

    #[test]
    fn all_passed_report() {
        let report = TestReport::from_records(
            vec![record("LoginTests", "testLogin", TestStatus::Success)],
            None,
        );
        let md = generate_markdown_report(&report, &ReportMeta::default());

        assert!(md.contains("### ✅ ALL TESTS PASSED"));
        assert!(md.contains("| **Total Tests** | 1 |"));
        assert!(md.contains("## Tests by Class"));
        assert!(md.contains("| ✅ | LoginTests | 1 | 1 | 0 | 1.50s |"));
        assert!(!md.contains("## Failed Tests"));
    }

    #[test]
    fn failed_tests_section_lists_failures_with_location() {
        let mut failing = record("LoginTests", "testLogout", TestStatus::Failure);
        failing.failures.push(FailureDetail {
            message: "XCTAssertEqual failed".into(),
            file: "LoginTests.swift".into(),
            line: 42,
        });
        let report = TestReport::from_records(
            vec![record("LoginTests", "testLogin", TestStatus::Success), failing],
            None,
        );
        let md = generate_markdown_report(&report, &ReportMeta::default());

        assert!(md.contains("### ❌ 1 TEST FAILED"));
        assert!(md.contains("### ❌ LoginTests.testLogout"));
        assert!(md.contains("- **Error:** XCTAssertEqual failed"));
        assert!(md.contains("- **Location:** `LoginTests.swift:42`"));
        assert!(md.contains("| ❌ | LoginTests | 2 | 1 | **1** | 3.00s |"));
    }

    #[test]
    fn commit_is_truncated_and_branch_stamped() {
        let report = TestReport::from_records(Vec::new(), None);
        let meta = ReportMeta {
            commit: Some("0123456789abcdef0123".into()),
            branch: Some("main".into()),
            snapshot_count: 0,
        };
        let md = generate_markdown_report(&report, &meta);
        assert!(md.contains("**Commit:** `0123456789ab`"));
        assert!(md.contains("**Branch:** `main`"));
        assert!(md.contains("_No test results available_"));
    }

    #[test]
    fn build_failure_replaces_summary() {
        let mut report = TestReport::from_records(Vec::new(), None);
        report.build = Some(BuildInfo {
            status: "failed".into(),
            errors: vec!["error: use of undeclared identifier".into()],
        });
        let md = generate_markdown_report(&report, &ReportMeta::default());
        assert!(md.contains("### 🔴 BUILD FAILED"));
        assert!(md.contains("error: use of undeclared identifier"));
        assert!(!md.contains("ALL TESTS PASSED"));
    }

    #[test]
    fn snapshot_section_appears_when_requested() {
        let report = TestReport::from_records(Vec::new(), None);
        let meta = ReportMeta {
            snapshot_count: 3,
            ..Default::default()
        };
        let md = generate_markdown_report(&report, &meta);
        assert!(md.contains("## 📸 Snapshot Failures (3)"));
        assert!(md.contains("**snapshot-failures** | PNG images"));
    }

    #[test]
    fn large_suites_skip_the_full_test_list() {
        let records: Vec<TestCaseRecord> = (0..201)
            .map(|i| record("BigSuite", &format!("test{i:03}"), TestStatus::Success))
            .collect();
        let report = TestReport::from_records(records, None);
        let md = generate_markdown_report(&report, &ReportMeta::default());
        assert!(!md.contains("## All Tests"));
    }

    #[test]
    fn long_error_messages_are_truncated() {
        let mut failing = record("A", "testLong", TestStatus::Failure);
        failing.failures.push(FailureDetail {
            message: "x".repeat(600),
            file: String::new(),
            line: 0,
        });
        let report = TestReport::from_records(vec![failing], None);
        let md = generate_markdown_report(&report, &ReportMeta::default());
        assert!(md.contains(&format!("{}...", "x".repeat(500))));
        assert!(!md.contains(&"x".repeat(501)));
    }
}
