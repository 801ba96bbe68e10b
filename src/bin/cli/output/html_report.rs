//! Self-contained interactive HTML report.
//!
//! One file, no external assets: a dark GitHub-like stylesheet, stat cards,
//! failed-test cards, per-class and coverage tables, and a filterable
//! all-tests table driven by a small inline script.

use chrono::Utc;

use xcreport::core::coverage::CoverageReport;
use xcreport::core::model::TestStatus;
use xcreport::core::report::TestReport;

use crate::cli::args::ReportMeta;

const STYLESHEET: &str = r#"
        :root {
            --bg-primary: #0d1117;
            --bg-secondary: #161b22;
            --bg-tertiary: #21262d;
            --text-primary: #f0f6fc;
            --text-secondary: #8b949e;
            --border: #30363d;
            --success: #3fb950;
            --failure: #f85149;
            --warning: #d29922;
            --info: #58a6ff;
            --accent: #7c3aed;
        }

        * { box-sizing: border-box; margin: 0; padding: 0; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }

        .container {
            max-width: 1400px;
            margin: 0 auto;
            padding: 20px;
        }

        .header {
            text-align: center;
            padding: 40px 20px;
            background: linear-gradient(135deg, var(--bg-secondary) 0%, var(--bg-tertiary) 100%);
            border-bottom: 1px solid var(--border);
            margin-bottom: 30px;
        }

        .header h1 {
            font-size: 2.5rem;
            margin-bottom: 10px;
            background: linear-gradient(135deg, var(--info) 0%, var(--accent) 100%);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
            background-clip: text;
        }

        .meta {
            color: var(--text-secondary);
            font-size: 0.9rem;
        }

        .meta code {
            background: var(--bg-tertiary);
            padding: 2px 8px;
            border-radius: 4px;
            font-family: 'SF Mono', Monaco, monospace;
        }

        .status-banner {
            padding: 30px;
            border-radius: 12px;
            margin-bottom: 30px;
            text-align: center;
        }

        .status-banner.success {
            background: linear-gradient(135deg, rgba(63, 185, 80, 0.15) 0%, rgba(63, 185, 80, 0.05) 100%);
            border: 1px solid var(--success);
        }

        .status-banner.failure {
            background: linear-gradient(135deg, rgba(248, 81, 73, 0.15) 0%, rgba(248, 81, 73, 0.05) 100%);
            border: 1px solid var(--failure);
        }

        .status-banner h2 {
            font-size: 1.8rem;
            margin-bottom: 15px;
        }

        .status-banner.success h2 { color: var(--success); }
        .status-banner.failure h2 { color: var(--failure); }

        .stats-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
            gap: 15px;
            margin-bottom: 30px;
        }

        .stat-card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 10px;
            padding: 20px;
            text-align: center;
        }

        .stat-card .value {
            font-size: 2rem;
            font-weight: 700;
        }

        .stat-card .label {
            color: var(--text-secondary);
            font-size: 0.85rem;
            text-transform: uppercase;
            letter-spacing: 1px;
        }

        .stat-card.passed .value { color: var(--success); }
        .stat-card.failed .value { color: var(--failure); }
        .stat-card.coverage .value { color: var(--info); }

        .section {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 12px;
            margin-bottom: 30px;
            overflow: hidden;
        }

        .section-header {
            padding: 15px 20px;
            background: var(--bg-tertiary);
            border-bottom: 1px solid var(--border);
            display: flex;
            justify-content: space-between;
            align-items: center;
        }

        .section-header h3 {
            font-size: 1.1rem;
        }

        .section-content {
            padding: 20px;
        }

        table {
            width: 100%;
            border-collapse: collapse;
        }

        th, td {
            padding: 12px 15px;
            text-align: left;
            border-bottom: 1px solid var(--border);
        }

        th {
            background: var(--bg-tertiary);
            color: var(--text-secondary);
            font-weight: 600;
            text-transform: uppercase;
            font-size: 0.75rem;
            letter-spacing: 1px;
        }

        tr:hover {
            background: var(--bg-tertiary);
        }

        .status-cell {
            width: 40px;
            text-align: center;
        }

        .passed-cell { color: var(--success); }
        .failed-cell { color: var(--failure); }

        tr.failed { background: rgba(248, 81, 73, 0.1); }

        .filters {
            display: flex;
            gap: 15px;
            margin-bottom: 15px;
            flex-wrap: wrap;
        }

        .filter-input {
            flex: 1;
            min-width: 200px;
            padding: 10px 15px;
            background: var(--bg-tertiary);
            border: 1px solid var(--border);
            border-radius: 6px;
            color: var(--text-primary);
            font-size: 0.95rem;
        }

        .filter-input:focus {
            outline: none;
            border-color: var(--info);
        }

        .filter-btn {
            padding: 10px 20px;
            background: var(--bg-tertiary);
            border: 1px solid var(--border);
            border-radius: 6px;
            color: var(--text-primary);
            cursor: pointer;
            transition: all 0.2s;
        }

        .filter-btn:hover, .filter-btn.active {
            background: var(--info);
            border-color: var(--info);
        }

        .failed-test-card {
            background: var(--bg-tertiary);
            border: 1px solid var(--failure);
            border-radius: 8px;
            padding: 15px;
            margin-bottom: 15px;
        }

        .failed-test-card h4 {
            color: var(--failure);
            margin-bottom: 10px;
        }

        .failed-test-card .duration {
            color: var(--text-secondary);
            font-size: 0.85rem;
            margin-bottom: 10px;
        }

        .failure-message {
            background: var(--bg-primary);
            padding: 10px;
            border-radius: 4px;
            margin-top: 10px;
            font-family: 'SF Mono', Monaco, monospace;
            font-size: 0.85rem;
            overflow-x: auto;
        }

        .failure-message code {
            display: block;
            margin-top: 5px;
            color: var(--info);
        }

        .coverage-bar-container {
            position: relative;
            height: 24px;
            background: var(--bg-tertiary);
            border-radius: 4px;
            overflow: hidden;
        }

        .coverage-bar {
            height: 100%;
            transition: width 0.3s;
        }

        .coverage-text {
            position: absolute;
            right: 10px;
            top: 50%;
            transform: translateY(-50%);
            font-weight: 600;
            font-size: 0.85rem;
        }

        @media (max-width: 768px) {
            .header h1 { font-size: 1.8rem; }
            .stats-grid { grid-template-columns: repeat(2, 1fr); }
            th, td { padding: 8px 10px; font-size: 0.85rem; }
        }
"#;

const FILTER_SCRIPT: &str = r#"
        let currentFilter = 'all';

        function filterTests(status) {
            currentFilter = status;
            document.querySelectorAll('.filter-btn').forEach(btn => btn.classList.remove('active'));
            event.target.classList.add('active');
            applyFilters();
        }

        document.getElementById('searchInput').addEventListener('input', applyFilters);

        function applyFilters() {
            const search = document.getElementById('searchInput').value.toLowerCase();
            document.querySelectorAll('.test-row').forEach(row => {
                const matchesStatus = currentFilter === 'all' || row.dataset.status === currentFilter;
                const matchesSearch = row.textContent.toLowerCase().includes(search);
                row.style.display = matchesStatus && matchesSearch ? '' : 'none';
            });
        }
"#;

/// Render the full HTML report.
pub fn generate_html_report(
    report: &TestReport,
    coverage: Option<&CoverageReport>,
    meta: &ReportMeta,
) -> String {
    let summary = &report.summary;
    let duration = if summary.duration_formatted.is_empty() {
        "N/A"
    } else {
        summary.duration_formatted.as_str()
    };

    let (status_class, status_icon, status_text) = if summary.failed == 0 {
        ("success", "✅", "ALL TESTS PASSED".to_string())
    } else {
        ("failure", "❌", format!("{} TEST(S) FAILED", summary.failed))
    };

    let coverage_percent = coverage
        .map(|c| format!("{:.1}%", c.total_coverage))
        .unwrap_or_else(|| "N/A".to_string());

    let mut meta_line = format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(commit) = meta.commit.as_deref().filter(|c| !c.is_empty()) {
        let short: String = commit.chars().take(12).collect();
        meta_line.push_str(&format!(" | Commit: <code>{}</code>", escape(&short)));
    }
    if let Some(branch) = meta.branch.as_deref().filter(|b| !b.is_empty()) {
        meta_line.push_str(&format!(" | Branch: <code>{}</code>", escape(branch)));
    }

    let failed_section = failed_tests_section(report);
    let class_rows = class_rows(report);
    let coverage_section = coverage.map(coverage_section).unwrap_or_default();
    let test_rows = test_rows(report);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Xcode Test Report</title>
    <style>{STYLESHEET}</style>
</head>
<body>
    <div class="header">
        <h1>🧪 Xcode Test Report</h1>
        <p class="meta">{meta_line}</p>
    </div>

    <div class="container">
        <div class="status-banner {status_class}">
            <h2>{status_icon} {status_text}</h2>
            <p>{tests} tests completed in {duration}</p>
        </div>

        <div class="stats-grid">
            <div class="stat-card">
                <div class="value">{tests}</div>
                <div class="label">Total Tests</div>
            </div>
            <div class="stat-card passed">
                <div class="value">{passed}</div>
                <div class="label">Passed</div>
            </div>
            <div class="stat-card failed">
                <div class="value">{failed}</div>
                <div class="label">Failed</div>
            </div>
            <div class="stat-card">
                <div class="value">{skipped}</div>
                <div class="label">Skipped</div>
            </div>
            <div class="stat-card">
                <div class="value">{duration}</div>
                <div class="label">Duration</div>
            </div>
            <div class="stat-card coverage">
                <div class="value">{coverage_percent}</div>
                <div class="label">Coverage</div>
            </div>
        </div>

        {failed_section}

        <div class="section">
            <div class="section-header">
                <h3>📊 Tests by Class</h3>
            </div>
            <div class="section-content">
                <table>
                    <thead>
                        <tr>
                            <th></th>
                            <th>Class</th>
                            <th>Total</th>
                            <th>Passed</th>
                            <th>Failed</th>
                            <th>Duration</th>
                        </tr>
                    </thead>
                    <tbody>
                        {class_rows}
                    </tbody>
                </table>
            </div>
        </div>

        {coverage_section}

        <div class="section">
            <div class="section-header">
                <h3>📋 All Tests</h3>
            </div>
            <div class="section-content">
                <div class="filters">
                    <input type="text" class="filter-input" id="searchInput" placeholder="Search tests...">
                    <button class="filter-btn active" onclick="filterTests('all')">All</button>
                    <button class="filter-btn" onclick="filterTests('passed')">Passed</button>
                    <button class="filter-btn" onclick="filterTests('failed')">Failed</button>
                    <button class="filter-btn" onclick="filterTests('skipped')">Skipped</button>
                </div>
                <table id="testsTable">
                    <thead>
                        <tr>
                            <th></th>
                            <th>Class</th>
                            <th>Test</th>
                            <th>Duration</th>
                        </tr>
                    </thead>
                    <tbody>
                        {test_rows}
                    </tbody>
                </table>
            </div>
        </div>
    </div>

    <script>{FILTER_SCRIPT}</script>
</body>
</html>"#,
        tests = summary.tests,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
    )
}

fn status_display(status: TestStatus) -> (&'static str, &'static str) {
    match status {
        TestStatus::Success => ("✅", "passed"),
        TestStatus::Failure => ("❌", "failed"),
        TestStatus::Skipped => ("⊘", "skipped"),
        TestStatus::Unknown => ("❓", "unknown"),
    }
}

fn test_rows(report: &TestReport) -> String {
    let mut rows = String::new();
    for test in &report.tests {
        let (icon, class_name) = status_display(test.status);
        rows.push_str(&format!(
            r#"
            <tr class="test-row {class_name}" data-class="{}" data-status="{class_name}">
                <td class="status-cell">{icon}</td>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
            </tr>"#,
            escape(&test.class),
            escape(&test.class),
            escape(&test.method),
            escape(&test.duration_formatted),
        ));
    }
    rows
}

fn class_rows(report: &TestReport) -> String {
    let mut rows = String::new();
    for (name, group) in &report.classes {
        let stats = &group.stats;
        let (icon, row_class) = if stats.failed == 0 {
            ("✅", "passed")
        } else {
            ("❌", "failed")
        };
        rows.push_str(&format!(
            r#"
            <tr class="class-row {row_class}">
                <td class="status-cell">{icon}</td>
                <td><strong>{}</strong></td>
                <td>{}</td>
                <td class="passed-cell">{}</td>
                <td class="failed-cell">{}</td>
                <td>{}</td>
            </tr>"#,
            escape(name),
            stats.total,
            stats.passed,
            stats.failed,
            escape(&stats.duration_formatted),
        ));
    }
    rows
}

fn failed_tests_section(report: &TestReport) -> String {
    if report.failed_tests.is_empty() {
        return String::new();
    }

    let mut cards = String::new();
    for test in &report.failed_tests {
        let mut failures = String::new();
        for failure in test.failures.iter().take(3) {
            let message: String = failure.message.chars().take(500).collect();
            let location = if !failure.file.is_empty() {
                format!(
                    "<code>{}</code>",
                    escape(&format!("{}:{}", failure.file, failure.line))
                )
            } else {
                String::new()
            };
            failures.push_str(&format!(
                r#"
                <div class="failure-message">
                    <p>{}</p>
                    {location}
                </div>"#,
                escape(&message),
            ));
        }
        cards.push_str(&format!(
            r#"
            <div class="failed-test-card">
                <h4>❌ {}.{}</h4>
                <p class="duration">Duration: {}</p>
                {failures}
            </div>"#,
            escape(&test.class),
            escape(&test.method),
            escape(&test.duration_formatted),
        ));
    }

    format!(
        r#"<div class="section"><div class="section-header"><h3>❌ Failed Tests</h3></div><div class="section-content">{cards}</div></div>"#
    )
}

fn coverage_section(coverage: &CoverageReport) -> String {
    if coverage.targets.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for target in &coverage.targets {
        let bar_width = target.coverage.clamp(0.0, 100.0);
        let bar_color = if target.coverage >= 70.0 {
            "#4ecca3"
        } else if target.coverage >= 50.0 {
            "#f39c12"
        } else {
            "#e94560"
        };
        rows.push_str(&format!(
            r#"
            <tr>
                <td>{}</td>
                <td>
                    <div class="coverage-bar-container">
                        <div class="coverage-bar" style="width: {bar_width}%; background: {bar_color};"></div>
                        <span class="coverage-text">{}</span>
                    </div>
                </td>
                <td>{} / {}</td>
            </tr>"#,
            escape(&target.name),
            escape(&target.coverage_formatted),
            target.covered_lines,
            target.executable_lines,
        ));
    }

    format!(
        r#"<div class="section">
            <div class="section-header">
                <h3>📈 Code Coverage</h3>
            </div>
            <div class="section-content">
                <table>
                    <thead>
                        <tr>
                            <th>Target</th>
                            <th>Coverage</th>
                            <th>Lines</th>
                        </tr>
                    </thead>
                    <tbody>
                        {rows}
                    </tbody>
                </table>
            </div>
        </div>"#
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcreport::core::model::{format_duration, FailureDetail, TestCaseRecord};

    fn record(class: &str, method: &str, status: TestStatus) -> TestCaseRecord {
        TestCaseRecord {
            name: method.to_string(),
            method: method.to_string(),
            class: class.to_string(),
            identifier: format!("{class}/{method}()"),
            status,
            duration: 0.25,
            duration_formatted: format_duration(0.25),
            failures: Vec::new(),
            summary_ref: None,
        }
    }

    #[test]
    fn banner_reflects_outcome() {
        let passing = TestReport::from_records(
            vec![record("A", "testOk", TestStatus::Success)],
            None,
        );
        let html = generate_html_report(&passing, None, &ReportMeta::default());
        assert!(html.contains("status-banner success"));
        assert!(html.contains("ALL TESTS PASSED"));

        let failing = TestReport::from_records(
            vec![record("A", "testBad", TestStatus::Failure)],
            None,
        );
        let html = generate_html_report(&failing, None, &ReportMeta::default());
        assert!(html.contains("status-banner failure"));
        assert!(html.contains("1 TEST(S) FAILED"));
        assert!(html.contains("❌ Failed Tests"));
    }

    #[test]
    fn test_rows_carry_filter_attributes() {
        let report = TestReport::from_records(
            vec![
                record("A", "testOk", TestStatus::Success),
                record("A", "testSkip", TestStatus::Skipped),
            ],
            None,
        );
        let html = generate_html_report(&report, None, &ReportMeta::default());
        assert!(html.contains(r#"data-status="passed""#));
        assert!(html.contains(r#"data-status="skipped""#));
    }

    #[test]
    fn failure_content_is_escaped() {
        let mut failing = record("A", "testEscape", TestStatus::Failure);
        failing.failures.push(FailureDetail {
            message: "expected <b> & got \"c\"".into(),
            file: "A.swift".into(),
            line: 7,
        });
        let report = TestReport::from_records(vec![failing], None);
        let html = generate_html_report(&report, None, &ReportMeta::default());
        assert!(html.contains("expected &lt;b&gt; &amp; got &quot;c&quot;"));
        assert!(html.contains("<code>A.swift:7</code>"));
    }

    #[test]
    fn coverage_section_renders_bars() {
        let coverage = CoverageReport {
            total_coverage: 82.5,
            line_coverage: 82.5,
            covered_lines: 825,
            executable_lines: 1000,
            targets: vec![xcreport::core::coverage::TargetCoverage {
                name: "App".into(),
                coverage: 82.5,
                covered_lines: 825,
                executable_lines: 1000,
                coverage_formatted: "82.5%".into(),
            }],
            files: Vec::new(),
        };
        let report = TestReport::from_records(Vec::new(), None);
        let html = generate_html_report(&report, Some(&coverage), &ReportMeta::default());
        assert!(html.contains("82.5%"));
        assert!(html.contains("#4ecca3"));
        assert!(html.contains("📈 Code Coverage"));
    }

    #[test]
    fn missing_coverage_shows_na_card() {
        let report = TestReport::from_records(Vec::new(), None);
        let html = generate_html_report(&report, None, &ReportMeta::default());
        assert!(html.contains(r#"<div class="value">N/A</div>"#));
        assert!(!html.contains("📈 Code Coverage"));
    }
}
