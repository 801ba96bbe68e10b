//! Terminal summary blocks, written to stderr so stdout stays pipeable.

use xcreport::core::report::TestReport;
use xcreport::history::HistoryComparison;

/// Print the post-extraction run summary.
pub fn print_run_summary(report: &TestReport) {
    let rule = "=".repeat(60);
    let summary = &report.summary;

    eprintln!("{rule}");
    eprintln!("TEST RESULTS SUMMARY");
    eprintln!("{rule}");
    eprintln!("Total Tests:  {}", summary.tests);
    eprintln!("✓ Passed:     {}", summary.passed);
    eprintln!("✗ Failed:     {}", summary.failed);
    eprintln!("⊘ Skipped:    {}", summary.skipped);
    eprintln!("Duration:     {}", summary.duration_formatted);
    eprintln!("Pass Rate:    {}", summary.pass_rate);

    if !report.failed_tests.is_empty() {
        eprintln!();
        eprintln!("FAILED TESTS:");
        for test in report.failed_tests.iter().take(10) {
            eprintln!("  ✗ {}.{}", test.class, test.method);
        }
        let remaining = report.failed_tests.len().saturating_sub(10);
        if remaining > 0 {
            eprintln!("  ... and {remaining} more");
        }
    }

    if !report.classes.is_empty() {
        eprintln!();
        eprintln!("RESULTS BY CLASS:");
        for (name, group) in &report.classes {
            eprintln!(
                "  {name}: {}/{} passed ({})",
                group.stats.passed, group.stats.total, group.stats.duration_formatted
            );
        }
    }
    eprintln!("{rule}");
}

/// Print the history comparison summary.
pub fn print_comparison_summary(comparison: &HistoryComparison) {
    let rule = "=".repeat(60);
    eprintln!("{rule}");
    eprintln!("TEST HISTORY COMPARISON");
    eprintln!("{rule}");

    if !comparison.has_previous {
        eprintln!("No previous run to compare against.");
        eprintln!("{rule}");
        return;
    }

    if let Some(timestamp) = &comparison.previous_timestamp {
        eprintln!("Previous run: {timestamp}");
    }

    let changes = &comparison.changes;
    eprintln!(
        "Tests:    {} ({})",
        changes.tests.current, changes.tests.change_formatted
    );
    eprintln!(
        "Failed:   {} ({})",
        changes.failed.current, changes.failed.change_formatted
    );
    let direction = if changes.duration.faster {
        "faster"
    } else {
        "slower"
    };
    eprintln!(
        "Duration: {:.1}s ({:.1}s {direction})",
        changes.duration.current,
        changes.duration.change.abs()
    );

    if !comparison.new_failures.is_empty() {
        eprintln!();
        eprintln!("NEW FAILURES:");
        for test in &comparison.new_failures {
            eprintln!("  ✗ {test}");
        }
    }
    if !comparison.fixed_tests.is_empty() {
        eprintln!();
        eprintln!("FIXED TESTS:");
        for test in &comparison.fixed_tests {
            eprintln!("  ✓ {test}");
        }
    }
    if !comparison.flaky_tests.is_empty() {
        eprintln!();
        eprintln!("FLAKY TESTS:");
        for flaky in &comparison.flaky_tests {
            eprintln!(
                "  ~ {} ({}/{} failures)",
                flaky.test, flaky.failures, flaky.total
            );
        }
    }
    eprintln!("{rule}");
}
