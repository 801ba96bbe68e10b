//! Run-level report assembly.
//!
//! Folds the extractor's flat record sequence into the report shape consumed
//! by every downstream surface: run summary, per-class groups with
//! statistics, and the failed-test subset. An empty record sequence produces
//! a coherent zero-count report, never an error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::model::{format_duration, TestCaseRecord, TestStatus};

/// Aggregate counts for one test run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total number of unique test cases
    #[serde(default)]
    pub tests: usize,
    /// Tests that passed
    #[serde(default)]
    pub passed: usize,
    /// Tests that failed
    #[serde(default)]
    pub failed: usize,
    /// Tests that were skipped
    #[serde(default)]
    pub skipped: usize,
    /// Total duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Human-readable rendering of `duration`
    #[serde(default)]
    pub duration_formatted: String,
    /// Pass rate as a percentage string, "N/A" for empty runs
    #[serde(default)]
    pub pass_rate: String,
}

/// Aggregate counts for one test class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    /// Tests in the class
    #[serde(default)]
    pub total: usize,
    /// Passing tests
    #[serde(default)]
    pub passed: usize,
    /// Failing tests
    #[serde(default)]
    pub failed: usize,
    /// Skipped tests
    #[serde(default)]
    pub skipped: usize,
    /// Combined duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Human-readable rendering of `duration`
    #[serde(default)]
    pub duration_formatted: String,
}

/// The tests of one class together with their statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    /// Records belonging to the class, in report order
    #[serde(default)]
    pub tests: Vec<TestCaseRecord>,
    /// Aggregated counts
    #[serde(default)]
    pub stats: ClassStats,
}

/// Build outcome attached by CI when compilation failed before tests ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// "failed" when the build broke before tests could run
    #[serde(default)]
    pub status: String,
    /// Captured compiler error lines
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A complete post-processed test run.
///
/// Serializes to the `test-data.json` interchange format shared by the
/// `report`, `html`, and `history` subcommands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Whether extraction completed (an empty run is still a success)
    #[serde(default)]
    pub success: bool,
    /// Path of the source bundle, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xcresult_path: Option<String>,
    /// Run-level aggregates
    #[serde(default)]
    pub summary: RunSummary,
    /// All records, sorted by `(class, name)`
    #[serde(default)]
    pub tests: Vec<TestCaseRecord>,
    /// Per-class groups, sorted by class name
    #[serde(default)]
    pub classes: IndexMap<String, ClassGroup>,
    /// The failing subset of `tests`
    #[serde(default)]
    pub failed_tests: Vec<TestCaseRecord>,
    /// Build outcome injected by CI, absent in normal runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInfo>,
}

impl TestReport {
    /// Assemble a report from extracted records.
    ///
    /// `records` is expected in extractor order (deduplicated, sorted by
    /// class and name); grouping preserves that order.
    pub fn from_records(records: Vec<TestCaseRecord>, xcresult_path: Option<String>) -> Self {
        let summary = summarize(&records);
        let classes = group_by_class(&records);
        let failed_tests = records
            .iter()
            .filter(|r| r.status.is_failure())
            .cloned()
            .collect();

        Self {
            success: true,
            xcresult_path,
            summary,
            tests: records,
            classes,
            failed_tests,
            build: None,
        }
    }

    /// True when the build failed before tests could run.
    pub fn build_failed(&self) -> bool {
        self.build
            .as_ref()
            .is_some_and(|build| build.status == "failed")
    }
}

fn summarize(records: &[TestCaseRecord]) -> RunSummary {
    let tests = records.len();
    let passed = count_status(records, TestStatus::Success);
    let failed = count_status(records, TestStatus::Failure);
    let skipped = count_status(records, TestStatus::Skipped);
    let duration: f64 = records.iter().map(|r| r.duration).sum();

    let pass_rate = if tests > 0 {
        format!("{:.1}%", passed as f64 / tests as f64 * 100.0)
    } else {
        "N/A".to_string()
    };

    RunSummary {
        tests,
        passed,
        failed,
        skipped,
        duration,
        duration_formatted: format_duration(duration),
        pass_rate,
    }
}

fn group_by_class(records: &[TestCaseRecord]) -> IndexMap<String, ClassGroup> {
    let mut classes: IndexMap<String, ClassGroup> = IndexMap::new();
    for record in records {
        classes
            .entry(record.class.clone())
            .or_default()
            .tests
            .push(record.clone());
    }
    classes.sort_keys();

    for group in classes.values_mut() {
        let duration: f64 = group.tests.iter().map(|t| t.duration).sum();
        group.stats = ClassStats {
            total: group.tests.len(),
            passed: count_status(&group.tests, TestStatus::Success),
            failed: count_status(&group.tests, TestStatus::Failure),
            skipped: count_status(&group.tests, TestStatus::Skipped),
            duration,
            duration_formatted: format_duration(duration),
        };
    }
    classes
}

fn count_status(records: &[TestCaseRecord], status: TestStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::format_duration;

    fn record(class: &str, name: &str, status: TestStatus, duration: f64) -> TestCaseRecord {
        TestCaseRecord {
            name: name.to_string(),
            method: name.to_string(),
            class: class.to_string(),
            identifier: format!("{class}/{name}()"),
            status,
            duration,
            duration_formatted: format_duration(duration),
            failures: Vec::new(),
            summary_ref: None,
        }
    }

    #[test]
    fn empty_run_renders_zero_counts() {
        let report = TestReport::from_records(Vec::new(), None);
        assert!(report.success);
        assert_eq!(report.summary.tests, 0);
        assert_eq!(report.summary.pass_rate, "N/A");
        assert!(report.classes.is_empty());
        assert!(report.failed_tests.is_empty());
    }

    #[test]
    fn summary_and_class_stats_add_up() {
        let records = vec![
            record("ATests", "testOne", TestStatus::Success, 1.0),
            record("ATests", "testTwo", TestStatus::Failure, 2.0),
            record("BTests", "testThree", TestStatus::Skipped, 0.5),
        ];
        let report = TestReport::from_records(records, Some("run.xcresult".into()));

        assert_eq!(report.summary.tests, 3);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.summary.pass_rate, "33.3%");
        assert!((report.summary.duration - 3.5).abs() < 1e-9);

        let a = &report.classes["ATests"];
        assert_eq!(a.stats.total, 2);
        assert_eq!(a.stats.failed, 1);
        assert_eq!(report.failed_tests.len(), 1);
        assert_eq!(report.failed_tests[0].name, "testTwo");
    }

    #[test]
    fn classes_are_sorted_by_name() {
        let records = vec![
            record("Zulu", "testZ", TestStatus::Success, 0.1),
            record("Alpha", "testA", TestStatus::Success, 0.1),
        ];
        let report = TestReport::from_records(records, None);
        let names: Vec<&String> = report.classes.keys().collect();
        assert_eq!(names, ["Alpha", "Zulu"]);
    }

    #[test]
    fn partial_json_deserializes_with_defaults() {
        let report: TestReport = serde_json::from_str(r#"{"summary": {"tests": 2}}"#).unwrap();
        assert_eq!(report.summary.tests, 2);
        assert_eq!(report.summary.pass_rate, "");
        assert!(report.tests.is_empty());
        assert!(!report.build_failed());
    }

    #[test]
    fn build_failed_flag() {
        let report: TestReport = serde_json::from_str(
            r#"{"build": {"status": "failed", "errors": ["error: missing symbol"]}}"#,
        )
        .unwrap();
        assert!(report.build_failed());
    }
}
