//! Test-run history: persistence, trend analysis, and flaky-test detection.
//!
//! Each saved run becomes one `run_YYYYmmdd_HHMMSS.json` file under the
//! history directory, holding the run summary plus per-test outcomes keyed
//! by `Class.method`. Only the newest [`MAX_HISTORY_ENTRIES`] files are
//! retained. Corrupt or unreadable entries are skipped with a log line;
//! history operations never fail on bad data, only on unwritable storage.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::errors::{Result, XcreportError};
use crate::core::model::TestStatus;
use crate::core::report::{RunSummary, TestReport};
use crate::io::persistence::{load_json, save_json};

/// How many history entries are retained after a save.
pub const MAX_HISTORY_ENTRIES: usize = 15;

/// One persisted test run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// ISO-8601 UTC timestamp of the run
    #[serde(default)]
    pub timestamp: String,
    /// Run-level aggregates
    #[serde(default)]
    pub summary: RunSummary,
    /// Per-test outcome keyed by `Class.method`
    #[serde(default)]
    pub tests: IndexMap<String, HistoricalResult>,
}

/// Outcome of one test in one historical run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalResult {
    /// Normalized status
    pub status: TestStatus,
    /// Duration in seconds
    #[serde(default)]
    pub duration: f64,
}

/// Per-test statistics across retained runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestTrackRecord {
    /// Runs in which the test appeared
    pub total_runs: usize,
    /// Passing runs
    pub passes: usize,
    /// Failing runs
    pub failures: usize,
    /// Fraction of runs that passed (0–1)
    pub pass_rate: f64,
    /// Mean duration over runs with a nonzero duration
    pub avg_duration: f64,
    /// True when both passes and failures were observed
    pub is_flaky: bool,
}

/// A test with inconsistent pass/fail outcomes across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlakyTest {
    /// `Class.method` identifier
    pub test: String,
    /// Passing runs
    pub passes: usize,
    /// Failing runs
    pub failures: usize,
    /// Runs in which the test appeared
    pub total: usize,
    /// `min(passes, failures) / total`
    pub flakiness_rate: f64,
}

/// Chronological trend series across retained runs (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Test count per run
    pub test_count: Vec<usize>,
    /// Pass rate percentage per run
    pub pass_rate: Vec<f64>,
    /// Total duration per run, seconds
    pub duration: Vec<f64>,
    /// Failure count per run
    pub failed_count: Vec<usize>,
}

/// Full history analysis output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnalysis {
    /// Number of runs that could be loaded
    pub runs: usize,
    /// Top flaky tests, most flaky first (at most 10)
    pub flaky_tests: Vec<FlakyTest>,
    /// Trend series in chronological order
    pub trends: TrendSeries,
    /// Per-test track records keyed by `Class.method`
    pub test_stats: IndexMap<String, TestTrackRecord>,
}

/// Signed change of one integer run metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountChange {
    /// Current run's value
    pub current: usize,
    /// Previous run's value
    pub previous: usize,
    /// `current - previous`
    pub change: i64,
    /// Change rendered with an explicit `+` for increases
    pub change_formatted: String,
}

/// Change of the run duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationChange {
    /// Current run's duration, seconds
    pub current: f64,
    /// Previous run's duration, seconds
    pub previous: f64,
    /// `current - previous`
    pub change: f64,
    /// True when the current run was faster
    pub faster: bool,
}

/// Metric deltas between the current run and the newest history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricChanges {
    /// Total test count change
    pub tests: CountChange,
    /// Passed count change
    pub passed: CountChange,
    /// Failed count change
    pub failed: CountChange,
    /// Skipped count change
    pub skipped: CountChange,
    /// Duration change
    pub duration: DurationChange,
}

/// Comparison of the current run against history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryComparison {
    /// False when no previous run could be loaded
    pub has_previous: bool,
    /// Timestamp of the previous run, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_timestamp: Option<String>,
    /// Per-metric deltas (all zero without a previous run)
    pub changes: MetricChanges,
    /// Tests failing now that passed before (or are failing on first sight)
    pub new_failures: Vec<String>,
    /// Tests passing now that failed before
    pub fixed_tests: Vec<String>,
    /// Tests not present in the previous run
    pub new_tests: Vec<String>,
    /// Flaky tests from the full history analysis
    pub flaky_tests: Vec<FlakyTest>,
}

/// Directory-backed store of test-run history.
pub struct HistoryStore {
    dir: PathBuf,
    max_entries: usize,
}

impl HistoryStore {
    /// Open (or designate) a history directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_entries: MAX_HISTORY_ENTRIES,
        }
    }

    /// Override the retention limit.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Save a run to history and prune old entries.
    ///
    /// Returns the path of the written entry.
    pub async fn save(&self, report: &TestReport) -> Result<PathBuf> {
        self.save_at(report, Utc::now()).await
    }

    pub(crate) async fn save_at(
        &self,
        report: &TestReport,
        timestamp: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let entry = HistoryEntry {
            timestamp: timestamp.to_rfc3339(),
            summary: report.summary.clone(),
            tests: report
                .tests
                .iter()
                .map(|t| {
                    (
                        test_key(&t.class, &t.method),
                        HistoricalResult {
                            status: t.status,
                            duration: t.duration,
                        },
                    )
                })
                .collect(),
        };

        let path = self
            .dir
            .join(format!("run_{}.json", timestamp.format("%Y%m%d_%H%M%S")));
        save_json(&entry, &path).await?;
        debug!(path = %path.display(), "saved history entry");

        self.prune().await?;
        Ok(path)
    }

    /// Analyze retained runs for trends and flaky tests.
    pub async fn analyze(&self) -> HistoryAnalysis {
        let runs = self.load_entries().await;
        if runs.is_empty() {
            return HistoryAnalysis::default();
        }

        // Per-test outcomes across runs, keyed by first appearance.
        let mut outcomes: IndexMap<String, Vec<HistoricalResult>> = IndexMap::new();
        for run in &runs {
            for (test_id, result) in &run.tests {
                outcomes.entry(test_id.clone()).or_default().push(*result);
            }
        }

        let mut flaky_tests = Vec::new();
        let mut test_stats = IndexMap::new();
        for (test_id, results) in &outcomes {
            let total = results.len();
            let passes = results
                .iter()
                .filter(|r| r.status == TestStatus::Success)
                .count();
            let failures = results
                .iter()
                .filter(|r| r.status == TestStatus::Failure)
                .count();

            let durations: Vec<f64> = results
                .iter()
                .map(|r| r.duration)
                .filter(|d| *d > 0.0)
                .collect();
            let avg_duration = if durations.is_empty() {
                0.0
            } else {
                durations.iter().sum::<f64>() / durations.len() as f64
            };

            let is_flaky = passes > 0 && failures > 0;
            test_stats.insert(
                test_id.clone(),
                TestTrackRecord {
                    total_runs: total,
                    passes,
                    failures,
                    pass_rate: passes as f64 / total as f64,
                    avg_duration,
                    is_flaky,
                },
            );

            if is_flaky {
                flaky_tests.push(FlakyTest {
                    test: test_id.clone(),
                    passes,
                    failures,
                    total,
                    flakiness_rate: passes.min(failures) as f64 / total as f64,
                });
            }
        }

        flaky_tests.sort_by(|a, b| b.flakiness_rate.total_cmp(&a.flakiness_rate));
        flaky_tests.truncate(10);

        let mut trends = TrendSeries::default();
        for run in runs.iter().rev() {
            let summary = &run.summary;
            trends.test_count.push(summary.tests);
            trends.pass_rate.push(if summary.tests > 0 {
                summary.passed as f64 / summary.tests as f64 * 100.0
            } else {
                0.0
            });
            trends.duration.push(summary.duration);
            trends.failed_count.push(summary.failed);
        }

        HistoryAnalysis {
            runs: runs.len(),
            flaky_tests,
            trends,
            test_stats,
        }
    }

    /// Compare a current run against the newest history entry.
    pub async fn compare(&self, current: &TestReport) -> HistoryComparison {
        let entries = self.load_entries().await;
        let Some(previous) = entries.first() else {
            return HistoryComparison::default();
        };

        let changes = MetricChanges {
            tests: count_change(current.summary.tests, previous.summary.tests),
            passed: count_change(current.summary.passed, previous.summary.passed),
            failed: count_change(current.summary.failed, previous.summary.failed),
            skipped: count_change(current.summary.skipped, previous.summary.skipped),
            duration: DurationChange {
                current: current.summary.duration,
                previous: previous.summary.duration,
                change: current.summary.duration - previous.summary.duration,
                faster: current.summary.duration < previous.summary.duration,
            },
        };

        let mut new_failures = Vec::new();
        let mut fixed_tests = Vec::new();
        let mut new_tests = Vec::new();

        for test in &current.tests {
            let test_id = test_key(&test.class, &test.method);
            match previous.tests.get(&test_id) {
                None => {
                    if test.status == TestStatus::Failure {
                        new_failures.push(test_id.clone());
                    }
                    new_tests.push(test_id);
                }
                Some(prev) => {
                    if test.status == TestStatus::Failure && prev.status == TestStatus::Success {
                        new_failures.push(test_id);
                    } else if test.status == TestStatus::Success
                        && prev.status == TestStatus::Failure
                    {
                        fixed_tests.push(test_id);
                    }
                }
            }
        }

        let analysis = self.analyze().await;

        HistoryComparison {
            has_previous: true,
            previous_timestamp: Some(previous.timestamp.clone()),
            changes,
            new_failures,
            fixed_tests,
            new_tests,
            flaky_tests: analysis.flaky_tests,
        }
    }

    /// History file paths, newest first.
    async fn history_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(_) => return files,
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("run_") && name.ends_with(".json") {
                files.push(entry.path());
            }
        }
        // Timestamped filenames sort chronologically; newest first.
        files.sort_by(|a, b| b.cmp(a));
        files
    }

    /// Load up to `max_entries` entries, newest first, skipping corrupt files.
    async fn load_entries(&self) -> Vec<HistoryEntry> {
        let mut entries = Vec::new();
        for path in self.history_files().await.into_iter().take(self.max_entries) {
            match load_json::<HistoryEntry>(&path).await {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(path = %path.display(), %err, "skipping corrupt history entry"),
            }
        }
        entries
    }

    async fn prune(&self) -> Result<()> {
        let files = self.history_files().await;
        for old in files.iter().skip(self.max_entries) {
            tokio::fs::remove_file(old).await.map_err(|err| {
                XcreportError::io(format!("failed to remove {}", old.display()), err)
            })?;
            debug!(path = %old.display(), "removed old history entry");
        }
        Ok(())
    }
}

fn test_key(class: &str, method: &str) -> String {
    format!("{class}.{method}")
}

fn count_change(current: usize, previous: usize) -> CountChange {
    let change = current as i64 - previous as i64;
    let change_formatted = if change > 0 {
        format!("+{change}")
    } else {
        change.to_string()
    };
    CountChange {
        current,
        previous,
        change,
        change_formatted,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::core::model::{format_duration, TestCaseRecord};

    fn record(class: &str, method: &str, status: TestStatus, duration: f64) -> TestCaseRecord {
        TestCaseRecord {
            name: method.to_string(),
            method: method.to_string(),
            class: class.to_string(),
            identifier: format!("{class}/{method}()"),
            status,
            duration,
            duration_formatted: format_duration(duration),
            failures: Vec::new(),
            summary_ref: None,
        }
    }

    fn report(records: Vec<TestCaseRecord>) -> TestReport {
        TestReport::from_records(records, None)
    }

    fn at(secs_offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs_offset)
    }

    #[tokio::test]
    async fn save_writes_entry_keyed_by_class_and_method() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        let path = store
            .save_at(
                &report(vec![record("LoginTests", "testLogin", TestStatus::Success, 1.2)]),
                at(0),
            )
            .await
            .unwrap();

        let entry: HistoryEntry = load_json(&path).await.unwrap();
        assert_eq!(entry.summary.tests, 1);
        let result = &entry.tests["LoginTests.testLogin"];
        assert_eq!(result.status, TestStatus::Success);
        assert!((result.duration - 1.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn save_prunes_beyond_retention_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path()).with_max_entries(3);

        for i in 0..5 {
            store
                .save_at(&report(Vec::new()), at(i * 60))
                .await
                .unwrap();
        }

        let files = store.history_files().await;
        assert_eq!(files.len(), 3);
        // Newest entries retained.
        assert!(files[0].to_string_lossy().contains("120400"));
    }

    #[tokio::test]
    async fn analyze_detects_flaky_tests_and_trends() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        let runs = [
            vec![
                record("A", "stable", TestStatus::Success, 1.0),
                record("A", "flaky", TestStatus::Success, 2.0),
            ],
            vec![
                record("A", "stable", TestStatus::Success, 1.0),
                record("A", "flaky", TestStatus::Failure, 0.0),
            ],
            vec![
                record("A", "stable", TestStatus::Success, 1.0),
                record("A", "flaky", TestStatus::Failure, 4.0),
            ],
        ];
        for (i, records) in runs.into_iter().enumerate() {
            store
                .save_at(&report(records), at(i as i64 * 60))
                .await
                .unwrap();
        }

        let analysis = store.analyze().await;
        assert_eq!(analysis.runs, 3);
        assert_eq!(analysis.flaky_tests.len(), 1);

        let flaky = &analysis.flaky_tests[0];
        assert_eq!(flaky.test, "A.flaky");
        assert_eq!(flaky.passes, 1);
        assert_eq!(flaky.failures, 2);
        assert!((flaky.flakiness_rate - 1.0 / 3.0).abs() < 1e-9);

        let stats = &analysis.test_stats["A.flaky"];
        assert!(stats.is_flaky);
        // Zero durations excluded from the average.
        assert!((stats.avg_duration - 3.0).abs() < 1e-9);

        let stable = &analysis.test_stats["A.stable"];
        assert!(!stable.is_flaky);
        assert_eq!(stable.pass_rate, 1.0);

        // Trends are chronological: three runs of two tests each.
        assert_eq!(analysis.trends.test_count, vec![2, 2, 2]);
        assert_eq!(analysis.trends.failed_count, vec![0, 1, 1]);
    }

    #[tokio::test]
    async fn analyze_on_empty_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("does-not-exist"));
        let analysis = store.analyze().await;
        assert_eq!(analysis.runs, 0);
        assert!(analysis.flaky_tests.is_empty());
    }

    #[tokio::test]
    async fn compare_flags_new_failures_fixed_and_new_tests() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        store
            .save_at(
                &report(vec![
                    record("A", "wasPassing", TestStatus::Success, 1.0),
                    record("A", "wasFailing", TestStatus::Failure, 1.0),
                ]),
                at(0),
            )
            .await
            .unwrap();

        let current = report(vec![
            record("A", "wasPassing", TestStatus::Failure, 1.0),
            record("A", "wasFailing", TestStatus::Success, 1.0),
            record("A", "brandNew", TestStatus::Failure, 0.5),
        ]);

        let comparison = store.compare(&current).await;
        assert!(comparison.has_previous);
        // Diff lists follow the current report's record order.
        assert_eq!(
            comparison.new_failures,
            vec!["A.wasPassing".to_string(), "A.brandNew".to_string()]
        );
        assert_eq!(comparison.fixed_tests, vec!["A.wasFailing".to_string()]);
        assert_eq!(comparison.new_tests, vec!["A.brandNew".to_string()]);
        assert_eq!(comparison.changes.tests.change, 1);
        assert_eq!(comparison.changes.tests.change_formatted, "+1");
    }

    #[tokio::test]
    async fn compare_without_history_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());
        let comparison = store.compare(&report(Vec::new())).await;
        assert!(!comparison.has_previous);
        assert!(comparison.previous_timestamp.is_none());
    }
}
