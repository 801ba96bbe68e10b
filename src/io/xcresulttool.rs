//! External result-inspection tool invocation.
//!
//! Result bundles are opaque; all reads go through `xcrun xcresulttool` (test
//! data) and `xcrun xccov` (coverage). Both are black-box producers invoked
//! as scoped child processes with a timeout, their stdout captured as text
//! and parsed as JSON.
//!
//! Every failure mode here (spawn error, non-zero exit, timeout, garbage
//! output) is logged and degrades to "no data available". Callers always
//! get a well-formed (possibly empty) result, never an error, matching the
//! downstream requirement that reports render a coherent empty state.
//!
//! The [`ToolRunner`] trait is the seam for tests: extraction pipelines run
//! against canned outputs without an Xcode toolchain on the machine.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::coverage::CoverageReport;
use crate::core::extract::{extract_failure_details, ResultTreeExtractor};
use crate::core::model::{FailureDetail, TestCaseRecord};
use crate::core::raw::RawNode;
use crate::core::report::TestReport;
use crate::core::errors::{Result, XcreportError};

/// Default ceiling for one external tool invocation.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Captured outcome of one external process run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// True when the process exited with status 0
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Executes external tool invocations.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, capturing output.
    ///
    /// Returns `Err` only for environmental failures (spawn error, timeout);
    /// a non-zero exit is a successful run with `success == false`.
    async fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput>;
}

/// Production runner shelling out through `xcrun`.
#[derive(Debug, Clone)]
pub struct XcrunRunner {
    timeout: Duration,
}

impl Default for XcrunRunner {
    fn default() -> Self {
        Self {
            timeout: TOOL_TIMEOUT,
        }
    }
}

impl XcrunRunner {
    /// Create a runner with the default 120 s timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for XcrunRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        debug!(program, ?args, "running external tool");
        let output = tokio::time::timeout(self.timeout, Command::new(program).args(args).output())
            .await
            .map_err(|_| {
                XcreportError::tool(program, format!("timed out after {:?}", self.timeout))
            })?
            .map_err(|err| XcreportError::io(format!("failed to spawn {program}"), err))?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Reads test and coverage data out of a result bundle.
pub struct ResultBundleReader<R: ToolRunner> {
    runner: R,
    extractor: ResultTreeExtractor,
}

impl ResultBundleReader<XcrunRunner> {
    /// Create a reader backed by the real `xcrun` toolchain.
    pub fn new() -> Self {
        Self::with_runner(XcrunRunner::new())
    }
}

impl Default for ResultBundleReader<XcrunRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ToolRunner> ResultBundleReader<R> {
    /// Create a reader over a custom [`ToolRunner`].
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            extractor: ResultTreeExtractor::new(),
        }
    }

    /// Load and assemble the full test report for a bundle.
    ///
    /// Walks `actions[*].actionResult.testsRef` into the referenced test
    /// trees, extracts records, and resolves failure details for failed
    /// tests. Any missing piece degrades to fewer records; the report is
    /// always well-formed.
    pub async fn load_report(&self, bundle: &str) -> TestReport {
        let Some(root) = self.xcresulttool_get(bundle, None).await else {
            warn!(bundle, "failed to load result bundle");
            return TestReport::from_records(Vec::new(), Some(bundle.to_string()));
        };

        let mut group_trees = Vec::new();
        for action in root.field("actions").and_then(RawNode::items).unwrap_or(&[]) {
            let tests_ref = action
                .field("actionResult")
                .and_then(|r| r.field("testsRef"))
                .and_then(|r| r.field("id"))
                .and_then(RawNode::resolved_nonempty_str);
            let Some(tests_ref) = tests_ref else {
                warn!(bundle, "no testsRef found in action");
                continue;
            };

            debug!(tests_ref, "querying tests reference");
            let Some(tests_data) = self.xcresulttool_get(bundle, Some(tests_ref)).await else {
                warn!(bundle, tests_ref, "failed to load tests data");
                continue;
            };
            group_trees.push(tests_data);
        }

        let records = self.extractor.extract_all(&group_trees);
        let records = self.resolve_failures(bundle, records).await;
        TestReport::from_records(records, Some(bundle.to_string()))
    }

    /// Fetch full failure messages for failed records that expose a
    /// summary reference. Failures of the lookup itself leave the record's
    /// failure list empty.
    async fn resolve_failures(
        &self,
        bundle: &str,
        records: Vec<TestCaseRecord>,
    ) -> Vec<TestCaseRecord> {
        let mut resolved = Vec::with_capacity(records.len());
        for mut record in records {
            if record.status.is_failure() && record.failures.is_empty() {
                if let Some(summary_ref) = record.summary_ref.clone() {
                    record.failures = self.fetch_failure_details(bundle, &summary_ref).await;
                }
            }
            resolved.push(record);
        }
        resolved
    }

    /// Fetch structured failure details referenced by `summary_ref`.
    ///
    /// A distinct operation from extraction; any failure yields an empty
    /// list and is never propagated.
    pub async fn fetch_failure_details(
        &self,
        bundle: &str,
        summary_ref: &str,
    ) -> Vec<FailureDetail> {
        match self.xcresulttool_get(bundle, Some(summary_ref)).await {
            Some(summary) => extract_failure_details(&summary),
            None => Vec::new(),
        }
    }

    /// Fetch the xccov coverage report for a bundle.
    pub async fn load_coverage(&self, bundle: &str) -> Option<CoverageReport> {
        let args = ["xccov", "view", "--report", "--json", bundle];
        let output = match self.runner.run("xcrun", &args).await {
            Ok(output) => output,
            Err(err) => {
                warn!(bundle, %err, "xccov invocation failed");
                return None;
            }
        };
        if !output.success {
            warn!(bundle, stderr = %truncate(&output.stderr), "xccov exited non-zero");
            return None;
        }
        match CoverageReport::from_json_str(&output.stdout) {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(bundle, %err, "failed to parse xccov JSON output");
                None
            }
        }
    }

    /// Fetch one JSON tree from the bundle, optionally by reference id.
    ///
    /// Newer Xcode wants the `--legacy` flag for this output shape; older
    /// releases reject the flag. Tries with the flag first and retries
    /// without it when stderr suggests a deprecation mismatch.
    pub async fn xcresulttool_get(&self, bundle: &str, ref_id: Option<&str>) -> Option<RawNode> {
        let output = self.run_get(bundle, ref_id, true).await?;
        if output.success && !output.stdout.trim().is_empty() {
            return self.parse_tree(&output.stdout);
        }

        let stderr = output.stderr.to_lowercase();
        if stderr.contains("deprecated") || stderr.contains("legacy") {
            let output = self.run_get(bundle, ref_id, false).await?;
            if output.success && !output.stdout.trim().is_empty() {
                return self.parse_tree(&output.stdout);
            }
        }

        warn!(bundle, stderr = %truncate(&output.stderr), "xcresulttool returned no data");
        None
    }

    async fn run_get(&self, bundle: &str, ref_id: Option<&str>, legacy: bool) -> Option<ToolOutput> {
        let mut args = vec!["xcresulttool", "get"];
        if legacy {
            args.push("--legacy");
        }
        args.extend(["--path", bundle, "--format", "json"]);
        if let Some(id) = ref_id {
            args.extend(["--id", id]);
        }

        match self.runner.run("xcrun", &args).await {
            Ok(output) => Some(output),
            Err(err) => {
                warn!(bundle, %err, "xcresulttool invocation failed");
                None
            }
        }
    }

    fn parse_tree(&self, text: &str) -> Option<RawNode> {
        match RawNode::from_json_str(text) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!(%err, "failed to parse xcresulttool JSON output");
                None
            }
        }
    }
}

fn truncate(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}
