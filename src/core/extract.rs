//! Result-tree extraction.
//!
//! Locates every node that represents an individual executed test case inside
//! an arbitrarily-shaped result tree and normalizes it into a
//! [`TestCaseRecord`]. The tree may follow any of the known schema variants:
//!
//! - **legacy**: plain string fields (`name`, `testStatus`)
//! - **typed-value wrapper**: the same fields wrapped in `{"_value": ...}`
//!   objects, children under `{"_values": [...]}`
//! - **flat node**: `nodeType`/`result` fields with `children` sequences
//!
//! Variants are expressed as an ordered list of predicate + extractor pairs
//! tried in priority order, so each shape stays isolated and independently
//! testable. Extraction is a pure function over its input: malformed fields
//! read as absent, and the worst possible input yields an empty vector.

use std::collections::HashSet;

use crate::core::model::{
    format_duration, parse_duration_str, split_identifier, FailureDetail, TestCaseRecord,
    TestStatus,
};
use crate::core::raw::RawNode;

/// Default recursion ceiling. Content nested deeper is treated as absent,
/// which also protects against pathological or cyclic-looking inputs.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Node kinds that mark an individual test case in the flat-node schema.
const CASE_MARKERS: &[&str] = &["Test Case", "Test", "test", "testCase"];

/// Node kinds that mark grouping containers in the flat-node schema.
const CONTAINER_MARKERS: &[&str] = &["Test Plan", "Target", "Unit Test Bundle", "Test Suite"];

/// One schema variant: a predicate deciding whether a map node is a test
/// case under this shape, and the field-extraction rules for it.
trait SchemaVariant: Send + Sync {
    fn matches(&self, node: &RawNode) -> bool;

    /// Build a record from a matched node. Returns `None` when the node has
    /// no usable name at all, in which case it is still treated as a leaf.
    fn to_record(&self, node: &RawNode, nearest_class: Option<&str>) -> Option<TestCaseRecord>;
}

/// Legacy / typed-value-wrapper schema (`xcresulttool get --legacy`).
///
/// A test case carries a non-empty `testStatus` and a non-empty `name`, each
/// either a bare string or a one-level `_value` wrapper.
struct TypedWrapperSchema;

impl SchemaVariant for TypedWrapperSchema {
    fn matches(&self, node: &RawNode) -> bool {
        let has_status = node
            .field("testStatus")
            .and_then(RawNode::resolved_nonempty_str)
            .is_some();
        let has_name = node
            .field("name")
            .and_then(RawNode::resolved_nonempty_str)
            .is_some();
        has_status && has_name
    }

    fn to_record(&self, node: &RawNode, nearest_class: Option<&str>) -> Option<TestCaseRecord> {
        let name = node.field("name")?.resolved_nonempty_str()?;
        let status_raw = node.field("testStatus")?.resolved_nonempty_str()?;

        let identifier = node
            .field("identifier")
            .and_then(RawNode::resolved_nonempty_str)
            .map(str::to_string)
            .unwrap_or_else(|| synthesize_identifier(name, nearest_class));

        let duration = node
            .field("duration")
            .map(duration_of)
            .unwrap_or_default();

        let summary_ref = node
            .field("summaryRef")
            .and_then(|r| r.field("id"))
            .and_then(RawNode::resolved_nonempty_str)
            .map(str::to_string);

        let failures = node
            .field("failureSummaries")
            .and_then(RawNode::items)
            .map(|entries| entries.iter().filter_map(failure_of).collect())
            .unwrap_or_default();

        Some(build_record(
            name,
            &identifier,
            TestStatus::parse(status_raw),
            duration,
            failures,
            summary_ref,
            nearest_class,
        ))
    }
}

/// Flat-node schema (modern `xcresulttool get test-results tests`).
///
/// A test case either names itself via `nodeType`/`type`, or carries a
/// recognizable `result`/`status` value while not being one of the known
/// container kinds.
struct FlatNodeSchema;

impl FlatNodeSchema {
    fn node_kind<'a>(node: &'a RawNode) -> Option<&'a str> {
        node.field_any(&["nodeType", "type"])
            .and_then(RawNode::resolved_nonempty_str)
    }
}

impl SchemaVariant for FlatNodeSchema {
    fn matches(&self, node: &RawNode) -> bool {
        let kind = Self::node_kind(node);
        if kind.is_some_and(|k| CASE_MARKERS.contains(&k)) {
            return true;
        }
        if kind.is_some_and(|k| CONTAINER_MARKERS.contains(&k)) {
            return false;
        }
        node.field_any(&["result", "status"])
            .and_then(RawNode::resolved_nonempty_str)
            .is_some_and(|outcome| {
                matches!(
                    outcome.to_ascii_lowercase().as_str(),
                    "passed" | "failed" | "skipped"
                )
            })
    }

    fn to_record(&self, node: &RawNode, nearest_class: Option<&str>) -> Option<TestCaseRecord> {
        let name = node
            .field("name")
            .and_then(RawNode::resolved_nonempty_str)
            .or_else(|| {
                node.field_any(&["identifier", "nodeIdentifier"])
                    .and_then(RawNode::resolved_nonempty_str)
            })?;

        let identifier = node
            .field_any(&["identifier", "nodeIdentifier"])
            .and_then(RawNode::resolved_nonempty_str)
            .map(str::to_string)
            .unwrap_or_else(|| synthesize_identifier(name, nearest_class));

        let status_raw = node
            .field_any(&["result", "status"])
            .and_then(RawNode::resolved_nonempty_str)
            .unwrap_or_default();

        let duration = node
            .field_any(&["duration", "durationInSeconds"])
            .map(duration_of)
            .unwrap_or_default();

        let summary_ref = node
            .field("id")
            .and_then(RawNode::resolved_nonempty_str)
            .map(str::to_string);

        // Flat nodes keep failure text out-of-line; detail retrieval is a
        // separate lookup keyed by `summary_ref`.
        Some(build_record(
            name,
            &identifier,
            TestStatus::parse(status_raw),
            duration,
            Vec::new(),
            summary_ref,
            nearest_class,
        ))
    }
}

/// Extracts normalized test-case records from raw result trees.
pub struct ResultTreeExtractor {
    variants: Vec<Box<dyn SchemaVariant>>,
    max_depth: usize,
}

impl Default for ResultTreeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTreeExtractor {
    /// Create an extractor recognizing all supported schema variants.
    pub fn new() -> Self {
        Self {
            variants: vec![Box::new(TypedWrapperSchema), Box::new(FlatNodeSchema)],
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the recursion ceiling.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Extract every test-case record reachable from `root`.
    ///
    /// Records are deduplicated by `(identifier, status)` keeping the first
    /// occurrence, then sorted by `(class, name)` for deterministic output.
    /// Never fails: unrecognized or malformed content is simply skipped.
    pub fn extract(&self, root: &RawNode) -> Vec<TestCaseRecord> {
        self.extract_all([root])
    }

    /// Extract from several roots into one deduplicated, sorted sequence.
    ///
    /// Result bundles spread test groups across multiple referenced trees;
    /// deduplication has to span all of them because the same case can show
    /// up once as summary and once as detail.
    pub fn extract_all<'a>(
        &self,
        roots: impl IntoIterator<Item = &'a RawNode>,
    ) -> Vec<TestCaseRecord> {
        let mut records = Vec::new();
        for root in roots {
            self.walk(root, None, 0, &mut records);
        }

        let mut seen = HashSet::new();
        records.retain(|record| seen.insert((record.identifier.clone(), record.status)));
        records.sort_by(|a, b| {
            (a.class.as_str(), a.name.as_str()).cmp(&(b.class.as_str(), b.name.as_str()))
        });
        records
    }

    fn walk<'a>(
        &self,
        node: &'a RawNode,
        nearest_class: Option<&'a str>,
        depth: usize,
        out: &mut Vec<TestCaseRecord>,
    ) {
        if depth >= self.max_depth {
            tracing::debug!(depth, "recursion ceiling reached, treating subtree as absent");
            return;
        }

        match node {
            RawNode::Seq(items) => {
                for item in items {
                    self.walk(item, nearest_class, depth + 1, out);
                }
            }
            RawNode::Map(_) => {
                if let Some(variant) = self.variants.iter().find(|v| v.matches(node)) {
                    // A test case is a leaf for record discovery; siblings
                    // are still visited by the caller's loop.
                    if let Some(record) = variant.to_record(node, nearest_class) {
                        out.push(record);
                    }
                    return;
                }

                let next_class = container_name(node).or(nearest_class);
                for (_, child) in node.entries() {
                    if child.is_map() || child.is_seq() {
                        self.walk(child, next_class, depth + 1, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// The display name a container contributes as class context, if any.
fn container_name(node: &RawNode) -> Option<&str> {
    node.field("name")
        .and_then(RawNode::resolved_nonempty_str)
        .or_else(|| {
            node.field("identifier")
                .and_then(RawNode::resolved_nonempty_str)
        })
}

fn synthesize_identifier(name: &str, nearest_class: Option<&str>) -> String {
    match nearest_class.filter(|c| !c.is_empty()) {
        Some(class) => format!("{class}/{name}"),
        None => name.to_string(),
    }
}

/// Duration of a field that may be a bare number, a numeric string, or a
/// string with a trailing unit marker. Unparseable values yield 0.0.
fn duration_of(node: &RawNode) -> f64 {
    match node.resolved() {
        RawNode::Number(n) => n.max(0.0),
        RawNode::String(s) => parse_duration_str(s),
        _ => 0.0,
    }
}

/// Pull structured failures out of a fetched test-summary subtree.
///
/// Used by the external failure-detail lookup: the subtree referenced by a
/// record's `summary_ref` carries a `failureSummaries` sequence.
pub fn extract_failure_details(node: &RawNode) -> Vec<FailureDetail> {
    node.field("failureSummaries")
        .and_then(RawNode::items)
        .map(|entries| entries.iter().filter_map(failure_of).collect())
        .unwrap_or_default()
}

fn failure_of(entry: &RawNode) -> Option<FailureDetail> {
    let message = entry
        .field("message")
        .and_then(RawNode::resolved_str)
        .unwrap_or_default()
        .to_string();
    let file = entry
        .field_any(&["fileName", "file"])
        .and_then(RawNode::resolved_str)
        .unwrap_or_default()
        .to_string();
    let line = entry
        .field_any(&["lineNumber", "line"])
        .and_then(RawNode::resolved_f64)
        .map(|n| n.max(0.0) as u64)
        .unwrap_or(0);

    if message.is_empty() && file.is_empty() {
        return None;
    }
    Some(FailureDetail {
        message,
        file,
        line,
    })
}

fn build_record(
    name: &str,
    identifier: &str,
    status: TestStatus,
    duration: f64,
    failures: Vec<FailureDetail>,
    summary_ref: Option<String>,
    nearest_class: Option<&str>,
) -> TestCaseRecord {
    let (class, method) = split_identifier(identifier, nearest_class);
    TestCaseRecord {
        name: name.replace("()", ""),
        method,
        class,
        identifier: identifier.to_string(),
        status,
        duration,
        duration_formatted: format_duration(duration),
        failures,
        summary_ref,
    }
}
