//! Normalized test-case records and their supporting value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single executed test case.
///
/// Raw trees spell outcomes several ways (`Passed`, `Success`, `failure`, ...);
/// [`TestStatus::parse`] normalizes them case-insensitively. Anything outside
/// the known set maps to [`TestStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    /// Test ran and passed
    Success,
    /// Test ran and failed
    Failure,
    /// Test was skipped
    Skipped,
    /// Outcome could not be classified
    Unknown,
}

impl TestStatus {
    /// Normalize a raw status string.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "passed" | "success" => Self::Success,
            "failed" | "failure" => Self::Failure,
            "skipped" => Self::Skipped,
            _ => Self::Unknown,
        }
    }

    /// True for [`TestStatus::Failure`].
    pub fn is_failure(self) -> bool {
        self == Self::Failure
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Skipped => "Skipped",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// One structured failure attached to a test case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Failure message (assertion text, crash reason)
    #[serde(default)]
    pub message: String,
    /// Source file where the failure was recorded
    #[serde(default)]
    pub file: String,
    /// Line number within `file`, 0 when unknown
    #[serde(default)]
    pub line: u64,
}

/// A normalized record for one executed test case.
///
/// Constructed once by the extractor and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    /// Display name with any trailing `()` stripped
    pub name: String,
    /// Method name, last segment of the identifier
    pub method: String,
    /// Owning class, "Unknown" when unresolvable
    pub class: String,
    /// Unique path-like identifier, e.g. `LoginTests/testLogin()`
    pub identifier: String,
    /// Normalized outcome
    pub status: TestStatus,
    /// Wall-clock duration in seconds, 0 when unavailable
    pub duration: f64,
    /// Human-readable rendering of `duration`
    pub duration_formatted: String,
    /// Structured failures, empty when the schema keeps them out-of-line
    pub failures: Vec<FailureDetail>,
    /// Reference id for the external failure-detail lookup, when exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_ref: Option<String>,
}

/// Format a duration in seconds for display.
///
/// Matches the buckets used across all report surfaces: `<1ms`, whole
/// milliseconds under a second, two-decimal seconds under a minute, then
/// `Nm NNs`.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.001 {
        "<1ms".to_string()
    } else if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{seconds:.2}s")
    } else {
        let mins = (seconds / 60.0).floor() as u64;
        let secs = seconds % 60.0;
        format!("{mins}m {secs:.0}s")
    }
}

/// Parse a duration string that may carry a single trailing unit marker.
///
/// Accepts `"0.93"` and `"0.93s"`; anything unparseable yields 0.0. Negative
/// values clamp to 0.0; a record's duration is never negative.
pub fn parse_duration_str(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<f64>().ok().or_else(|| {
        let stripped = trimmed
            .strip_suffix(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed);
        stripped.trim().parse::<f64>().ok()
    });
    parsed.unwrap_or(0.0).max(0.0)
}

/// Derive `(class, method)` from a path-like identifier.
///
/// Splits on `/` after stripping `()` suffixes; the last segment is the
/// method, the second-to-last the class. With fewer than two segments the
/// class falls back to the nearest enclosing container name, else "Unknown".
pub fn split_identifier(identifier: &str, nearest_class: Option<&str>) -> (String, String) {
    let cleaned = identifier.replace("()", "");
    let segments: Vec<&str> = cleaned.split('/').filter(|s| !s.is_empty()).collect();

    let method = segments.last().copied().unwrap_or(&cleaned).to_string();
    let class = if segments.len() >= 2 {
        segments[segments.len() - 2].to_string()
    } else {
        nearest_class
            .filter(|c| !c.is_empty())
            .unwrap_or("Unknown")
            .to_string()
    };
    (class, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalization_is_case_insensitive() {
        assert_eq!(TestStatus::parse("Passed"), TestStatus::Success);
        assert_eq!(TestStatus::parse("success"), TestStatus::Success);
        assert_eq!(TestStatus::parse("Failed"), TestStatus::Failure);
        assert_eq!(TestStatus::parse("failure"), TestStatus::Failure);
        assert_eq!(TestStatus::parse("SKIPPED"), TestStatus::Skipped);
        assert_eq!(TestStatus::parse("Expected Failure"), TestStatus::Unknown);
        assert_eq!(TestStatus::parse(""), TestStatus::Unknown);
    }

    #[test]
    fn duration_formatting_buckets() {
        assert_eq!(format_duration(0.0004), "<1ms");
        assert_eq!(format_duration(0.25), "250ms");
        assert_eq!(format_duration(0.93), "930ms");
        assert_eq!(format_duration(1.5), "1.50s");
        assert_eq!(format_duration(59.994), "59.99s");
        assert_eq!(format_duration(61.0), "1m 1s");
        assert_eq!(format_duration(125.4), "2m 5s");
    }

    #[test]
    fn duration_parsing_strips_one_unit_marker() {
        assert_eq!(parse_duration_str("0.93"), 0.93);
        assert_eq!(parse_duration_str("0.93s"), 0.93);
        assert_eq!(parse_duration_str(" 12 "), 12.0);
        assert_eq!(parse_duration_str("fast"), 0.0);
        assert_eq!(parse_duration_str(""), 0.0);
        assert_eq!(parse_duration_str("-3.0"), 0.0);
    }

    #[test]
    fn identifier_splitting() {
        let (class, method) = split_identifier("LoginTests/testLogin()", None);
        assert_eq!(class, "LoginTests");
        assert_eq!(method, "testLogin");

        let (class, method) = split_identifier("Suite/LoginTests/testLogin()", None);
        assert_eq!(class, "LoginTests");
        assert_eq!(method, "testLogin");

        let (class, method) = split_identifier("testLogin()", Some("LoginTests"));
        assert_eq!(class, "LoginTests");
        assert_eq!(method, "testLogin");

        let (class, method) = split_identifier("testLogin", None);
        assert_eq!(class, "Unknown");
        assert_eq!(method, "testLogin");
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = TestCaseRecord {
            name: "testLogin".into(),
            method: "testLogin".into(),
            class: "LoginTests".into(),
            identifier: "LoginTests/testLogin()".into(),
            status: TestStatus::Failure,
            duration: 0.93,
            duration_formatted: format_duration(0.93),
            failures: vec![FailureDetail {
                message: "XCTAssertTrue failed".into(),
                file: "LoginTests.swift".into(),
                line: 42,
            }],
            summary_ref: None,
        };

        let text = serde_json::to_string(&record).unwrap();
        let back: TestCaseRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
        assert!(!text.contains("summary_ref"));
    }
}
