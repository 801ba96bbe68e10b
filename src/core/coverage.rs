//! Line-coverage report parsing.
//!
//! `xccov view --report --json` emits a well-formed document, so unlike the
//! result trees this side parses with typed serde structs. Missing fields
//! default to zero; files with no executable lines are dropped.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Coverage for one build target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetCoverage {
    /// Target name
    pub name: String,
    /// Line coverage percentage (0–100)
    pub coverage: f64,
    /// Covered executable lines
    pub covered_lines: u64,
    /// Total executable lines
    pub executable_lines: u64,
    /// Percentage formatted for display, e.g. "84.2%"
    pub coverage_formatted: String,
}

/// Coverage for one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileCoverage {
    /// File name
    pub name: String,
    /// Full path within the repository
    pub path: String,
    /// Owning target
    pub target: String,
    /// Line coverage percentage (0–100)
    pub coverage: f64,
    /// Covered executable lines
    pub covered_lines: u64,
    /// Total executable lines
    pub executable_lines: u64,
    /// Percentage formatted for display
    pub coverage_formatted: String,
}

/// Simplified coverage report for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Overall coverage percentage (0–100)
    #[serde(default)]
    pub total_coverage: f64,
    /// Overall line coverage percentage (same value, kept for consumers)
    #[serde(default)]
    pub line_coverage: f64,
    /// Covered executable lines across all targets
    #[serde(default)]
    pub covered_lines: u64,
    /// Total executable lines across all targets
    #[serde(default)]
    pub executable_lines: u64,
    /// Per-target coverage, sorted by target name
    #[serde(default)]
    pub targets: Vec<TargetCoverage>,
    /// Per-file coverage, worst first
    #[serde(default)]
    pub files: Vec<FileCoverage>,
}

/// Raw xccov document shape.
#[derive(Debug, Default, Deserialize)]
struct XccovReport {
    #[serde(default, rename = "lineCoverage")]
    line_coverage: f64,
    #[serde(default, rename = "coveredLines")]
    covered_lines: u64,
    #[serde(default, rename = "executableLines")]
    executable_lines: u64,
    #[serde(default)]
    targets: Vec<XccovTarget>,
}

#[derive(Debug, Default, Deserialize)]
struct XccovTarget {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "lineCoverage")]
    line_coverage: f64,
    #[serde(default, rename = "coveredLines")]
    covered_lines: u64,
    #[serde(default, rename = "executableLines")]
    executable_lines: u64,
    #[serde(default)]
    files: Vec<XccovFile>,
}

#[derive(Debug, Default, Deserialize)]
struct XccovFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default, rename = "lineCoverage")]
    line_coverage: f64,
    #[serde(default, rename = "coveredLines")]
    covered_lines: u64,
    #[serde(default, rename = "executableLines")]
    executable_lines: u64,
}

impl CoverageReport {
    /// Parse an xccov JSON document into a simplified report.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: XccovReport = serde_json::from_str(text)?;
        Ok(Self::from_xccov(raw))
    }

    fn from_xccov(raw: XccovReport) -> Self {
        let mut targets = Vec::new();
        let mut files = Vec::new();

        for target in raw.targets {
            let percent = target.line_coverage * 100.0;
            targets.push(TargetCoverage {
                name: target.name.clone(),
                coverage: percent,
                covered_lines: target.covered_lines,
                executable_lines: target.executable_lines,
                coverage_formatted: format!("{percent:.1}%"),
            });

            for file in target.files {
                if file.executable_lines == 0 {
                    continue;
                }
                let percent = file.line_coverage * 100.0;
                files.push(FileCoverage {
                    name: file.name,
                    path: file.path,
                    target: target.name.clone(),
                    coverage: percent,
                    covered_lines: file.covered_lines,
                    executable_lines: file.executable_lines,
                    coverage_formatted: format!("{percent:.1}%"),
                });
            }
        }

        targets.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.coverage.total_cmp(&b.coverage));

        let overall = raw.line_coverage * 100.0;
        Self {
            total_coverage: overall,
            line_coverage: overall,
            covered_lines: raw.covered_lines,
            executable_lines: raw.executable_lines,
            targets,
            files,
        }
    }

    /// Render the stderr summary block with per-target coverage bars.
    pub fn text_summary(&self) -> String {
        let mut lines = Vec::new();
        let rule = "=".repeat(60);
        lines.push(rule.clone());
        lines.push("CODE COVERAGE REPORT".to_string());
        lines.push(rule.clone());
        lines.push(format!("Overall Coverage: {:.1}%", self.total_coverage));
        lines.push(format!(
            "Lines Covered: {} / {}",
            self.covered_lines, self.executable_lines
        ));
        lines.push(String::new());

        if !self.targets.is_empty() {
            lines.push("COVERAGE BY TARGET:".to_string());
            for target in &self.targets {
                lines.push(format!(
                    "  {}: {} [{}]",
                    target.name,
                    target.coverage_formatted,
                    coverage_bar(target.coverage)
                ));
            }
        }

        lines.push(String::new());
        lines.push("LOWEST COVERAGE FILES:".to_string());
        for file in self.files.iter().take(10) {
            lines.push(format!("  {:>6} - {}", file.coverage_formatted, file.name));
        }
        lines.push(rule);
        lines.join("\n")
    }
}

/// 20-cell bar for a 0–100 percentage.
fn coverage_bar(percent: f64) -> String {
    let filled = ((percent / 5.0) as usize).min(20);
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "lineCoverage": 0.755,
        "coveredLines": 755,
        "executableLines": 1000,
        "targets": [
            {
                "name": "Palace",
                "lineCoverage": 0.8,
                "coveredLines": 400,
                "executableLines": 500,
                "files": [
                    {"name": "A.swift", "path": "Sources/A.swift",
                     "lineCoverage": 0.5, "coveredLines": 50, "executableLines": 100},
                    {"name": "Empty.swift", "path": "Sources/Empty.swift",
                     "lineCoverage": 0.0, "coveredLines": 0, "executableLines": 0},
                    {"name": "B.swift", "path": "Sources/B.swift",
                     "lineCoverage": 0.9, "coveredLines": 90, "executableLines": 100}
                ]
            },
            {
                "name": "AudioEngine",
                "lineCoverage": 0.71,
                "coveredLines": 355,
                "executableLines": 500,
                "files": []
            }
        ]
    }"#;

    #[test]
    fn parses_and_reshapes_xccov_output() {
        let report = CoverageReport::from_json_str(SAMPLE).unwrap();
        assert!((report.total_coverage - 75.5).abs() < 1e-9);
        assert_eq!(report.covered_lines, 755);

        // Targets sorted by name.
        let names: Vec<&str> = report.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["AudioEngine", "Palace"]);

        // Zero-executable files dropped, rest sorted worst-first.
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].name, "A.swift");
        assert_eq!(report.files[0].coverage_formatted, "50.0%");
    }

    #[test]
    fn empty_document_yields_zero_report() {
        let report = CoverageReport::from_json_str("{}").unwrap();
        assert_eq!(report.total_coverage, 0.0);
        assert!(report.targets.is_empty());
        assert!(report.files.is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(CoverageReport::from_json_str("not json").is_err());
    }

    #[test]
    fn bar_rendering_clamps() {
        assert_eq!(coverage_bar(0.0), "░".repeat(20));
        assert_eq!(coverage_bar(100.0), "█".repeat(20));
        assert_eq!(coverage_bar(50.0), format!("{}{}", "█".repeat(10), "░".repeat(10)));
    }

    #[test]
    fn summary_mentions_targets_and_worst_files() {
        let report = CoverageReport::from_json_str(SAMPLE).unwrap();
        let summary = report.text_summary();
        assert!(summary.contains("Overall Coverage: 75.5%"));
        assert!(summary.contains("Palace: 80.0%"));
        assert!(summary.contains("50.0% - A.swift"));
    }
}
