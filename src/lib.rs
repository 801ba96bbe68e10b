//! # xcreport: Xcode Test-Result Post-Processing
//!
//! A Rust toolkit for turning `.xcresult` bundles into reports a team can
//! actually read. The library provides:
//!
//! - **Result-tree extraction**: schema-tolerant traversal of the JSON trees
//!   emitted by `xcresulttool` across incompatible toolchain versions
//! - **Report assembly**: normalized test-case records grouped per class with
//!   run-level summaries
//! - **Coverage parsing**: `xccov` line-coverage reports reshaped for CI
//! - **History tracking**: flaky-test detection and run-over-run comparison
//!
//! The `xcreport` binary wires these into five subcommands (`parse`, `report`,
//! `html`, `coverage`, `history`) intended for CI pipelines: diagnostics go to
//! stderr, machine-readable artifacts to files, and `key=value` pairs to
//! `$GITHUB_OUTPUT` when present.
//!
//! ## Quick Start
//!
//! ```rust
//! use xcreport::core::extract::ResultTreeExtractor;
//! use xcreport::core::raw::RawNode;
//!
//! let tree = RawNode::from_json_str(
//!     r#"{"nodeType": "Test Case", "name": "testLogin", "result": "Passed"}"#,
//! ).unwrap();
//!
//! let extractor = ResultTreeExtractor::new();
//! let records = extractor.extract(&tree);
//! assert_eq!(records.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Core extraction and data model
pub mod core {
    //! Result-tree extraction, data model, and report assembly.

    pub mod coverage;
    pub mod errors;
    pub mod extract;
    pub mod model;
    pub mod raw;
    pub mod report;
}

// I/O, external tools, and CI output
pub mod io {
    //! External tool invocation, JSON persistence, and CI output.

    pub mod github;
    pub mod persistence;
    pub mod xcresulttool;
}

// Test-run history and flaky-test analysis
pub mod history;

// Re-export primary types for convenience
pub use core::errors::{Result, XcreportError};
pub use core::extract::ResultTreeExtractor;
pub use core::model::{TestCaseRecord, TestStatus};
pub use core::raw::RawNode;
pub use core::report::TestReport;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
