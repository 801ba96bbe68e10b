//! Command execution logic for the xcreport CLI.

pub mod coverage;
pub mod history;
pub mod html;
pub mod parse;
pub mod report;

pub use coverage::coverage_command;
pub use history::{history_analyze_command, history_compare_command, history_save_command};
pub use html::html_command;
pub use parse::parse_command;
pub use report::report_command;
