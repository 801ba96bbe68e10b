//! Report rendering and terminal display.

pub mod display;
pub mod html_report;
pub mod markdown_report;
