// ABOUTME: Error reporting module for layercake
// ABOUTME: Formats accumulated syntax and resolution errors into one wrapped, indented report

pub mod formatter;
pub mod style;

pub use formatter::{ErrorReport, ReportEntry};
pub use style::ReportStyle;
