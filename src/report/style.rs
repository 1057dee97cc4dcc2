// ABOUTME: Presentation settings for formatted error reports
// ABOUTME: Controls wrap width, indentation, line separator and the report header

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportStyle {
    /// Maximum line width before wrapping
    pub width: usize,
    /// Indentation of error fields
    pub indent: String,
    /// Indentation of wrapped continuation lines
    pub continuation: String,
    pub separator: String,
    pub header: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            width: 100,
            indent: "    ".to_string(),
            continuation: "        ".to_string(),
            separator: "\n".to_string(),
            header: "[layercake render]".to_string(),
        }
    }
}

impl ReportStyle {
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }
}
