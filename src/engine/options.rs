// ABOUTME: Render options with serde defaults so partial documents merge over the defaults
// ABOUTME: Unknown keys are rejected and validate() checks values serde cannot

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ConfigError;
use crate::lexer::expression::QUOTES;
use crate::lexer::SyntaxConfig;
use crate::report::ReportStyle;

pub const DEFAULT_ENTRY_POINT: &str = "start";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderTags {
    pub open: String,
    pub close: String,
}

impl Default for PlaceholderTags {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderMode {
    /// Memoize every resolved layer within one render call
    pub fast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub entry_point: String,
    pub placeholder: PlaceholderTags,
    pub escape: char,
    pub mode: RenderMode,
    /// Substitute for layers absent from the data source
    pub missing: Option<Value>,
    pub report: ReportStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            placeholder: PlaceholderTags::default(),
            escape: '\\',
            mode: RenderMode::default(),
            missing: None,
            report: ReportStyle::default(),
        }
    }
}

impl RenderOptions {
    /// Reads a (possibly partial) YAML or JSON options document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let options: RenderOptions = serde_yaml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry_point.is_empty() {
            return Err(ConfigError::EmptyEntryPoint);
        }
        if self.placeholder.open.is_empty() {
            return Err(ConfigError::EmptyTag { which: "open" });
        }
        if self.placeholder.close.is_empty() {
            return Err(ConfigError::EmptyTag { which: "close" });
        }
        if QUOTES.contains(&self.escape) {
            return Err(ConfigError::EscapeIsQuote(self.escape));
        }
        Ok(())
    }

    pub fn syntax(&self) -> SyntaxConfig {
        SyntaxConfig {
            open: self.placeholder.open.clone(),
            close: self.placeholder.close.clone(),
            escape: self.escape,
        }
    }

    pub fn with_entry_point(mut self, entry_point: &str) -> Self {
        self.entry_point = entry_point.to_string();
        self
    }

    pub fn with_tags(mut self, open: &str, close: &str) -> Self {
        self.placeholder = PlaceholderTags {
            open: open.to_string(),
            close: close.to_string(),
        };
        self
    }

    pub fn with_fast_mode(mut self, fast: bool) -> Self {
        self.mode.fast = fast;
        self
    }

    pub fn with_missing(mut self, missing: Value) -> Self {
        self.missing = Some(missing);
        self
    }
}
