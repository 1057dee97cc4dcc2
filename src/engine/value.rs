// ABOUTME: Result of resolving one layer: rendered text, a pass-through data leaf, or nothing
// ABOUTME: Defines the truthiness used by conditionals and the text form used by inserts

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    /// Non-string value passed through unprocessed
    Data(Value),
    /// Layer absent from the data source with no substitute configured
    Absent,
}

impl Rendered {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Rendered::Text(text),
            other => Rendered::Data(other),
        }
    }

    /// Absent, null, false, zero and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Rendered::Text(text) => !text.is_empty(),
            Rendered::Absent => false,
            Rendered::Data(value) => match value {
                Value::Null => false,
                Value::Bool(flag) => *flag,
                Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
                Value::String(text) => !text.is_empty(),
                Value::Array(_) | Value::Object(_) => true,
            },
        }
    }

    /// Text inserted in place of a placeholder.
    pub fn to_text(&self) -> String {
        match self {
            Rendered::Text(text) => text.clone(),
            Rendered::Absent => String::new(),
            Rendered::Data(Value::Null) => String::new(),
            Rendered::Data(Value::String(text)) => text.clone(),
            Rendered::Data(value) => value.to_string(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Rendered::Text(text) => text,
            other => other.to_text(),
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Rendered {
    fn from(text: &str) -> Self {
        Rendered::Text(text.to_string())
    }
}
