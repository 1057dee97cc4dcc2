// ABOUTME: Builds human-readable error reports from one or many accumulated errors
// ABOUTME: Each line is word-wrapped with textwrap and indented according to the ReportStyle

use std::borrow::Cow;

use super::style::ReportStyle;

/// A single named error with its key/value fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl ReportEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    layer: Option<String>,
    entries: Vec<ReportEntry>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_layer(layer: &str) -> Self {
        Self {
            layer: Some(layer.to_string()),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn with_entry(mut self, entry: ReportEntry) -> Self {
        self.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the report: header, layer line, then every entry and its fields.
    pub fn render(&self, style: &ReportStyle) -> String {
        let count = self.entries.len();
        let mut lines = vec![format!(
            "{}: {} error{} found",
            style.header,
            count,
            if count == 1 { "" } else { "s" }
        )];

        if let Some(ref layer) = self.layer {
            lines.extend(wrap_line(
                &format!("Layer: \"{}\"", layer),
                style.width,
                "",
                &style.indent,
            ));
        }

        for entry in &self.entries {
            lines.extend(wrap_line(
                &format!("Error: {}", entry.name),
                style.width,
                "",
                &style.indent,
            ));
            for (key, value) in &entry.fields {
                lines.extend(wrap_line(
                    &format!("{}: {}", key, value),
                    style.width,
                    &style.indent,
                    &style.continuation,
                ));
            }
        }

        lines.join(&style.separator)
    }
}

fn wrap_line(text: &str, width: usize, initial: &str, subsequent: &str) -> Vec<String> {
    let options = textwrap::Options::new(width.max(1))
        .initial_indent(initial)
        .subsequent_indent(subsequent);

    textwrap::wrap(text, &options)
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}
