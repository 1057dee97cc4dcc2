// ABOUTME: Error types for layer resolution and render option validation
// ABOUTME: Resolution errors are raised at the point of detection and abort the render call

use thiserror::Error;

use crate::parser::SyntaxReport;
use crate::report::{ErrorReport, ReportEntry, ReportStyle};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Entry point name must not be empty")]
    EmptyEntryPoint,

    #[error("Placeholder {which} tag must not be empty")]
    EmptyTag { which: &'static str },

    #[error("Escape character {0:?} must not be a quote character")]
    EscapeIsQuote(char),

    #[error("Invalid render options: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Missing entry point: no layer named \"{name}\"")]
    MissingEntryPoint { name: String },

    #[error("Cyclic dependence: {}", .chain.join(" -> "))]
    CyclicDependence { chain: Vec<String> },

    #[error("Too few parts: {excerpt}")]
    TooFewParts { layer: String, excerpt: String },

    #[error("Too many parts: {excerpt}")]
    TooManyParts { layer: String, excerpt: String },

    #[error("Broken control sequence in layer \"{layer}\": {details}")]
    BrokenControlSequence {
        layer: String,
        placeholder: String,
        details: String,
    },

    #[error("Two else in a row in layer \"{layer}\": {placeholder}")]
    TwoElseInRow { layer: String, placeholder: String },

    #[error("Unclosed operators in layer \"{layer}\": {}", .placeholders.join(" ... "))]
    UnclosedOperators {
        layer: String,
        placeholders: Vec<String>,
    },

    #[error("Getter for layer \"{name}\" failed: {source}")]
    Getter {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxReport),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RenderError {
    pub fn name(&self) -> &'static str {
        match self {
            RenderError::MissingEntryPoint { .. } => "Missing entry point",
            RenderError::CyclicDependence { .. } => "Cyclic dependence",
            RenderError::TooFewParts { .. } => "Too few parts",
            RenderError::TooManyParts { .. } => "Too many parts",
            RenderError::BrokenControlSequence { .. } => "Broken control sequence",
            RenderError::TwoElseInRow { .. } => "Two else in a row",
            RenderError::UnclosedOperators { .. } => "Unclosed operators",
            RenderError::Getter { .. } => "Getter failed",
            RenderError::Syntax(_) => "Syntax error",
            RenderError::Config(_) => "Invalid options",
        }
    }

    /// Formats the error the same way syntax reports are formatted.
    pub fn report(&self, style: &ReportStyle) -> String {
        let (layer, entry) = match self {
            RenderError::Syntax(report) => return report.to_string(),
            RenderError::MissingEntryPoint { name } => {
                (None, ReportEntry::new(self.name()).field("entry point", name))
            }
            RenderError::CyclicDependence { chain } => (
                chain.first().cloned(),
                ReportEntry::new(self.name()).field("chain", chain.join(" -> ")),
            ),
            RenderError::TooFewParts { layer, excerpt }
            | RenderError::TooManyParts { layer, excerpt } => (
                Some(layer.clone()),
                ReportEntry::new(self.name()).field("details", excerpt),
            ),
            RenderError::BrokenControlSequence {
                layer,
                placeholder,
                details,
            } => (
                Some(layer.clone()),
                ReportEntry::new(self.name())
                    .field("placeholder", placeholder)
                    .field("details", details),
            ),
            RenderError::TwoElseInRow { layer, placeholder } => (
                Some(layer.clone()),
                ReportEntry::new(self.name()).field("placeholder", placeholder),
            ),
            RenderError::UnclosedOperators {
                layer,
                placeholders,
            } => (
                Some(layer.clone()),
                ReportEntry::new(self.name()).field("placeholders", placeholders.join(" ... ")),
            ),
            RenderError::Getter { name, source } => (
                Some(name.clone()),
                ReportEntry::new(self.name()).field("details", format!("{:#}", source)),
            ),
            RenderError::Config(error) => {
                (None, ReportEntry::new(self.name()).field("details", error.to_string()))
            }
        };

        let report = match layer {
            Some(layer) => ErrorReport::for_layer(&layer),
            None => ErrorReport::new(),
        };
        report.with_entry(entry).render(style)
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
