// ABOUTME: Error types for placeholder lexing and control tree construction
// ABOUTME: Syntax errors are accumulated per layer and raised together as one SyntaxReport

use thiserror::Error;

use crate::report::{ErrorReport, ReportEntry, ReportStyle};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    #[error("Unbalanced brackets")]
    UnbalancedBrackets,

    #[error("Unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("Two delimiters in a row")]
    TwoDelimitersInRow,

    #[error("Blank between nested lexemes")]
    BlankBetweenNestedLexemes,

    #[error("Delimiter without preceding lexeme")]
    DelimiterWithoutLexeme,

    #[error("Comma not in arguments")]
    CommaNotInArguments,

    #[error("Missing delimiter")]
    MissingDelimiter,

    #[error("Dangling delimiter")]
    DanglingDelimiter,

    #[error("Unexpected symbol")]
    UnexpectedSymbol,

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Empty string")]
    EmptyString,

    #[error("Invalid ancestor reference")]
    InvalidAncestorReference,

    #[error("Unterminated placeholder")]
    UnterminatedPlaceholder,

    #[error("Empty placeholder")]
    EmptyPlaceholder,

    #[error("Two else in a row")]
    TwoElseInRow,

    #[error("Broken control sequence")]
    BrokenControlSequence,

    #[error("Unclosed operators")]
    UnclosedOperators,

    #[error("Internal parser error")]
    InternalParserError,
}

/// One grammar or structural mistake found while parsing a layer.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}", describe_placeholder(.placeholder))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub placeholder: Option<String>,
    /// Byte offset relative to the start of the placeholder
    pub position: Option<usize>,
    pub symbol: Option<char>,
    pub detail: Option<String>,
}

fn describe_placeholder(placeholder: &Option<String>) -> String {
    match placeholder {
        Some(entry) => format!(" in {}", entry),
        None => String::new(),
    }
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            placeholder: None,
            position: None,
            symbol: None,
            detail: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn to_entry(&self) -> ReportEntry {
        let mut entry = ReportEntry::new(self.kind.to_string());
        if let Some(ref placeholder) = self.placeholder {
            entry = entry.field("placeholder", placeholder);
        }
        if let Some(symbol) = self.symbol {
            entry = entry.field("symbol", format!("\"{}\"", symbol));
        }
        if let Some(position) = self.position {
            entry = entry.field("position", position.to_string());
        }
        if let Some(ref detail) = self.detail {
            entry = entry.field("details", detail);
        }
        entry
    }
}

/// Every syntax error of one layer, pre-formatted as a single report.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{rendered}")]
pub struct SyntaxReport {
    layer: String,
    errors: Vec<SyntaxError>,
    rendered: String,
}

impl SyntaxReport {
    pub fn new(layer: &str, errors: Vec<SyntaxError>, style: &ReportStyle) -> Self {
        let mut report = ErrorReport::for_layer(layer);
        for error in &errors {
            report.push(error.to_entry());
        }

        Self {
            layer: layer.to_string(),
            rendered: report.render(style),
            errors,
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn contains(&self, kind: SyntaxErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

pub type Result<T> = std::result::Result<T, SyntaxReport>;
