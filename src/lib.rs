// ABOUTME: Main library module for the layercake template composition engine
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod report;

// Re-export commonly used types
pub use engine::{
    render, DataSource, FnGetter, Getter, GetterCall, GetterSet, LayerKey, PatternSource,
    RenderError, RenderOptions, Rendered, Renderer,
};
pub use parser::{parse_layer, ParsedLayer, SyntaxErrorKind, SyntaxReport};
pub use report::ReportStyle;

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
