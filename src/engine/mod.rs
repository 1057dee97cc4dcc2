// ABOUTME: Layer render engine module for layercake
// ABOUTME: Handles data sources, getters, options, visibility tracking and recursive layer resolution

pub mod error;
pub mod getter;
pub mod options;
pub mod renderer;
pub mod source;
pub mod state;
pub mod value;
pub mod visibility;

pub use error::{ConfigError, RenderError, Result};
pub use getter::{FnGetter, Getter, GetterCall, GetterSet};
pub use options::{PlaceholderTags, RenderMode, RenderOptions, DEFAULT_ENTRY_POINT};
pub use renderer::{render, Renderer};
pub use source::{DataSource, Entry, LayerKey, PatternSource};
pub use state::RenderState;
pub use value::Rendered;
pub use visibility::{Frame, VisibilityStack};
