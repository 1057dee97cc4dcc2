// ABOUTME: Parses one layer's text into segments and a validated control tree
// ABOUTME: A layer is either fully valid or rejected with every error it contains

use tracing::{debug, warn};

use super::directive::Directive;
use super::error::{Result, SyntaxReport};
use super::tree::{ControlTree, TreeBuilder};
use crate::lexer::{scan_layer, LexemeArena, PlaceholderSegment, ScannedLayer, Segment, SyntaxConfig};
use crate::report::ReportStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLayer {
    pub name: String,
    pub arena: LexemeArena,
    pub segments: Vec<Segment>,
    pub tree: ControlTree,
}

impl ParsedLayer {
    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderSegment> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(placeholder) => Some(placeholder),
            Segment::Text(_) => None,
        })
    }

    pub fn target_name(&self, directive: &Directive) -> Option<&str> {
        directive.target_name(&self.arena)
    }

    /// Names of every layer this layer refers to, in source order.
    pub fn references(&self) -> Vec<&str> {
        self.placeholders()
            .filter_map(|placeholder| placeholder.directive.as_ref())
            .filter(|directive| directive.operator.expected_parts() == 2)
            .filter_map(|directive| self.target_name(directive))
            .collect()
    }
}

pub fn parse_layer(
    name: &str,
    text: &str,
    syntax: &SyntaxConfig,
    style: &ReportStyle,
) -> Result<ParsedLayer> {
    let ScannedLayer {
        arena,
        mut segments,
        mut errors,
    } = scan_layer(text, syntax);

    let mut builder = TreeBuilder::new();
    for segment in segments.iter_mut() {
        builder = match segment {
            Segment::Text(id) => builder.add_text(*id),
            Segment::Placeholder(placeholder) => {
                placeholder.directive = Directive::classify(&arena, &placeholder.roots);
                match placeholder.directive {
                    Some(ref directive) if placeholder.terminated => {
                        builder.add_directive(directive, &placeholder.entry)
                    }
                    _ => builder,
                }
            }
        };
    }

    let (tree, structural) = builder.finish();
    errors.extend(structural);

    if !errors.is_empty() {
        warn!("Layer '{}' has {} syntax error(s)", name, errors.len());
        return Err(SyntaxReport::new(name, errors, style));
    }

    debug!(
        "Parsed layer '{}': {} segments, {} control nodes",
        name,
        segments.len(),
        tree.node_count()
    );

    Ok(ParsedLayer {
        name: name.to_string(),
        arena,
        segments,
        tree,
    })
}
