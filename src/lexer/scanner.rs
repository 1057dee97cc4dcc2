// ABOUTME: Splits layer text into literal text segments and placeholder segments
// ABOUTME: Feeds placeholder bodies to the expression lexer and gathers their errors

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::expression::ExpressionLexer;
use super::lexeme::{Lexeme, LexemeArena, LexemeId};
use crate::parser::directive::Directive;
use crate::parser::error::{SyntaxError, SyntaxErrorKind};

/// Characters of an unterminated placeholder quoted in its error.
const UNTERMINATED_CONTEXT: usize = 16;

/// Placeholder tags and the escape character used inside quoted literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntaxConfig {
    pub open: String,
    pub close: String,
    pub escape: char,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
            escape: '\\',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSegment {
    /// Source text of the placeholder including its tags
    pub entry: String,
    pub span: Range<usize>,
    pub roots: Vec<LexemeId>,
    pub comment: Option<String>,
    pub terminated: bool,
    /// Filled in by the parser once the root lexemes are classified
    pub directive: Option<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(LexemeId),
    Placeholder(PlaceholderSegment),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedLayer {
    pub arena: LexemeArena,
    pub segments: Vec<Segment>,
    pub errors: Vec<SyntaxError>,
}

pub fn scan_layer(text: &str, syntax: &SyntaxConfig) -> ScannedLayer {
    let mut arena = LexemeArena::new();
    let mut segments = Vec::new();
    let mut errors = Vec::new();
    let mut text_start = 0;
    let mut position = 0;

    while position < text.len() {
        if !text[position..].starts_with(syntax.open.as_str()) {
            position += char_len_at(text, position);
            continue;
        }

        push_text(&mut arena, &mut segments, text, text_start..position);
        let start = position;
        position += syntax.open.len();

        let mut lexer = ExpressionLexer::new(&mut arena, syntax.escape);
        let mut closed = false;
        while position < text.len() {
            if !lexer.in_literal() && text[position..].starts_with(syntax.close.as_str()) {
                closed = true;
                break;
            }
            let Some(ch) = text[position..].chars().next() else {
                break;
            };
            lexer.feed(ch, position);
            position += ch.len_utf8();
        }

        let segment = if closed {
            let expression = lexer.finish(position);
            position += syntax.close.len();
            let entry = &text[start..position];
            errors.extend(
                expression
                    .issues
                    .iter()
                    .map(|issue| issue.to_error(entry, start)),
            );
            PlaceholderSegment {
                entry: entry.to_string(),
                span: start..position,
                roots: expression.roots,
                comment: expression.comment,
                terminated: true,
                directive: None,
            }
        } else {
            let expression = lexer.abandon();
            let excerpt: String = text[start..].chars().take(UNTERMINATED_CONTEXT).collect();
            let entry = format!("{}...", excerpt);
            errors.extend(
                expression
                    .issues
                    .iter()
                    .map(|issue| issue.to_error(&entry, start)),
            );
            errors.push(
                SyntaxError::new(SyntaxErrorKind::UnterminatedPlaceholder)
                    .with_placeholder(entry.clone())
                    .with_detail(format!("\"{}\" is never closed", syntax.open)),
            );
            PlaceholderSegment {
                entry,
                span: start..text.len(),
                roots: expression.roots,
                comment: expression.comment,
                terminated: false,
                directive: None,
            }
        };

        segments.push(Segment::Placeholder(segment));
        text_start = position;
    }

    push_text(&mut arena, &mut segments, text, text_start..text.len());

    ScannedLayer {
        arena,
        segments,
        errors,
    }
}

fn push_text(
    arena: &mut LexemeArena,
    segments: &mut Vec<Segment>,
    text: &str,
    span: Range<usize>,
) {
    if span.is_empty() {
        return;
    }
    let id = arena.alloc(Lexeme::text(&text[span.clone()], span));
    segments.push(Segment::Text(id));
}

fn char_len_at(text: &str, position: usize) -> usize {
    text[position..]
        .chars()
        .next()
        .map(char::len_utf8)
        .unwrap_or(1)
}
