// ABOUTME: Lexing module for layer text and placeholder expressions
// ABOUTME: Produces an arena of linked lexemes plus the text/placeholder segment list

pub mod expression;
pub mod lexeme;
pub mod scanner;

pub use expression::{lex_expression, Expression, ExpressionLexer, LexIssue};
pub use lexeme::{InsertRole, Lexeme, LexemeArena, LexemeId, LexemeKind, LexemeType};
pub use scanner::{scan_layer, PlaceholderSegment, ScannedLayer, Segment, SyntaxConfig};
