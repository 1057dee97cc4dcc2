// ABOUTME: Classifies the root lexemes of a placeholder into an operator directive
// ABOUTME: Keywords are matched case-insensitively; anything else is an implicit insert

use std::cmp::Ordering;
use std::fmt;

use crate::lexer::{LexemeArena, LexemeId, LexemeKind, LexemeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Insert,
    If,
    Unless,
    Else,
    End,
    Comment,
}

impl Operator {
    const KEYWORDS: [(&'static str, Operator); 6] = [
        ("=", Operator::Insert),
        ("if", Operator::If),
        ("unless", Operator::Unless),
        ("else", Operator::Else),
        ("end", Operator::End),
        ("#", Operator::Comment),
    ];

    pub fn from_keyword(word: &str) -> Option<Self> {
        let lowered = word.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == lowered)
            .map(|(_, operator)| *operator)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Operator::Insert => "=",
            Operator::If => "if",
            Operator::Unless => "unless",
            Operator::Else => "else",
            Operator::End => "end",
            Operator::Comment => "#",
        }
    }

    /// Number of root lexemes a placeholder with this operator must contain.
    pub fn expected_parts(self) -> usize {
        match self {
            Operator::Insert | Operator::If | Operator::Unless => 2,
            Operator::Else | Operator::End | Operator::Comment => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub operator: Operator,
    /// False when the operator was implied (a bare `{{name}}` insert)
    pub explicit: bool,
    /// Root lexemes counted as parts, the implied operator included
    pub parts: usize,
    pub target: Option<LexemeId>,
}

impl Directive {
    pub fn classify(arena: &LexemeArena, roots: &[LexemeId]) -> Option<Self> {
        let first = *roots.first()?;

        match keyword_of(arena, first) {
            Some(operator) => Some(Self {
                operator,
                explicit: true,
                parts: roots.len(),
                target: roots.get(1).copied(),
            }),
            None => Some(Self {
                operator: Operator::Insert,
                explicit: false,
                parts: roots.len() + 1,
                target: Some(first),
            }),
        }
    }

    /// `Less` for too few parts, `Greater` for too many.
    pub fn arity(&self) -> Ordering {
        self.parts.cmp(&self.operator.expected_parts())
    }

    /// Name of the layer the target path points at.
    pub fn target_name<'a>(&self, arena: &'a LexemeArena) -> Option<&'a str> {
        self.target.map(|id| arena.get(id).value.as_str())
    }
}

/// Operator named by a bare keyword lexeme such as `=` or `if`.
pub(crate) fn keyword_of(arena: &LexemeArena, id: LexemeId) -> Option<Operator> {
    let lexeme = arena.get(id);
    let bare = lexeme.lexeme_type == LexemeType::Plain
        && lexeme.quote.is_none()
        && lexeme.kind == LexemeKind::Plain
        && lexeme.child.is_none();
    if bare {
        Operator::from_keyword(&lexeme.value)
    } else {
        None
    }
}
