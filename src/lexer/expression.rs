// ABOUTME: Character-driven state machine that turns a placeholder body into linked lexemes
// ABOUTME: Records every grammar violation it meets instead of stopping at the first one

use super::lexeme::{InsertRole, Lexeme, LexemeArena, LexemeId, LexemeKind, LexemeType};
use crate::parser::directive::keyword_of;
use crate::parser::error::{SyntaxError, SyntaxErrorKind};

/// Characters treated as whitespace between lexemes.
pub const BLANKS: &[char] = &[
    ' ', '\u{000C}', '\n', '\r', '\t', '\u{000B}', '\u{00A0}', '\u{1680}', '\u{180E}',
    '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}', '\u{2004}', '\u{2005}', '\u{2006}',
    '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}', '\u{200B}', '\u{2028}', '\u{2029}',
    '\u{202F}', '\u{205F}', '\u{3000}',
];

/// Quote that produces a plain identifier once closed.
pub const RAW_QUOTE: char = '`';
pub const QUOTES: [char; 3] = ['\'', '"', RAW_QUOTE];

const INSERT_SIGN: char = '=';
const COMMENT_SIGN: char = '#';
const CARET: char = '^';

pub fn is_blank(ch: char) -> bool {
    BLANKS.contains(&ch)
}

fn is_lexeme_char(ch: char) -> bool {
    !is_blank(ch)
        && !QUOTES.contains(&ch)
        && !matches!(ch, '.' | ',' | '[' | ']' | '(' | ')' | CARET | COMMENT_SIGN)
}

/// A lexing problem at an absolute byte offset of the layer text.
#[derive(Debug, Clone, PartialEq)]
pub struct LexIssue {
    pub kind: SyntaxErrorKind,
    pub position: usize,
    pub symbol: Option<char>,
    pub detail: Option<String>,
}

impl LexIssue {
    /// Converts to a [`SyntaxError`] positioned relative to the placeholder start.
    pub fn to_error(&self, entry: &str, placeholder_start: usize) -> SyntaxError {
        let mut error = SyntaxError::new(self.kind)
            .with_placeholder(entry)
            .at(self.position.saturating_sub(placeholder_start));
        if let Some(symbol) = self.symbol {
            error = error.with_symbol(symbol);
        }
        if let Some(ref detail) = self.detail {
            error = error.with_detail(detail.clone());
        }
        error
    }
}

/// Outcome of lexing one placeholder body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub roots: Vec<LexemeId>,
    pub comment: Option<String>,
    pub issues: Vec<LexIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Between,
    Bare,
    Quoted { quote: char, escaping: bool },
    Number,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Dot,
    OpenBracket,
    OpenParen,
    Comma,
}

impl Delimiter {
    fn symbol(self) -> char {
        match self {
            Delimiter::Dot => '.',
            Delimiter::OpenBracket => '[',
            Delimiter::OpenParen => '(',
            Delimiter::Comma => ',',
        }
    }
}

/// What separates the previous operand from the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Start,
    Blank,
    Adjacent,
    Delim(Delimiter),
}

#[derive(Debug, Clone, Copy)]
struct Level {
    opener: Option<char>,
    owner: Option<LexemeId>,
    last: Option<LexemeId>,
}

impl Level {
    fn base() -> Self {
        Self {
            opener: None,
            owner: None,
            last: None,
        }
    }
}

pub struct ExpressionLexer<'a> {
    arena: &'a mut LexemeArena,
    escape: char,
    state: State,
    pending: Pending,
    current: Option<LexemeId>,
    levels: Vec<Level>,
    roots: Vec<LexemeId>,
    comment: Option<String>,
    issues: Vec<LexIssue>,
    last_position: usize,
}

impl<'a> ExpressionLexer<'a> {
    pub fn new(arena: &'a mut LexemeArena, escape: char) -> Self {
        Self {
            arena,
            escape,
            state: State::Between,
            pending: Pending::Start,
            current: None,
            levels: vec![Level::base()],
            roots: Vec::new(),
            comment: None,
            issues: Vec::new(),
            last_position: 0,
        }
    }

    /// True while inside a quoted literal, where closing tags are ordinary text.
    pub fn in_literal(&self) -> bool {
        matches!(self.state, State::Quoted { .. })
    }

    pub fn feed(&mut self, ch: char, position: usize) {
        self.last_position = position;
        match self.state {
            State::Quoted { quote, escaping } => self.quoted(ch, position, quote, escaping),
            State::Number => {
                if ch.is_ascii_digit() {
                    self.push_char(ch, position);
                } else {
                    self.end_number(position);
                    self.between(ch, position);
                }
            }
            State::Bare => {
                if is_lexeme_char(ch) {
                    self.push_char(ch, position);
                } else {
                    self.end_operand();
                    self.between(ch, position);
                }
            }
            State::Comment => {
                if let Some(comment) = self.comment.as_mut() {
                    comment.push(ch);
                }
            }
            State::Between => self.between(ch, position),
        }
    }

    /// Completes a placeholder whose closing tag was found at `position`.
    pub fn finish(mut self, position: usize) -> Expression {
        match self.state {
            State::Quoted { .. } => {
                self.issue(SyntaxErrorKind::UnterminatedString, self.last_position, None, None);
                self.end_operand();
            }
            State::Number => self.end_number(position),
            State::Bare => self.end_operand(),
            State::Between | State::Comment => {}
        }

        if let Pending::Delim(delimiter) = self.pending {
            self.issue(
                SyntaxErrorKind::DanglingDelimiter,
                position,
                Some(delimiter.symbol()),
                Some("a delimiter must be followed by a lexeme".to_string()),
            );
        }

        if self.levels.len() > 1 {
            let open: Vec<String> = self.levels[1..]
                .iter()
                .filter_map(|level| level.opener)
                .map(|opener| format!("\"{}\"", opener))
                .collect();
            self.issue(
                SyntaxErrorKind::UnbalancedBrackets,
                position,
                None,
                Some(format!("unclosed {}", open.join(", "))),
            );
        }

        if self.roots.is_empty() && self.comment.is_none() {
            self.issue(SyntaxErrorKind::EmptyPlaceholder, position, None, None);
        }

        Expression {
            roots: self.roots,
            comment: self.comment,
            issues: self.issues,
        }
    }

    /// Completes a placeholder cut off by the end of the layer text.
    pub fn abandon(mut self) -> Expression {
        if self.in_literal() {
            self.issue(SyntaxErrorKind::UnterminatedString, self.last_position, None, None);
        }
        Expression {
            roots: self.roots,
            comment: self.comment,
            issues: self.issues,
        }
    }

    fn between(&mut self, ch: char, position: usize) {
        if is_blank(ch) {
            if self.pending == Pending::Adjacent {
                self.pending = Pending::Blank;
            }
            return;
        }

        match ch {
            INSERT_SIGN if self.pending == Pending::Start => self.operator_sign(ch, position),
            COMMENT_SIGN => {
                if self.pending == Pending::Start {
                    self.operator_sign(ch, position);
                }
                self.comment = Some(String::new());
                self.state = State::Comment;
            }
            '.' => self.open_delimiter(Delimiter::Dot, position),
            '[' => self.open_delimiter(Delimiter::OpenBracket, position),
            '(' => self.open_delimiter(Delimiter::OpenParen, position),
            ',' => self.comma(position),
            ']' | ')' => self.close_delimiter(ch, position),
            CARET => {
                self.begin_operand(LexemeType::RelativeIndex, position);
                self.state = State::Number;
            }
            quote if QUOTES.contains(&quote) => {
                let id = self.begin_operand(LexemeType::Quoted, position);
                let lexeme = self.arena.get_mut(id);
                lexeme.quote = Some(quote);
                lexeme.span.end = position + quote.len_utf8();
                self.state = State::Quoted {
                    quote,
                    escaping: false,
                };
            }
            _ => {
                self.begin_operand(LexemeType::Plain, position);
                self.push_char(ch, position);
                self.state = State::Bare;
            }
        }
    }

    /// `=` or `#` as the first symbol form a lexeme of their own.
    fn operator_sign(&mut self, ch: char, position: usize) {
        self.begin_operand(LexemeType::Plain, position);
        self.push_char(ch, position);
        self.end_operand();
        self.pending = Pending::Blank;
    }

    fn quoted(&mut self, ch: char, position: usize, quote: char, escaping: bool) {
        if escaping {
            self.push_char(ch, position);
            self.state = State::Quoted {
                quote,
                escaping: false,
            };
        } else if ch == self.escape {
            self.state = State::Quoted {
                quote,
                escaping: true,
            };
        } else if ch == quote {
            if let Some(id) = self.current {
                let lexeme = self.arena.get_mut(id);
                lexeme.span.end = position + ch.len_utf8();
                if quote == RAW_QUOTE {
                    lexeme.lexeme_type = LexemeType::Plain;
                }
                let empty = lexeme.is_empty();
                if empty {
                    self.issue(
                        SyntaxErrorKind::EmptyString,
                        position,
                        Some(quote),
                        Some(format!("{}{} is not a valid lexeme", quote, quote)),
                    );
                }
            }
            self.end_operand();
        } else {
            self.push_char(ch, position);
        }
    }

    fn begin_operand(&mut self, lexeme_type: LexemeType, position: usize) -> LexemeId {
        let mut lexeme = Lexeme::new(lexeme_type, InsertRole::Root, position);
        if lexeme_type == LexemeType::RelativeIndex {
            lexeme.kind = LexemeKind::AncestorReference;
            lexeme.span.end = position + CARET.len_utf8();
        }
        let id = self.arena.alloc(lexeme);
        let nested = self.levels.len() > 1;
        let level = self.levels.last().copied().unwrap_or_else(Level::base);

        match self.pending {
            Pending::Start => {
                self.roots.push(id);
                self.set_last(id);
            }
            Pending::Blank | Pending::Adjacent => {
                if self.pending == Pending::Adjacent {
                    self.issue(SyntaxErrorKind::MissingDelimiter, position, None, None);
                } else if nested {
                    self.issue(
                        SyntaxErrorKind::BlankBetweenNestedLexemes,
                        position,
                        None,
                        Some("nested lexemes must be separated by a delimiter".to_string()),
                    );
                }
                if let Some(prev) = level.last {
                    self.arena.attach_next(prev, id);
                }
                if nested {
                    self.mark_argument(id, level.opener);
                } else {
                    self.roots.push(id);
                }
                self.set_last(id);
            }
            Pending::Delim(Delimiter::Dot) => {
                if let Some(anchor) = level.last {
                    let target = self.arena.deepest(anchor);
                    self.arena.attach_child(target, id);
                }
            }
            Pending::Delim(Delimiter::OpenBracket) => {
                if let Some(owner) = level.owner {
                    self.arena.attach_child(owner, id);
                    let lexeme = self.arena.get_mut(id);
                    if lexeme.kind == LexemeKind::Plain {
                        lexeme.kind = LexemeKind::ArrayElement;
                    }
                }
                self.set_last(id);
            }
            Pending::Delim(Delimiter::OpenParen) => {
                if let Some(owner) = level.owner {
                    self.arena.attach_first_arg(owner, id);
                }
                self.set_last(id);
            }
            Pending::Delim(Delimiter::Comma) => {
                if let Some(prev) = level.last {
                    self.arena.attach_next(prev, id);
                }
                self.mark_argument(id, level.opener);
                self.set_last(id);
            }
        }

        self.current = Some(id);
        id
    }

    fn mark_argument(&mut self, id: LexemeId, opener: Option<char>) {
        let lexeme = self.arena.get_mut(id);
        if lexeme.kind == LexemeKind::Plain {
            lexeme.kind = match opener {
                Some('[') => LexemeKind::ArrayElement,
                _ => LexemeKind::FunctionArgument,
            };
        }
    }

    fn set_last(&mut self, id: LexemeId) {
        if let Some(level) = self.levels.last_mut() {
            level.last = Some(id);
        }
    }

    fn open_delimiter(&mut self, delimiter: Delimiter, position: usize) {
        match self.pending {
            Pending::Start => {
                self.issue(
                    SyntaxErrorKind::DelimiterWithoutLexeme,
                    position,
                    Some(delimiter.symbol()),
                    None,
                );
                return;
            }
            Pending::Delim(previous) => {
                self.two_in_row(previous.symbol(), delimiter.symbol(), position);
                return;
            }
            Pending::Blank | Pending::Adjacent => {}
        }

        let Some(anchor) = self.levels.last().and_then(|level| level.last) else {
            self.issue(
                SyntaxErrorKind::DelimiterWithoutLexeme,
                position,
                Some(delimiter.symbol()),
                None,
            );
            return;
        };

        if self.is_operator_anchor(anchor) {
            self.issue(
                SyntaxErrorKind::DelimiterWithoutLexeme,
                position,
                Some(delimiter.symbol()),
                Some(format!(
                    "\"{}\" is an operator and cannot own \"{}\"",
                    self.arena.get(anchor).value,
                    delimiter.symbol()
                )),
            );
            return;
        }

        match delimiter {
            Delimiter::Dot | Delimiter::Comma => {}
            Delimiter::OpenBracket => {
                let owner = self.arena.deepest(anchor);
                self.levels.push(Level {
                    opener: Some('['),
                    owner: Some(owner),
                    last: None,
                });
            }
            Delimiter::OpenParen => {
                let owner = self.arena.deepest(anchor);
                if self.arena.get(owner).kind == LexemeKind::Function {
                    self.issue(
                        SyntaxErrorKind::UnexpectedSymbol,
                        position,
                        Some('('),
                        Some(format!(
                            "\"{}\" already has an argument list",
                            self.arena.get(owner).value
                        )),
                    );
                }
                self.arena.get_mut(owner).kind = LexemeKind::Function;
                self.levels.push(Level {
                    opener: Some('('),
                    owner: Some(owner),
                    last: None,
                });
            }
        }
        self.pending = Pending::Delim(delimiter);
    }

    /// The leading operator of a placeholder, separated from what follows it.
    fn is_operator_anchor(&self, anchor: LexemeId) -> bool {
        self.pending == Pending::Blank
            && self.levels.len() == 1
            && self.roots.len() == 1
            && self.roots[0] == anchor
            && keyword_of(&*self.arena, anchor).is_some()
    }

    fn comma(&mut self, position: usize) {
        match self.pending {
            Pending::Start => {
                self.issue(
                    SyntaxErrorKind::DelimiterWithoutLexeme,
                    position,
                    Some(','),
                    None,
                );
                return;
            }
            Pending::Delim(previous) => {
                self.two_in_row(previous.symbol(), ',', position);
                return;
            }
            Pending::Blank | Pending::Adjacent => {}
        }

        let in_arguments = self
            .levels
            .last()
            .map(|level| level.opener == Some('('))
            .unwrap_or(false);
        if !in_arguments {
            self.issue(
                SyntaxErrorKind::CommaNotInArguments,
                position,
                Some(','),
                Some("commas only separate function arguments".to_string()),
            );
            return;
        }
        self.pending = Pending::Delim(Delimiter::Comma);
    }

    fn close_delimiter(&mut self, ch: char, position: usize) {
        let expected = if ch == ')' { '(' } else { '[' };

        if let Pending::Delim(previous) = self.pending {
            // `f()` is the only delimiter pair allowed back to back
            if !(previous == Delimiter::OpenParen && ch == ')') {
                self.two_in_row(previous.symbol(), ch, position);
            }
        }

        if self.levels.len() == 1 {
            let kind = if ch == ')' {
                SyntaxErrorKind::UnbalancedParenthesis
            } else {
                SyntaxErrorKind::UnbalancedBrackets
            };
            self.issue(
                kind,
                position,
                Some(ch),
                Some(format!("\"{}\" is not preceded by \"{}\"", ch, expected)),
            );
            if self.pending != Pending::Start {
                self.pending = Pending::Adjacent;
            }
            return;
        }

        if let Some(level) = self.levels.pop() {
            if level.opener != Some(expected) {
                self.issue(
                    SyntaxErrorKind::UnbalancedBrackets,
                    position,
                    Some(ch),
                    Some(format!(
                        "\"{}\" is closed by \"{}\"",
                        level.opener.unwrap_or(expected),
                        ch
                    )),
                );
            }
        }
        self.pending = Pending::Adjacent;
    }

    fn two_in_row(&mut self, first: char, second: char, position: usize) {
        self.issue(
            SyntaxErrorKind::TwoDelimitersInRow,
            position,
            Some(second),
            Some(format!("\"{}\" is followed by \"{}\"", first, second)),
        );
    }

    fn push_char(&mut self, ch: char, position: usize) {
        if let Some(id) = self.current {
            let lexeme = self.arena.get_mut(id);
            lexeme.value.push(ch);
            lexeme.span.end = position + ch.len_utf8();
        }
    }

    fn end_number(&mut self, position: usize) {
        let empty = self
            .current
            .map(|id| self.arena.get(id).is_empty())
            .unwrap_or(true);
        if empty {
            self.issue(
                SyntaxErrorKind::InvalidAncestorReference,
                position,
                Some(CARET),
                Some("\"^\" must be followed by digits".to_string()),
            );
        }
        self.end_operand();
    }

    fn end_operand(&mut self) {
        self.current = None;
        self.state = State::Between;
        self.pending = Pending::Adjacent;
    }

    fn issue(
        &mut self,
        kind: SyntaxErrorKind,
        position: usize,
        symbol: Option<char>,
        detail: Option<String>,
    ) {
        self.issues.push(LexIssue {
            kind,
            position,
            symbol,
            detail,
        });
    }
}

/// Lexes a standalone placeholder body.
pub fn lex_expression(body: &str, escape: char) -> (LexemeArena, Expression) {
    let mut arena = LexemeArena::new();
    let expression = {
        let mut lexer = ExpressionLexer::new(&mut arena, escape);
        for (position, ch) in body.char_indices() {
            lexer.feed(ch, position);
        }
        lexer.finish(body.len())
    };
    (arena, expression)
}
