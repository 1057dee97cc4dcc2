// ABOUTME: Lexeme arena and the linked lexeme structure produced by the expression lexer
// ABOUTME: Parent/child/argument/sibling links are stable indices into the owning arena

use std::ops::Range;

/// Stable handle of a lexeme inside a [`LexemeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LexemeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeType {
    /// Bare identifier, or a raw-quoted literal after it was closed
    Plain,
    /// `'...'` or `"..."` literal
    Quoted,
    /// Digits following `^`
    RelativeIndex,
    /// Literal layer text between placeholders
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Plain,
    ArrayElement,
    Function,
    FunctionArgument,
    AncestorReference,
}

/// How a lexeme was attached to its neighbours when it was linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertRole {
    Root,
    Sibling,
    FirstArg,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub value: String,
    pub lexeme_type: LexemeType,
    pub kind: LexemeKind,
    pub role: InsertRole,
    /// Quote character that opened a quoted literal
    pub quote: Option<char>,
    /// Byte range inside the layer text
    pub span: Range<usize>,
    pub child: Option<LexemeId>,
    pub first_arg: Option<LexemeId>,
    pub next: Option<LexemeId>,
    pub parent: Option<LexemeId>,
    pub prev: Option<LexemeId>,
}

impl Lexeme {
    pub fn new(lexeme_type: LexemeType, role: InsertRole, start: usize) -> Self {
        Self {
            value: String::new(),
            lexeme_type,
            kind: LexemeKind::Plain,
            role,
            quote: None,
            span: start..start,
            child: None,
            first_arg: None,
            next: None,
            parent: None,
            prev: None,
        }
    }

    pub fn text(value: &str, span: Range<usize>) -> Self {
        Self {
            value: value.to_string(),
            span,
            ..Self::new(LexemeType::Text, InsertRole::Root, 0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Owner of every lexeme produced while scanning one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexemeArena {
    lexemes: Vec<Lexeme>,
}

impl LexemeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, lexeme: Lexeme) -> LexemeId {
        self.lexemes.push(lexeme);
        LexemeId(self.lexemes.len() - 1)
    }

    pub fn get(&self, id: LexemeId) -> &Lexeme {
        &self.lexemes[id.0]
    }

    pub fn get_mut(&mut self, id: LexemeId) -> &mut Lexeme {
        &mut self.lexemes[id.0]
    }

    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    pub fn attach_child(&mut self, parent: LexemeId, child: LexemeId) {
        self.lexemes[parent.0].child = Some(child);
        let lexeme = &mut self.lexemes[child.0];
        lexeme.parent = Some(parent);
        lexeme.role = InsertRole::Child;
    }

    pub fn attach_first_arg(&mut self, function: LexemeId, arg: LexemeId) {
        let owner = &mut self.lexemes[function.0];
        owner.first_arg = Some(arg);
        owner.kind = LexemeKind::Function;
        let lexeme = &mut self.lexemes[arg.0];
        lexeme.parent = Some(function);
        lexeme.role = InsertRole::FirstArg;
        if lexeme.kind == LexemeKind::Plain {
            lexeme.kind = LexemeKind::FunctionArgument;
        }
    }

    pub fn attach_next(&mut self, prev: LexemeId, next: LexemeId) {
        self.lexemes[prev.0].next = Some(next);
        let parent = self.lexemes[prev.0].parent;
        let lexeme = &mut self.lexemes[next.0];
        lexeme.prev = Some(prev);
        lexeme.parent = parent;
        lexeme.role = InsertRole::Sibling;
    }

    /// Follows `child` links down to the innermost lexeme of a path.
    pub fn deepest(&self, id: LexemeId) -> LexemeId {
        let mut current = id;
        while let Some(child) = self.lexemes[current.0].child {
            current = child;
        }
        current
    }

    /// Iterates a sibling chain starting at `id`.
    pub fn siblings(&self, id: LexemeId) -> impl Iterator<Item = LexemeId> + '_ {
        std::iter::successors(Some(id), move |current| self.lexemes[current.0].next)
    }

    /// Values along the `child` links, starting at `id`.
    pub fn path(&self, id: LexemeId) -> Vec<&str> {
        std::iter::successors(Some(id), |current| self.lexemes[current.0].child)
            .map(|current| self.lexemes[current.0].value.as_str())
            .collect()
    }

    /// Canonical textual form of the expression rooted at `id`.
    pub fn expression(&self, id: LexemeId) -> String {
        let mut out = String::new();
        self.write_expression(id, &mut out);
        out
    }

    fn write_expression(&self, id: LexemeId, out: &mut String) {
        self.write_head(id, out);
        self.write_tail(id, out);
    }

    fn write_head(&self, id: LexemeId, out: &mut String) {
        let lexeme = &self.lexemes[id.0];
        match (lexeme.lexeme_type, lexeme.quote) {
            (LexemeType::RelativeIndex, _) => {
                out.push('^');
                out.push_str(&lexeme.value);
            }
            (_, Some(quote)) => {
                out.push(quote);
                out.push_str(&lexeme.value);
                out.push(quote);
            }
            _ => out.push_str(&lexeme.value),
        }

        if lexeme.kind == LexemeKind::Function {
            out.push('(');
            if let Some(first) = lexeme.first_arg {
                let args: Vec<String> = self
                    .siblings(first)
                    .map(|arg| self.expression(arg))
                    .collect();
                out.push_str(&args.join(", "));
            }
            out.push(')');
        }
    }

    fn write_tail(&self, id: LexemeId, out: &mut String) {
        if let Some(child) = self.lexemes[id.0].child {
            if self.lexemes[child.0].kind == LexemeKind::ArrayElement {
                out.push('[');
                self.write_head(child, out);
                out.push(']');
            } else {
                out.push('.');
                self.write_head(child, out);
            }
            self.write_tail(child, out);
        }
    }
}
