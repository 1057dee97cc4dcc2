// ABOUTME: Control tree of nested blocks built from a layer's text and placeholder segments
// ABOUTME: TreeBuilder is passed by value through each step and accumulates structural errors

use std::fmt::Write as _;

use super::directive::{Directive, Operator};
use super::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{LexemeArena, LexemeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// Collecting the initially active branch
    Then,
    /// Collecting the branch after `else`
    Else,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    /// True for `unless`
    pub invert: bool,
    pub target: Option<LexemeId>,
    pub true_path: BlockId,
    pub false_path: BlockId,
    pub status: BranchStatus,
}

impl Conditional {
    /// Block that receives nodes in the current status.
    pub fn active_path(&self) -> BlockId {
        match (self.status, self.invert) {
            (BranchStatus::Then, false) | (BranchStatus::Else, true) => self.true_path,
            _ => self.false_path,
        }
    }

    fn enter_else(&mut self) -> Result<BlockId, SyntaxErrorKind> {
        match self.status {
            BranchStatus::Then => {
                self.status = BranchStatus::Else;
                Ok(self.active_path())
            }
            BranchStatus::Else => Err(SyntaxErrorKind::TwoElseInRow),
            BranchStatus::Closed => Err(SyntaxErrorKind::InternalParserError),
        }
    }

    fn close(&mut self) -> Result<(), SyntaxErrorKind> {
        match self.status {
            BranchStatus::Closed => Err(SyntaxErrorKind::InternalParserError),
            _ => {
                self.status = BranchStatus::Closed;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Text(LexemeId),
    Insert { target: Option<LexemeId> },
    Conditional(Conditional),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlNode {
    pub kind: NodeKind,
    /// Block holding this node
    pub block: BlockId,
    /// Placeholder source text, empty for text nodes
    pub entry: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlBlock {
    pub nodes: Vec<NodeId>,
    /// Conditional that opened this block, `None` for the root
    pub opener: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlTree {
    nodes: Vec<ControlNode>,
    blocks: Vec<ControlBlock>,
}

impl Default for ControlTree {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            blocks: vec![ControlBlock::default()],
        }
    }
}

impl ControlTree {
    pub fn root(&self) -> BlockId {
        BlockId(0)
    }

    pub fn node(&self, id: NodeId) -> &ControlNode {
        &self.nodes[id.0]
    }

    pub fn block(&self, id: BlockId) -> &ControlBlock {
        &self.blocks[id.0]
    }

    pub fn nodes_in(&self, id: BlockId) -> impl Iterator<Item = &ControlNode> + '_ {
        self.blocks[id.0].nodes.iter().map(move |node| &self.nodes[node.0])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Indented description of every block, used by the `tree` command.
    pub fn outline(&self, arena: &LexemeArena) -> String {
        let mut out = String::new();
        self.write_block(self.root(), arena, 0, &mut out);
        out
    }

    fn write_block(&self, block: BlockId, arena: &LexemeArena, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        for node in self.nodes_in(block) {
            match &node.kind {
                NodeKind::Text(id) => {
                    let _ = writeln!(out, "{}text {}", pad, preview(&arena.get(*id).value));
                }
                NodeKind::Insert { target } => {
                    let _ = writeln!(out, "{}insert {}", pad, describe(arena, *target));
                }
                NodeKind::Conditional(conditional) => {
                    let operator = if conditional.invert { "unless" } else { "if" };
                    let _ = writeln!(
                        out,
                        "{}{} {}",
                        pad,
                        operator,
                        describe(arena, conditional.target)
                    );
                    let _ = writeln!(out, "{}  true:", pad);
                    self.write_block(conditional.true_path, arena, depth + 2, out);
                    let _ = writeln!(out, "{}  false:", pad);
                    self.write_block(conditional.false_path, arena, depth + 2, out);
                }
            }
        }
    }

    fn new_block(&mut self, opener: NodeId) -> BlockId {
        self.blocks.push(ControlBlock {
            nodes: Vec::new(),
            opener: Some(opener),
        });
        BlockId(self.blocks.len() - 1)
    }

    fn push_node(&mut self, block: BlockId, kind: NodeKind, entry: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ControlNode {
            kind,
            block,
            entry: entry.to_string(),
        });
        self.blocks[block.0].nodes.push(id);
        id
    }

    fn conditional_mut(&mut self, id: NodeId) -> Option<&mut Conditional> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Conditional(conditional) => Some(conditional),
            _ => None,
        }
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 40;
    let escaped: String = text.escape_debug().collect();
    if escaped.chars().count() > LIMIT {
        let cut: String = escaped.chars().take(LIMIT).collect();
        format!("\"{}...\"", cut)
    } else {
        format!("\"{}\"", escaped)
    }
}

fn describe(arena: &LexemeArena, target: Option<LexemeId>) -> String {
    target
        .map(|id| arena.expression(id))
        .unwrap_or_else(|| "<none>".to_string())
}

/// Builder state threaded by value through every placeholder of a layer.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    tree: ControlTree,
    cursor: Option<BlockId>,
    open: Vec<NodeId>,
    errors: Vec<SyntaxError>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> BlockId {
        self.cursor.unwrap_or_else(|| self.tree.root())
    }

    pub fn add_text(mut self, text: LexemeId) -> Self {
        let block = self.current();
        self.tree.push_node(block, NodeKind::Text(text), "");
        self
    }

    pub fn add_directive(mut self, directive: &Directive, entry: &str) -> Self {
        match directive.operator {
            Operator::Insert => {
                let block = self.current();
                self.tree.push_node(
                    block,
                    NodeKind::Insert {
                        target: directive.target,
                    },
                    entry,
                );
            }
            Operator::If | Operator::Unless => self.open_conditional(directive, entry),
            Operator::Else => self.switch_branch(entry),
            Operator::End => self.close_conditional(entry),
            Operator::Comment => {}
        }
        self
    }

    /// Reports conditionals still open and hands back the finished tree.
    pub fn finish(mut self) -> (ControlTree, Vec<SyntaxError>) {
        if !self.open.is_empty() {
            let unclosed: Vec<&str> = self
                .open
                .iter()
                .map(|id| self.tree.node(*id).entry.as_str())
                .collect();
            let detail = format!("Unclosed statements detected: ... {} ...", unclosed.join(" ... "));
            self.errors
                .push(SyntaxError::new(SyntaxErrorKind::UnclosedOperators).with_detail(detail));
        }
        (self.tree, self.errors)
    }

    fn open_conditional(&mut self, directive: &Directive, entry: &str) {
        let block = self.current();
        let invert = directive.operator == Operator::Unless;

        let node = NodeId(self.tree.nodes.len());
        let true_path = self.tree.new_block(node);
        let false_path = self.tree.new_block(node);
        let conditional = Conditional {
            invert,
            target: directive.target,
            true_path,
            false_path,
            status: BranchStatus::Then,
        };
        let cursor = conditional.active_path();
        self.tree
            .push_node(block, NodeKind::Conditional(conditional), entry);

        self.cursor = Some(cursor);
        self.open.push(node);
    }

    fn switch_branch(&mut self, entry: &str) {
        let Some(&node) = self.open.last() else {
            self.broken_sequence(entry);
            return;
        };

        let result = match self.tree.conditional_mut(node) {
            Some(conditional) => conditional.enter_else(),
            None => Err(SyntaxErrorKind::InternalParserError),
        };
        match result {
            Ok(path) => self.cursor = Some(path),
            Err(kind) => {
                let opener = self.tree.node(node).entry.clone();
                self.errors.push(
                    SyntaxError::new(kind)
                        .with_placeholder(entry)
                        .with_detail(format!("\"{}\" already has an else branch", opener)),
                );
            }
        }
    }

    fn close_conditional(&mut self, entry: &str) {
        let Some(node) = self.open.pop() else {
            self.broken_sequence(entry);
            return;
        };

        let result = match self.tree.conditional_mut(node) {
            Some(conditional) => conditional.close(),
            None => Err(SyntaxErrorKind::InternalParserError),
        };
        if let Err(kind) = result {
            self.errors
                .push(SyntaxError::new(kind).with_placeholder(entry));
        }

        let parent = self.tree.node(node).block;
        self.cursor = Some(parent);
    }

    fn broken_sequence(&mut self, entry: &str) {
        self.errors.push(
            SyntaxError::new(SyntaxErrorKind::BrokenControlSequence)
                .with_placeholder(entry)
                .with_detail(format!(
                    "The \"{}\" placeholder is not preceded by \"if\" or \"unless\"",
                    entry
                )),
        );
    }
}
