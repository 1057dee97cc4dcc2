// ABOUTME: Parser module turning scanned layers into control trees
// ABOUTME: Exports directive classification, the tree builder and syntax error types

pub mod directive;
pub mod error;
pub mod layer;
pub mod tree;

pub use directive::{Directive, Operator};
pub use error::{SyntaxError, SyntaxErrorKind, SyntaxReport};
pub use layer::{parse_layer, ParsedLayer};
pub use tree::{
    BlockId, BranchStatus, Conditional, ControlBlock, ControlNode, ControlTree, NodeId, NodeKind,
    TreeBuilder,
};
