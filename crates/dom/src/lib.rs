//! Node tree collaborator for the selection core.
//!
//! The selection and transition layers only talk to a tree through
//! [`NodeTree`]. [`Document`] is the in-memory arena implementation used by the
//! runtime, the demo and the tests.
//!
//! Invariants:
//! - Nodes are addressed by generation-tagged [`NodeRef`] handles.
//! - Detaching a node detaches its whole subtree and bumps the generation of
//!   every slot involved; old handles are rejected with
//!   [`TreeError::StaleNode`] from then on.
//! - Query results are in document (pre-order) order.
//! - Malformed selectors match nothing; they are never an error.

mod document;
mod outline;
mod selector;

use std::fmt;

pub use crate::document::Document;
pub use crate::outline::outline;
pub use crate::selector::{SelectorList, parse_selector_list};

/// Generation-tagged handle onto a node slot of a tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    index: u32,
    generation: u32,
}

impl NodeRef {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The handle's generation no longer matches its slot.
    StaleNode(NodeRef),
    InvalidParent(NodeRef),
    InvalidSibling { parent: NodeRef, before: NodeRef },
    WrongNodeKind(NodeRef),
    DetachRoot,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::StaleNode(node) => write!(f, "stale node reference {node}"),
            TreeError::InvalidParent(node) => write!(f, "node {node} cannot have children"),
            TreeError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            TreeError::WrongNodeKind(node) => write!(f, "operation not valid for node {node}"),
            TreeError::DetachRoot => f.write_str("the document root cannot be detached"),
        }
    }
}

impl std::error::Error for TreeError {}

pub type TreeResult<T> = Result<T, TreeError>;

/// Operations the selection core needs from a document tree.
pub trait NodeTree {
    /// The document root. Always live.
    fn root(&self) -> NodeRef;

    fn is_live(&self, node: NodeRef) -> bool;

    /// Elements below `scope` (the root when `None`) matching `selector`, in
    /// document order. The scope itself is never part of the result.
    fn query(&self, selector: &str, scope: Option<NodeRef>) -> TreeResult<Vec<NodeRef>>;

    /// Creates an element named `tag` under `parent`, before `before` when
    /// given, otherwise as the last child.
    fn create_child(
        &mut self,
        parent: NodeRef,
        tag: &str,
        before: Option<NodeRef>,
    ) -> TreeResult<NodeRef>;

    /// Detaches `node` and its subtree; returns every handle invalidated,
    /// `node` first, in pre-order.
    fn detach(&mut self, node: NodeRef) -> TreeResult<Vec<NodeRef>>;

    fn parent(&self, node: NodeRef) -> TreeResult<Option<NodeRef>>;

    fn children(&self, node: NodeRef) -> TreeResult<Vec<NodeRef>>;

    fn tag(&self, node: NodeRef) -> TreeResult<Option<&str>>;

    fn attribute(&self, node: NodeRef, name: &str) -> TreeResult<Option<&str>>;

    fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str) -> TreeResult<()>;

    /// Concatenated text content of the subtree.
    fn text(&self, node: NodeRef) -> TreeResult<String>;

    /// Replaces all children of `node` with a single text node.
    fn set_text(&mut self, node: NodeRef, value: &str) -> TreeResult<()>;
}
