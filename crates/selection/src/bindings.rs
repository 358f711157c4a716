//! Node → datum side-table.
//!
//! Bindings live here rather than on the nodes themselves; the tree never
//! sees host data.

use core_types::Datum;
use dom::NodeRef;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct DatumTable {
    by_node: HashMap<NodeRef, Datum>,
}

impl DatumTable {
    pub fn new() -> Self {
        Self {
            by_node: HashMap::new(),
        }
    }

    pub fn get(&self, node: NodeRef) -> Option<&Datum> {
        self.by_node.get(&node)
    }

    /// Binds `datum` to `node`, replacing any previous binding.
    pub fn bind(&mut self, node: NodeRef, datum: Datum) {
        self.by_node.insert(node, datum);
    }

    pub fn unbind(&mut self, node: NodeRef) -> Option<Datum> {
        self.by_node.remove(&node)
    }

    pub fn purge(&mut self, nodes: &[NodeRef]) {
        for node in nodes {
            self.by_node.remove(node);
        }
    }

    /// Drops bindings whose node fails `is_live`.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(NodeRef) -> bool) {
        self.by_node.retain(|node, _| is_live(*node));
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}
