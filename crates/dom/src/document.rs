use crate::selector::{SelectorSubject, parse_selector_list};
use crate::{NodeRef, NodeTree, TreeError, TreeResult};
use std::sync::Arc;

/// In-memory document tree backed by a generation-tagged arena.
///
/// Slots of detached nodes are recycled; each detach bumps the slot's
/// generation so handles held by older selections stop resolving.
#[derive(Debug)]
pub struct Document {
    arena: DomArena,
}

impl Document {
    pub fn new() -> Self {
        Self {
            arena: DomArena::new(),
        }
    }

    /// Number of live nodes, the root included.
    pub fn live_count(&self) -> usize {
        self.arena
            .slots
            .iter()
            .filter(|slot| slot.record.is_some())
            .count()
    }

    /// Convenience for hosts building a static skeleton before any join.
    pub fn append_element(&mut self, parent: NodeRef, tag: &str) -> TreeResult<NodeRef> {
        self.create_child(parent, tag, None)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree for Document {
    fn root(&self) -> NodeRef {
        self.arena.handle(DomArena::ROOT)
    }

    fn is_live(&self, node: NodeRef) -> bool {
        self.arena.resolve(node).is_ok()
    }

    fn query(&self, selector: &str, scope: Option<NodeRef>) -> TreeResult<Vec<NodeRef>> {
        let scope = match scope {
            Some(node) => self.arena.resolve(node)?,
            None => DomArena::ROOT,
        };
        let Some(list) = parse_selector_list(selector) else {
            log::trace!(target: "dom.tree", "unparseable selector {selector:?}; empty result");
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let mut stack: Vec<u32> = self.arena.record(scope).children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if list.matches(&self.arena, index) {
                out.push(self.arena.handle(index));
            }
            stack.extend(self.arena.record(index).children.iter().rev().copied());
        }
        Ok(out)
    }

    fn create_child(
        &mut self,
        parent: NodeRef,
        tag: &str,
        before: Option<NodeRef>,
    ) -> TreeResult<NodeRef> {
        let parent_index = self.arena.resolve(parent)?;
        if !self.arena.record(parent_index).allows_children() {
            return Err(TreeError::InvalidParent(parent));
        }
        let position = match before {
            Some(before) => {
                let before_index = self.arena.resolve(before)?;
                let siblings = &self.arena.record(parent_index).children;
                let pos = siblings
                    .iter()
                    .position(|k| *k == before_index)
                    .ok_or(TreeError::InvalidSibling { parent, before })?;
                Some(pos)
            }
            None => None,
        };
        let child = self.arena.insert(
            NodeKind::Element {
                name: Arc::from(tag.to_ascii_lowercase()),
                attributes: Vec::new(),
            },
            parent_index,
            position,
        );
        let handle = self.arena.handle(child);
        log::trace!(target: "dom.tree", "create <{tag}> {handle} under {parent}");
        Ok(handle)
    }

    fn detach(&mut self, node: NodeRef) -> TreeResult<Vec<NodeRef>> {
        let index = self.arena.resolve(node)?;
        if index == DomArena::ROOT {
            return Err(TreeError::DetachRoot);
        }
        let removed = self.arena.remove_subtree(index);
        log::trace!(target: "dom.tree", "detach {node} ({} nodes)", removed.len());
        Ok(removed)
    }

    fn parent(&self, node: NodeRef) -> TreeResult<Option<NodeRef>> {
        let index = self.arena.resolve(node)?;
        Ok(self
            .arena
            .record(index)
            .parent
            .map(|p| self.arena.handle(p)))
    }

    fn children(&self, node: NodeRef) -> TreeResult<Vec<NodeRef>> {
        let index = self.arena.resolve(node)?;
        Ok(self
            .arena
            .record(index)
            .children
            .iter()
            .map(|c| self.arena.handle(*c))
            .collect())
    }

    fn tag(&self, node: NodeRef) -> TreeResult<Option<&str>> {
        let index = self.arena.resolve(node)?;
        Ok(self.arena.element_name(index))
    }

    fn attribute(&self, node: NodeRef, name: &str) -> TreeResult<Option<&str>> {
        let index = self.arena.resolve(node)?;
        Ok(self.arena.element_attribute(index, name))
    }

    fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str) -> TreeResult<()> {
        let index = self.arena.resolve(node)?;
        match &mut self.arena.record_mut(index).kind {
            NodeKind::Element { attributes, .. } => {
                if let Some((_, existing)) = attributes
                    .iter_mut()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                {
                    existing.clear();
                    existing.push_str(value);
                } else {
                    attributes.push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
                }
                Ok(())
            }
            _ => Err(TreeError::WrongNodeKind(node)),
        }
    }

    fn text(&self, node: NodeRef) -> TreeResult<String> {
        let index = self.arena.resolve(node)?;
        let mut out = String::new();
        self.arena.collect_text(index, &mut out);
        Ok(out)
    }

    fn set_text(&mut self, node: NodeRef, value: &str) -> TreeResult<()> {
        let index = self.arena.resolve(node)?;
        match &mut self.arena.record_mut(index).kind {
            NodeKind::Text { text } => {
                text.clear();
                text.push_str(value);
                return Ok(());
            }
            NodeKind::Element { .. } => {}
            NodeKind::Document => return Err(TreeError::WrongNodeKind(node)),
        }
        let children = self.arena.record(index).children.clone();
        for child in children {
            self.arena.remove_subtree(child);
        }
        if !value.is_empty() {
            self.arena.insert(
                NodeKind::Text {
                    text: value.to_string(),
                },
                index,
                None,
            );
        }
        Ok(())
    }
}

#[derive(Debug)]
struct DomArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<NodeRecord>,
}

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<u32>,
    pub(crate) children: Vec<u32>,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element { .. })
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
    },
    Text {
        text: String,
    },
}

impl DomArena {
    const ROOT: u32 = 0;

    fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                record: Some(NodeRecord {
                    kind: NodeKind::Document,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
        }
    }

    fn handle(&self, index: u32) -> NodeRef {
        NodeRef::new(index, self.slots[index as usize].generation)
    }

    fn resolve(&self, node: NodeRef) -> TreeResult<u32> {
        match self.slots.get(node.index() as usize) {
            Some(slot) if slot.generation == node.generation() && slot.record.is_some() => {
                Ok(node.index())
            }
            _ => Err(TreeError::StaleNode(node)),
        }
    }

    // Callers only pass indices that `resolve` accepted or that come from a
    // live record's child list.
    fn record(&self, index: u32) -> &NodeRecord {
        match &self.slots[index as usize].record {
            Some(record) => record,
            None => unreachable!("dangling arena index {index}"),
        }
    }

    fn record_mut(&mut self, index: u32) -> &mut NodeRecord {
        match &mut self.slots[index as usize].record {
            Some(record) => record,
            None => unreachable!("dangling arena index {index}"),
        }
    }

    fn insert(&mut self, kind: NodeKind, parent: u32, position: Option<usize>) -> u32 {
        let record = NodeRecord {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].record = Some(record);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                (self.slots.len() - 1) as u32
            }
        };
        let siblings = &mut self.record_mut(parent).children;
        match position {
            Some(pos) => siblings.insert(pos, index),
            None => siblings.push(index),
        }
        index
    }

    fn remove_subtree(&mut self, index: u32) -> Vec<NodeRef> {
        if let Some(parent) = self.record_mut(index).parent.take() {
            self.record_mut(parent).children.retain(|k| *k != index);
        }
        let mut removed = Vec::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            removed.push(self.handle(current));
            let slot = &mut self.slots[current as usize];
            if let Some(record) = slot.record.take() {
                stack.extend(record.children.iter().rev().copied());
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current);
        }
        removed
    }

    fn collect_text(&self, index: u32, out: &mut String) {
        let record = self.record(index);
        if let NodeKind::Text { text } = &record.kind {
            out.push_str(text);
        }
        for child in &record.children {
            self.collect_text(*child, out);
        }
    }

    pub(crate) fn kind(&self, index: u32) -> &NodeKind {
        &self.record(index).kind
    }
}

impl SelectorSubject for DomArena {
    fn element_name(&self, index: u32) -> Option<&str> {
        match &self.record(index).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    fn element_attribute(&self, index: u32, name: &str) -> Option<&str> {
        match &self.record(index).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn parent_index(&self, index: u32) -> Option<u32> {
        self.record(index).parent
    }
}

impl Document {
    pub(crate) fn node_kind(&self, node: NodeRef) -> TreeResult<&NodeKind> {
        let index = self.arena.resolve(node)?;
        Ok(self.arena.kind(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg_with_bars(doc: &mut Document, count: usize) -> (NodeRef, Vec<NodeRef>) {
        let root = doc.root();
        let svg = doc.append_element(root, "svg").unwrap();
        let bars = (0..count)
            .map(|_| doc.append_element(svg, "rect").unwrap())
            .collect();
        (svg, bars)
    }

    #[test]
    fn query_returns_document_order_and_excludes_scope() {
        let mut doc = Document::new();
        let (svg, bars) = svg_with_bars(&mut doc, 2);
        let nested = doc.append_element(bars[0], "rect").unwrap();
        assert_eq!(
            doc.query("rect", None).unwrap(),
            vec![bars[0], nested, bars[1]]
        );
        assert_eq!(doc.query("rect", Some(bars[0])).unwrap(), vec![nested]);
        assert_eq!(doc.query("svg", Some(svg)).unwrap(), Vec::<NodeRef>::new());
    }

    #[test]
    fn malformed_selector_yields_empty_result() {
        let mut doc = Document::new();
        svg_with_bars(&mut doc, 3);
        assert!(doc.query("rect:nth-child(2)", None).unwrap().is_empty());
    }

    #[test]
    fn create_child_before_sibling() {
        let mut doc = Document::new();
        let (svg, bars) = svg_with_bars(&mut doc, 2);
        let inserted = doc.create_child(svg, "circle", Some(bars[1])).unwrap();
        assert_eq!(doc.children(svg).unwrap(), vec![bars[0], inserted, bars[1]]);
    }

    #[test]
    fn create_child_rejects_foreign_sibling() {
        let mut doc = Document::new();
        let (svg, bars) = svg_with_bars(&mut doc, 1);
        let other = doc.append_element(doc.root(), "g").unwrap();
        assert_eq!(
            doc.create_child(other, "rect", Some(bars[0])),
            Err(TreeError::InvalidSibling {
                parent: other,
                before: bars[0]
            })
        );
        assert_eq!(doc.children(svg).unwrap().len(), 1);
    }

    #[test]
    fn detach_invalidates_subtree_and_recycles_slots() {
        let mut doc = Document::new();
        let (svg, bars) = svg_with_bars(&mut doc, 2);
        let removed = doc.detach(svg).unwrap();
        assert_eq!(removed[0], svg);
        assert_eq!(removed.len(), 3);
        assert!(!doc.is_live(bars[0]));
        assert_eq!(doc.live_count(), 1);

        let reused = doc.append_element(doc.root(), "g").unwrap();
        assert!(removed.iter().any(|r| r.index() == reused.index()));
        assert!(!removed.contains(&reused));
        assert_eq!(
            doc.attribute(removed[0], "x"),
            Err(TreeError::StaleNode(removed[0]))
        );
    }

    #[test]
    fn root_cannot_be_detached() {
        let mut doc = Document::new();
        assert_eq!(doc.detach(doc.root()), Err(TreeError::DetachRoot));
    }

    #[test]
    fn attributes_overwrite_in_place() {
        let mut doc = Document::new();
        let (_, bars) = svg_with_bars(&mut doc, 1);
        doc.set_attribute(bars[0], "x", "1").unwrap();
        doc.set_attribute(bars[0], "y", "2").unwrap();
        doc.set_attribute(bars[0], "X", "3").unwrap();
        assert_eq!(doc.attribute(bars[0], "x").unwrap(), Some("3"));
        assert_eq!(doc.attribute(bars[0], "missing").unwrap(), None);
    }

    #[test]
    fn set_text_replaces_children() {
        let mut doc = Document::new();
        let (svg, bars) = svg_with_bars(&mut doc, 2);
        doc.set_text(svg, "hello").unwrap();
        assert_eq!(doc.text(svg).unwrap(), "hello");
        assert!(!doc.is_live(bars[0]));
        doc.set_text(svg, "").unwrap();
        assert_eq!(doc.text(svg).unwrap(), "");
        assert!(doc.children(svg).unwrap().is_empty());
    }
}
