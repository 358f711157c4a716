use core_types::Datum;
use dom::NodeRef;
use std::fmt;

/// One position of a [`Group`].
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Node(NodeRef),
    /// Datum waiting for an `append` to materialize its node.
    Pending(EnterSlot),
    Empty,
}

impl Slot {
    pub fn node(&self) -> Option<NodeRef> {
        match self {
            Slot::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Placeholder produced by a join for data without a matching node.
#[derive(Clone, Debug, PartialEq)]
pub struct EnterSlot {
    pub(crate) datum: Datum,
    /// First update node after this slot in the group; the materialized node
    /// is inserted before it so sibling order follows data order.
    pub(crate) anchor: Option<NodeRef>,
}

impl EnterSlot {
    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn anchor(&self) -> Option<NodeRef> {
        self.anchor
    }
}

/// Ordered slots sharing a parent node.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub(crate) parent: NodeRef,
    pub(crate) slots: Vec<Slot>,
}

impl Group {
    pub fn new(parent: NodeRef, slots: Vec<Slot>) -> Self {
        Self { parent, slots }
    }

    pub fn parent(&self) -> NodeRef {
        self.parent
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.slots.iter().filter_map(Slot::node)
    }
}

/// Immutable, grouped handle onto nodes of a tree.
///
/// Operations that change structure return new selections; the nodes they
/// reference are mutated in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub(crate) groups: Vec<Group>,
}

impl Selection {
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    pub fn from_groups(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Single group of nodes under `parent`.
    pub fn from_nodes(parent: NodeRef, nodes: impl IntoIterator<Item = NodeRef>) -> Self {
        Self {
            groups: vec![Group::new(parent, nodes.into_iter().map(Slot::Node).collect())],
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Node slots across all groups, in group then slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.groups.iter().flat_map(Group::nodes)
    }

    /// Number of non-empty slots (nodes and pending placeholders).
    pub fn size(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.slots.iter().filter(|s| !s.is_empty()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn pending(&self) -> impl Iterator<Item = &EnterSlot> + '_ {
        self.groups.iter().flat_map(|g| {
            g.slots.iter().filter_map(|s| match s {
                Slot::Pending(enter) => Some(enter),
                _ => None,
            })
        })
    }

    /// Slot-wise union: keeps this selection's non-empty slots and fills its
    /// empty ones from `other`. Group count and lengths follow `self`.
    pub fn merge(&self, other: &Selection) -> Selection {
        let groups = self
            .groups
            .iter()
            .enumerate()
            .map(|(j, group)| {
                let Some(other_group) = other.groups.get(j) else {
                    return group.clone();
                };
                let slots = group
                    .slots
                    .iter()
                    .enumerate()
                    .map(|(i, slot)| match (slot, other_group.slots.get(i)) {
                        (Slot::Empty, Some(fill)) => fill.clone(),
                        (slot, _) => slot.clone(),
                    })
                    .collect();
                Group::new(group.parent, slots)
            })
            .collect();
        Selection { groups }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selection(groups: {}, size: {})", self.groups.len(), self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(index: u32) -> NodeRef {
        NodeRef::new(index, 0)
    }

    #[test]
    fn merge_fills_empty_slots_only() {
        let parent = n(0);
        let left = Selection::from_groups(vec![Group::new(
            parent,
            vec![Slot::Node(n(1)), Slot::Empty, Slot::Empty],
        )]);
        let right = Selection::from_groups(vec![Group::new(
            parent,
            vec![Slot::Node(n(9)), Slot::Node(n(2)), Slot::Empty],
        )]);
        let merged = left.merge(&right);
        assert_eq!(
            merged.groups()[0].slots(),
            &[Slot::Node(n(1)), Slot::Node(n(2)), Slot::Empty]
        );
        assert_eq!(merged.size(), 2);
    }

    #[test]
    fn size_counts_pending_placeholders() {
        let sel = Selection::from_groups(vec![Group::new(
            n(0),
            vec![
                Slot::Pending(EnterSlot {
                    datum: Datum::from(1),
                    anchor: None,
                }),
                Slot::Empty,
                Slot::Node(n(3)),
            ],
        )]);
        assert_eq!(sel.size(), 2);
        assert_eq!(sel.nodes().collect::<Vec<_>>(), vec![n(3)]);
        assert_eq!(sel.pending().count(), 1);
        assert!(Selection::empty().is_empty());
    }
}
