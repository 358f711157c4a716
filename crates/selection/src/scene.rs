use crate::bindings::DatumTable;
use crate::error::{SelectionError, SelectionResult};
use crate::join::{Join, KeyFn, join_group};
use crate::selection::{Group, Selection, Slot};
use crate::value::ValueSource;
use core_types::Datum;
use dom::{NodeRef, NodeTree};

/// A tree plus the datum bindings of its nodes.
///
/// Every operation validates the whole selection before touching the tree:
/// a selection holding a detached node fails with
/// [`SelectionError::StaleNodeReference`] and nothing is mutated.
#[derive(Debug)]
pub struct Scene<T: NodeTree> {
    tree: T,
    data: DatumTable,
}

impl<T: NodeTree> Scene<T> {
    pub fn new(tree: T) -> Self {
        Self {
            tree,
            data: DatumTable::new(),
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    pub fn bindings(&self) -> &DatumTable {
        &self.data
    }

    pub fn datum(&self, node: NodeRef) -> Option<&Datum> {
        self.data.get(node)
    }

    /// Data of every non-empty slot in slot order; `None` for unbound nodes.
    pub fn data_of<'s>(&'s self, selection: &'s Selection) -> Vec<Option<&'s Datum>> {
        selection
            .groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .filter_map(|slot| match slot {
                Slot::Node(node) => Some(self.data.get(*node)),
                Slot::Pending(enter) => Some(Some(enter.datum())),
                Slot::Empty => None,
            })
            .collect()
    }

    pub fn is_live(&self, node: NodeRef) -> bool {
        self.tree.is_live(node)
    }

    /// Fails on the first node or group parent that is no longer attached.
    pub fn ensure_live(&self, selection: &Selection) -> SelectionResult<()> {
        for group in &selection.groups {
            let has_pending = group.slots.iter().any(|s| matches!(s, Slot::Pending(_)));
            if has_pending && !self.tree.is_live(group.parent) {
                return Err(SelectionError::StaleNodeReference(group.parent));
            }
            for node in group.nodes() {
                if !self.tree.is_live(node) {
                    return Err(SelectionError::StaleNodeReference(node));
                }
            }
        }
        Ok(())
    }

    /// All matches in the document, one group under the root.
    pub fn select_all(&self, selector: &str) -> Selection {
        let root = self.tree.root();
        let nodes = self.tree.query(selector, None).unwrap_or_default();
        log::trace!(target: "selection.ops", "select_all({selector:?}) -> {}", nodes.len());
        Selection::from_nodes(root, nodes)
    }

    /// One group per node of `selection`, holding that node's matching
    /// descendants.
    pub fn select_all_within(
        &self,
        selection: &Selection,
        selector: &str,
    ) -> SelectionResult<Selection> {
        self.ensure_live(selection)?;
        let mut groups = Vec::new();
        for node in selection.nodes() {
            let matches = self.tree.query(selector, Some(node))?;
            groups.push(Group::new(node, matches.into_iter().map(Slot::Node).collect()));
        }
        log::trace!(
            target: "selection.ops",
            "select_all_within({selector:?}) -> {} groups",
            groups.len()
        );
        Ok(Selection::from_groups(groups))
    }

    /// Joins every group of `selection` against the same `data`.
    pub fn join(
        &mut self,
        selection: &Selection,
        data: &[Datum],
        key_fn: &KeyFn<'_>,
    ) -> SelectionResult<Join> {
        self.join_nested(selection, &|_, _| data.to_vec(), key_fn)
    }

    /// Joins each group against the data derived from its parent's datum and
    /// the group index.
    pub fn join_nested(
        &mut self,
        selection: &Selection,
        data_for: &dyn Fn(Option<&Datum>, usize) -> Vec<Datum>,
        key_fn: &KeyFn<'_>,
    ) -> SelectionResult<Join> {
        self.ensure_live(selection)?;
        let mut enter = Vec::with_capacity(selection.groups.len());
        let mut update = Vec::with_capacity(selection.groups.len());
        let mut exit = Vec::with_capacity(selection.groups.len());
        let mut bindings = Vec::new();

        for (j, group) in selection.groups.iter().enumerate() {
            let data = data_for(self.data.get(group.parent), j);
            let out = join_group(&group.slots, &data, key_fn, |node| self.data.get(node));
            log::trace!(
                target: "selection.join",
                "group {j}: {} data, {} slots -> enter {} update {} exit {}",
                data.len(),
                group.slots.len(),
                count_non_empty(&out.enter),
                count_non_empty(&out.update),
                count_non_empty(&out.exit),
            );
            bindings.extend(out.bindings.iter().map(|(node, i)| (*node, data[*i].clone())));
            enter.push(Group::new(group.parent, out.enter));
            update.push(Group::new(group.parent, out.update));
            exit.push(Group::new(group.parent, out.exit));
        }

        for (node, datum) in bindings {
            self.data.bind(node, datum);
        }

        Ok(Join {
            enter: Selection::from_groups(enter),
            update: Selection::from_groups(update),
            exit: Selection::from_groups(exit),
        })
    }

    /// Creates a `tag` element for every non-empty slot. Node slots get it as
    /// their last child; pending slots are materialized under the group
    /// parent, before their anchor. New nodes inherit the slot's datum.
    pub fn append(&mut self, selection: &Selection, tag: &str) -> SelectionResult<Selection> {
        self.ensure_live(selection)?;
        let mut groups = Vec::with_capacity(selection.groups.len());
        for group in &selection.groups {
            let mut slots = Vec::with_capacity(group.slots.len());
            for slot in &group.slots {
                let next = match slot {
                    Slot::Node(node) => {
                        let child = self.tree.create_child(*node, tag, None)?;
                        if let Some(datum) = self.data.get(*node).cloned() {
                            self.data.bind(child, datum);
                        }
                        Slot::Node(child)
                    }
                    Slot::Pending(enter) => {
                        let anchor = enter.anchor().filter(|a| self.is_child_of(*a, group.parent));
                        let child = self.tree.create_child(group.parent, tag, anchor)?;
                        self.data.bind(child, enter.datum().clone());
                        Slot::Node(child)
                    }
                    Slot::Empty => Slot::Empty,
                };
                slots.push(next);
            }
            groups.push(Group::new(group.parent, slots));
        }
        let appended = Selection::from_groups(groups);
        log::trace!(target: "selection.ops", "append(<{tag}>) -> {}", appended.size());
        Ok(appended)
    }

    /// Detaches every node of `selection` with its subtree; returns the
    /// selection, whose handles are stale from now on.
    pub fn remove<'s>(&mut self, selection: &'s Selection) -> SelectionResult<&'s Selection> {
        self.remove_collect(selection)?;
        Ok(selection)
    }

    /// Like [`Scene::remove`], returning every handle the removal invalidated.
    pub fn remove_collect(&mut self, selection: &Selection) -> SelectionResult<Vec<NodeRef>> {
        self.ensure_live(selection)?;
        let mut detached = Vec::new();
        for node in selection.nodes() {
            // Already gone as part of an earlier node's subtree.
            if !self.tree.is_live(node) {
                continue;
            }
            detached.extend(self.tree.detach(node)?);
        }
        self.data.purge(&detached);
        log::trace!(target: "selection.ops", "remove -> {} nodes detached", detached.len());
        Ok(detached)
    }

    pub fn set_attribute<'s, 'v>(
        &mut self,
        selection: &'s Selection,
        name: &str,
        value: impl Into<ValueSource<'v>>,
    ) -> SelectionResult<&'s Selection> {
        self.ensure_live(selection)?;
        let value = value.into();
        for group in &selection.groups {
            for (i, slot) in group.slots.iter().enumerate() {
                if let Slot::Node(node) = slot {
                    let resolved = value.resolve(self.data.get(*node), i);
                    self.tree.set_attribute(*node, name, &resolved.render())?;
                }
            }
        }
        Ok(selection)
    }

    pub fn set_text<'s, 'v>(
        &mut self,
        selection: &'s Selection,
        value: impl Into<ValueSource<'v>>,
    ) -> SelectionResult<&'s Selection> {
        self.ensure_live(selection)?;
        let value = value.into();
        for group in &selection.groups {
            for (i, slot) in group.slots.iter().enumerate() {
                if let Slot::Node(node) = slot {
                    let resolved = value.resolve(self.data.get(*node), i);
                    self.tree.set_text(*node, &resolved.render())?;
                }
            }
        }
        // Replaced children may have carried bindings.
        let tree = &self.tree;
        self.data.retain_live(|node| tree.is_live(node));
        Ok(selection)
    }

    fn is_child_of(&self, node: NodeRef, parent: NodeRef) -> bool {
        matches!(self.tree.parent(node), Ok(Some(p)) if p == parent)
    }
}

fn count_non_empty(slots: &[Slot]) -> usize {
    slots.iter().filter(|s| !s.is_empty()).count()
}
