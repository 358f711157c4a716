//! Data join: reconcile a group's nodes against a data sequence.
//!
//! Contract (per group, groups are independent):
//! - Every datum lands in exactly one of enter/update at its data index.
//! - Every existing node lands in exactly one of update/exit; exit slots keep
//!   the node's original position.
//! - Update order is data order, not prior node order.
//! - Duplicate data keys: the lowest index wins the match, later ones enter.
//! - Duplicate node keys: the first node is matchable, the others exit.
//! - Nodes without a bound datum are keyed by position.
//!
//! Complexity: O(n + m) expected, n nodes and m data.

use crate::selection::{EnterSlot, Selection, Slot};
use core_types::{Datum, Key};
use dom::NodeRef;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// How data and bound nodes are identified across updates.
#[derive(Clone, Copy, Default)]
pub enum KeyFn<'a> {
    /// `data[i]` pairs with node slot `i`.
    #[default]
    Positional,
    /// The datum itself is the key.
    Identity,
    /// A named field of a record datum; other data fall back to identity.
    Field(&'a str),
    /// Caller-supplied key of `(datum, index)`; the group is not passed.
    ByDatum(&'a dyn Fn(&Datum, usize) -> Key),
}

impl<'a> KeyFn<'a> {
    pub fn by_datum(f: &'a dyn Fn(&Datum, usize) -> Key) -> Self {
        KeyFn::ByDatum(f)
    }

    pub fn key_of(&self, datum: &Datum, index: usize) -> Key {
        match self {
            KeyFn::Positional => Key::Position(index),
            KeyFn::Identity => Key::from(datum),
            KeyFn::Field(name) => Key::from(datum.field(name).unwrap_or(datum)),
            KeyFn::ByDatum(f) => f(datum, index),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, KeyFn::Positional)
    }
}

impl std::fmt::Debug for KeyFn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyFn::Positional => f.write_str("Positional"),
            KeyFn::Identity => f.write_str("Identity"),
            KeyFn::Field(name) => write!(f, "Field({name:?})"),
            KeyFn::ByDatum(_) => f.write_str("ByDatum(..)"),
        }
    }
}

/// The three disjoint selections produced by a join.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Join {
    pub enter: Selection,
    pub update: Selection,
    pub exit: Selection,
}

/// Slot vectors for one group, before they are wrapped into selections.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupJoin {
    /// Length = data length.
    pub enter: Vec<Slot>,
    /// Length = data length.
    pub update: Vec<Slot>,
    /// Length = existing slot count.
    pub exit: Vec<Slot>,
    /// `(node, data index)` pairs to record in the side-table.
    pub bindings: Vec<(NodeRef, usize)>,
}

/// Joins one group. `bound` reports the datum currently bound to a node.
pub fn join_group<'d>(
    existing: &[Slot],
    data: &[Datum],
    key_fn: &KeyFn<'_>,
    bound: impl Fn(NodeRef) -> Option<&'d Datum>,
) -> GroupJoin {
    let mut out = GroupJoin {
        enter: vec![Slot::Empty; data.len()],
        update: vec![Slot::Empty; data.len()],
        exit: vec![Slot::Empty; existing.len()],
        bindings: Vec::new(),
    };

    if key_fn.is_positional() {
        join_by_index(existing, data, &mut out);
    } else {
        join_by_key(existing, data, key_fn, bound, &mut out);
    }

    assign_anchors(&mut out);
    out
}

fn join_by_index(existing: &[Slot], data: &[Datum], out: &mut GroupJoin) {
    for (i, datum) in data.iter().enumerate() {
        match existing.get(i).and_then(Slot::node) {
            Some(node) => {
                out.update[i] = Slot::Node(node);
                out.bindings.push((node, i));
            }
            None => {
                out.enter[i] = pending(datum);
            }
        }
    }
    for (i, slot) in existing.iter().enumerate().skip(data.len()) {
        if let Some(node) = slot.node() {
            out.exit[i] = Slot::Node(node);
        }
    }
}

fn join_by_key<'d>(
    existing: &[Slot],
    data: &[Datum],
    key_fn: &KeyFn<'_>,
    bound: impl Fn(NodeRef) -> Option<&'d Datum>,
    out: &mut GroupJoin,
) {
    let mut by_key: HashMap<Key, usize> = HashMap::with_capacity(existing.len());

    for (i, slot) in existing.iter().enumerate() {
        let Some(node) = slot.node() else {
            continue;
        };
        let key = match bound(node) {
            Some(datum) => key_fn.key_of(datum, i),
            None => Key::Position(i),
        };
        match by_key.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(i);
            }
            Entry::Occupied(entry) => {
                log::trace!(
                    target: "selection.join",
                    "duplicate node key {} at slot {i}; forced to exit",
                    entry.key()
                );
                out.exit[i] = Slot::Node(node);
            }
        }
    }

    for (i, datum) in data.iter().enumerate() {
        let key = key_fn.key_of(datum, i);
        match by_key.remove(&key) {
            Some(pos) => {
                // Only node slots are ever inserted into `by_key`.
                if let Some(node) = existing[pos].node() {
                    out.update[i] = Slot::Node(node);
                    out.bindings.push((node, i));
                }
            }
            None => {
                out.enter[i] = pending(datum);
            }
        }
    }

    // Whatever is still keyed was never consumed.
    for pos in by_key.into_values() {
        if let Some(node) = existing[pos].node() {
            out.exit[pos] = Slot::Node(node);
        }
    }
}

fn pending(datum: &Datum) -> Slot {
    Slot::Pending(EnterSlot {
        datum: datum.clone(),
        anchor: None,
    })
}

// Each enter slot is anchored to the first update node after it.
fn assign_anchors(out: &mut GroupJoin) {
    let mut next: Option<NodeRef> = None;
    for i in (0..out.update.len()).rev() {
        if let Slot::Pending(enter) = &mut out.enter[i] {
            enter.anchor = next;
        }
        if let Some(node) = out.update[i].node() {
            next = Some(node);
        }
    }
}
