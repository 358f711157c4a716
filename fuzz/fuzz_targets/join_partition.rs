#![no_main]

use core_types::Datum;
use dom::NodeRef;
use libfuzzer_sys::fuzz_target;
use selection::{KeyFn, Slot, join_group};
use std::collections::{HashMap, HashSet};

// Byte layout: [node count, then node keys..., then data keys...]; keys are
// taken modulo a small alphabet so duplicates are frequent. Key 0 marks an
// unbound node.
fuzz_target!(|data: &[u8]| {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let count = (count as usize % 32).min(rest.len());
    let (node_keys, data_keys) = rest.split_at(count);

    let mut slots = Vec::with_capacity(count);
    let mut bound = HashMap::new();
    for (i, key) in node_keys.iter().enumerate() {
        let node = NodeRef::new(i as u32 + 1, 0);
        slots.push(Slot::Node(node));
        if key % 8 != 0 {
            bound.insert(node, Datum::text(&format!("k{}", key % 8)));
        }
    }
    let data = data_keys
        .iter()
        .map(|key| Datum::text(&format!("k{}", key % 8)))
        .collect::<Vec<_>>();

    for key_fn in [KeyFn::Identity, KeyFn::Positional] {
        let out = join_group(&slots, &data, &key_fn, |node| bound.get(&node));
        assert_eq!(out.enter.len(), data.len());
        assert_eq!(out.update.len(), data.len());
        assert_eq!(out.exit.len(), slots.len());

        // Every datum lands in exactly one of enter/update.
        for i in 0..data.len() {
            assert_ne!(out.enter[i].is_empty(), out.update[i].is_empty());
        }
        // Every node lands in exactly one of update/exit, update never repeats.
        let updated = out.update.iter().filter_map(Slot::node).collect::<Vec<_>>();
        let unique = updated.iter().copied().collect::<HashSet<_>>();
        assert_eq!(unique.len(), updated.len());
        let exited = out.exit.iter().filter_map(Slot::node).collect::<HashSet<_>>();
        assert!(unique.is_disjoint(&exited));
        assert_eq!(unique.len() + exited.len(), slots.len());
    }
});
