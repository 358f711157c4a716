#![no_main]

use dom::{Document, NodeTree};
use libfuzzer_sys::fuzz_target;

// Arbitrary selector text never panics and only returns live elements below
// the scope, in document order.
fuzz_target!(|data: &[u8]| {
    let Ok(selector) = std::str::from_utf8(data) else {
        return;
    };
    let mut doc = Document::new();
    let Ok(svg) = doc.append_element(doc.root(), "svg") else {
        return;
    };
    for tag in ["g", "rect", "text"] {
        let Ok(child) = doc.append_element(svg, tag) else {
            return;
        };
        let _ = doc.set_attribute(child, "class", "bar");
        let _ = doc.append_element(child, "rect");
    }
    let Ok(found) = doc.query(selector, Some(svg)) else {
        return;
    };
    let mut last = None;
    for node in found {
        assert!(doc.is_live(node));
        assert_ne!(node, svg);
        assert!(last.is_none_or(|prev: dom::NodeRef| prev.index() < node.index()));
        last = Some(node);
    }
});
