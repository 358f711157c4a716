use crate::document::NodeKind;
use crate::{Document, NodeRef, NodeTree};

const INDENT_STEP: &str = "  ";

/// Renders the subtree under `root` as indented lines, attributes in
/// insertion order. Used for test snapshots and the demo output.
pub fn outline(doc: &Document, root: NodeRef) -> Vec<String> {
    struct IndentGuard<'a> {
        indent: &'a mut String,
        step: usize,
    }

    impl Drop for IndentGuard<'_> {
        fn drop(&mut self) {
            let new_len = self.indent.len() - self.step;
            self.indent.truncate(new_len);
        }
    }

    fn walk(doc: &Document, node: NodeRef, indent: &mut String, out: &mut Vec<String>) {
        let Ok(kind) = doc.node_kind(node) else {
            return;
        };
        let mut line = String::with_capacity(indent.len() + 32);
        line.push_str(indent);
        match kind {
            NodeKind::Document => line.push_str("#document"),
            NodeKind::Element { name, attributes } => {
                line.push('<');
                line.push_str(name);
                for (k, v) in attributes {
                    line.push(' ');
                    line.push_str(k);
                    line.push_str("=\"");
                    line.push_str(v);
                    line.push('"');
                }
                line.push('>');
            }
            NodeKind::Text { text } => {
                line.push('"');
                line.push_str(text);
                line.push('"');
            }
        }
        out.push(line);
        let children = doc.children(node).unwrap_or_default();
        indent.push_str(INDENT_STEP);
        let mut guard = IndentGuard {
            indent,
            step: INDENT_STEP.len(),
        };
        for child in children {
            walk(doc, child, &mut *guard.indent, out);
        }
    }

    let mut out = Vec::new();
    let mut indent = String::new();
    walk(doc, root, &mut indent, &mut out);
    out
}
