//! Tree serialization back to document text.

use crate::tree::{NodeKey, NodeKind, NodeTree};
use arbordb_xml::{escape_attribute, escape_text};

/// Namespace bound to the `rest` prefix in serialized output.
pub const REST_NAMESPACE: &str = "https://arbordb.org/rest";

/// Output options for [`XmlSerializer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializerOptions {
    /// Element start tags carry a `rest:id` attribute with the node key.
    pub emit_ids: bool,
    /// Each top-level fragment is wrapped in `<rest:item>`.
    pub emit_rest: bool,
    /// The whole result is wrapped in `<rest:sequence>` carrying the
    /// namespace declaration.
    pub emit_rest_sequence: bool,
    /// Two-space indentation, one element per line. Disabled output is a
    /// single line with no inter-node whitespace.
    pub pretty_print: bool,
}

impl SerializerOptions {
    /// Creates options with everything off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether node keys are emitted.
    #[must_use]
    pub const fn emit_ids(mut self, value: bool) -> Self {
        self.emit_ids = value;
        self
    }

    /// Sets whether fragments are wrapped in `<rest:item>`.
    #[must_use]
    pub const fn emit_rest(mut self, value: bool) -> Self {
        self.emit_rest = value;
        self
    }

    /// Sets whether the result is wrapped in `<rest:sequence>`.
    #[must_use]
    pub const fn emit_rest_sequence(mut self, value: bool) -> Self {
        self.emit_rest_sequence = value;
        self
    }

    /// Sets whether output is pretty-printed.
    #[must_use]
    pub const fn pretty_print(mut self, value: bool) -> Self {
        self.pretty_print = value;
        self
    }

    /// All four options on. This is the ingestion pipeline's response
    /// format.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            emit_ids: true,
            emit_rest: true,
            emit_rest_sequence: true,
            pretty_print: true,
        }
    }
}

/// Serializes a [`NodeTree`] to document text.
///
/// Traversal is depth-first over the root's children; the document root
/// itself is never emitted. Text and attribute values are escaped with the
/// `arbordb_xml` escaping rules.
#[derive(Debug, Clone, Copy)]
pub struct XmlSerializer {
    options: SerializerOptions,
}

impl XmlSerializer {
    /// Creates a serializer with the given options.
    #[must_use]
    pub fn new(options: SerializerOptions) -> Self {
        Self { options }
    }

    /// Serializes the tree into a string.
    ///
    /// The whole output is accumulated before being returned; nothing is
    /// emitted incrementally.
    #[must_use]
    pub fn serialize(&self, tree: &NodeTree) -> String {
        let fragments: &[NodeKey] = tree
            .node(tree.root())
            .map(|root| root.children.as_slice())
            .unwrap_or(&[]);

        let mut out = String::new();

        if self.options.emit_rest_sequence {
            if fragments.is_empty() {
                return format!("<rest:sequence xmlns:rest=\"{REST_NAMESPACE}\"/>");
            }
            self.line_start(&mut out, 0);
            out.push_str(&format!(
                "<rest:sequence xmlns:rest=\"{REST_NAMESPACE}\">"
            ));
        }

        let depth = usize::from(self.options.emit_rest_sequence);
        for &fragment in fragments {
            if self.options.emit_rest {
                self.line_start(&mut out, depth);
                out.push_str("<rest:item>");
                self.write_node(tree, fragment, depth + 1, &mut out);
                self.line_start(&mut out, depth);
                out.push_str("</rest:item>");
            } else {
                self.write_node(tree, fragment, depth, &mut out);
            }
        }

        if self.options.emit_rest_sequence {
            self.line_start(&mut out, 0);
            out.push_str("</rest:sequence>");
        }
        out
    }

    fn write_node(&self, tree: &NodeTree, key: NodeKey, depth: usize, out: &mut String) {
        let Some(node) = tree.node(key) else {
            return;
        };

        match &node.kind {
            NodeKind::Text(text) => {
                self.line_start(out, depth);
                out.push_str(&escape_text(text));
            }
            NodeKind::Element { name, attributes } => {
                self.line_start(out, depth);
                out.push('<');
                out.push_str(name);
                if self.options.emit_ids {
                    out.push_str(&format!(" rest:id=\"{}\"", key.as_u64()));
                }
                for (attr_name, value) in attributes {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }

                if node.children.is_empty() {
                    out.push_str("/>");
                } else if self.all_text(tree, &node.children) {
                    // Text-only content stays inline so character data gains
                    // no surrounding whitespace.
                    out.push('>');
                    for &child in &node.children {
                        if let Some(child_node) = tree.node(child) {
                            if let NodeKind::Text(text) = &child_node.kind {
                                out.push_str(&escape_text(text));
                            }
                        }
                    }
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                } else {
                    out.push('>');
                    for &child in &node.children {
                        self.write_node(tree, child, depth + 1, out);
                    }
                    self.line_start(out, depth);
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
            NodeKind::Document => {
                for &child in &node.children {
                    self.write_node(tree, child, depth, out);
                }
            }
        }
    }

    fn all_text(&self, tree: &NodeTree, children: &[NodeKey]) -> bool {
        children.iter().all(|&key| {
            matches!(
                tree.node(key).map(|node| &node.kind),
                Some(NodeKind::Text(_))
            )
        })
    }

    fn line_start(&self, out: &mut String, depth: usize) {
        if !self.options.pretty_print {
            return;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> NodeKind {
        NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// `<fruit><name>apple</name></fruit>` as a tree.
    fn fruit_tree() -> NodeTree {
        let mut tree = NodeTree::new();
        let fruit = tree.add_node(element("fruit"));
        let name = tree.add_node(element("name"));
        let text = tree.add_node(NodeKind::Text("apple".into()));
        tree.append_child(fruit, name);
        tree.append_child(name, text);
        tree.prepend_children_to_root(&[fruit]);
        tree
    }

    #[test]
    fn bare_options_give_compact_markup() {
        let out = XmlSerializer::new(SerializerOptions::new()).serialize(&fruit_tree());
        assert_eq!(out, "<fruit><name>apple</name></fruit>");
    }

    #[test]
    fn ids_carry_node_keys() {
        let options = SerializerOptions::new().emit_ids(true);
        let out = XmlSerializer::new(options).serialize(&fruit_tree());
        assert_eq!(
            out,
            "<fruit rest:id=\"1\"><name rest:id=\"2\">apple</name></fruit>"
        );
    }

    #[test]
    fn full_options_wrap_and_indent() {
        let out = XmlSerializer::new(SerializerOptions::full()).serialize(&fruit_tree());
        let expected = "\
<rest:sequence xmlns:rest=\"https://arbordb.org/rest\">
  <rest:item>
    <fruit rest:id=\"1\">
      <name rest:id=\"2\">apple</name>
    </fruit>
  </rest:item>
</rest:sequence>";
        assert_eq!(out, expected);
    }

    #[test]
    fn each_fragment_gets_its_own_item() {
        let mut tree = NodeTree::new();
        let a = tree.add_node(element("a"));
        let b = tree.add_node(element("b"));
        tree.prepend_children_to_root(&[a, b]);

        let options = SerializerOptions::new().emit_rest(true);
        let out = XmlSerializer::new(options).serialize(&tree);
        assert_eq!(out, "<rest:item><a/></rest:item><rest:item><b/></rest:item>");
    }

    #[test]
    fn empty_tree_serializes_to_empty_sequence() {
        let options = SerializerOptions::new().emit_rest_sequence(true);
        let out = XmlSerializer::new(options).serialize(&NodeTree::new());
        assert_eq!(
            out,
            "<rest:sequence xmlns:rest=\"https://arbordb.org/rest\"/>"
        );

        let out = XmlSerializer::new(SerializerOptions::new()).serialize(&NodeTree::new());
        assert_eq!(out, "");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let mut tree = NodeTree::new();
        let note = tree.add_node(NodeKind::Element {
            name: "note".into(),
            attributes: vec![("title".into(), "say \"hi\"".into())],
        });
        let text = tree.add_node(NodeKind::Text("3 < 4 & 5 > 2".into()));
        tree.append_child(note, text);
        tree.prepend_children_to_root(&[note]);

        let out = XmlSerializer::new(SerializerOptions::new()).serialize(&tree);
        assert_eq!(
            out,
            "<note title=\"say &quot;hi&quot;\">3 &lt; 4 &amp; 5 &gt; 2</note>"
        );
    }

    #[test]
    fn mixed_content_goes_block_form() {
        let mut tree = NodeTree::new();
        let para = tree.add_node(element("p"));
        let text = tree.add_node(NodeKind::Text("lead".into()));
        let em = tree.add_node(element("em"));
        tree.append_child(para, text);
        tree.append_child(para, em);
        tree.prepend_children_to_root(&[para]);

        let options = SerializerOptions::new().pretty_print(true);
        let out = XmlSerializer::new(options).serialize(&tree);
        assert_eq!(out, "<p>\n  lead\n  <em/>\n</p>");
    }
}
