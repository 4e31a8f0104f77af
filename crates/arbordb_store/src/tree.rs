//! Node tree representation and persistence.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Magic bytes for a tree file.
pub const TREE_MAGIC: [u8; 4] = *b"ATRE";

/// Key of the document root node in every tree.
pub const ROOT_KEY: NodeKey = NodeKey(0);

/// Unique identifier for a node within one resource's tree.
///
/// Keys are assigned monotonically and never reused within a resource's
/// lifetime. The document root is always key 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// Creates a new node key.
    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }

    /// Returns the raw key value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Content carried by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The document root. Exactly one per tree, always at [`ROOT_KEY`];
    /// never appears below the root.
    Document,
    /// An element.
    Element {
        /// Element name.
        name: String,
        /// Attributes in document order.
        attributes: Vec<(String, String)>,
    },
    /// A run of character data.
    Text(String),
}

/// A single node with its structural links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Parent key. `None` for the document root and for nodes not yet
    /// attached to it.
    pub parent: Option<NodeKey>,
    /// Child keys in document order.
    pub children: Vec<NodeKey>,
    /// Node content.
    pub kind: NodeKind,
}

/// The persisted document structure of one resource.
///
/// Exactly one root node exists per tree; ingested content always hangs
/// below it. Nodes are keyed by [`NodeKey`] in a sorted map so the encoded
/// representation is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
    /// Next key to assign.
    next_key: u64,
    /// All nodes, including the root.
    nodes: BTreeMap<NodeKey, Node>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates a tree holding only the document root.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ROOT_KEY,
            Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            },
        );
        Self { next_key: 1, nodes }
    }

    /// Returns the key of the document root.
    #[must_use]
    pub fn root(&self) -> NodeKey {
        ROOT_KEY
    }

    /// Looks up a node by key.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    /// Returns the number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a detached node and returns its key.
    ///
    /// The node is reachable by key but not linked to the root until it is
    /// attached through [`append_child`](Self::append_child) or
    /// [`prepend_children_to_root`](Self::prepend_children_to_root).
    pub(crate) fn add_node(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(
            key,
            Node {
                parent: None,
                children: Vec::new(),
                kind,
            },
        );
        key
    }

    /// Links `child` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeKey, child: NodeKey) {
        debug_assert!(self.nodes.contains_key(&parent));
        debug_assert!(self.nodes.contains_key(&child));
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    /// Splices `keys` in as the first children of the root, in order.
    ///
    /// Existing children keep their relative order after the inserted block.
    pub(crate) fn prepend_children_to_root(&mut self, keys: &[NodeKey]) {
        for &key in keys {
            if let Some(node) = self.nodes.get_mut(&key) {
                node.parent = Some(ROOT_KEY);
            }
        }
        if let Some(root) = self.nodes.get_mut(&ROOT_KEY) {
            root.children.splice(0..0, keys.iter().copied());
        }
    }

    /// Removes nodes that were added but never attached to the root.
    ///
    /// Key numbering is not rewound: keys are never reused.
    pub(crate) fn discard(&mut self, keys: &[NodeKey]) {
        for key in keys {
            self.nodes.remove(key);
        }
    }

    /// Encodes the tree to bytes.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&TREE_MAGIC);
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|err| StoreError::corrupt(format!("tree encode: {err}")))?;
        Ok(buf)
    }

    /// Decodes a tree from bytes.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        if data.len() < 4 || data[0..4] != TREE_MAGIC {
            return Err(StoreError::invalid_format("invalid tree magic"));
        }
        let tree: Self = ciborium::de::from_reader(&data[4..])
            .map_err(|err| StoreError::corrupt(format!("tree decode: {err}")))?;
        if !tree.nodes.contains_key(&ROOT_KEY) {
            return Err(StoreError::corrupt("tree has no document root"));
        }
        Ok(tree)
    }
}
