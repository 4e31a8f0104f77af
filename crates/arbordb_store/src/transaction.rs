//! Write transactions over a resource's tree.

use crate::error::{StoreError, StoreResult};
use crate::resource::ResourceSession;
use crate::tree::{NodeKey, NodeKind, NodeTree};
use arbordb_xml::{XmlResult, XmlToken};
use parking_lot::MutexGuard;

/// An exclusive write transaction over one resource's tree.
///
/// The transaction holds the resource's writer lock for as long as it is
/// alive, so at most one write transaction exists per resource at a time.
/// Mutations happen on a private working copy of the tree: nothing is
/// visible to readers or persisted until [`commit`](Self::commit) succeeds.
/// Dropping an uncommitted transaction rolls back: the working copy is
/// discarded and the writer lock released, leaving the resource in its
/// pre-transaction state.
pub struct WriteTransaction<'a> {
    session: &'a ResourceSession,
    /// Private working copy; published on commit.
    tree: NodeTree,
    closed: bool,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(
        session: &'a ResourceSession,
        tree: NodeTree,
        guard: MutexGuard<'a, ()>,
    ) -> Self {
        Self {
            session,
            tree,
            closed: false,
            _guard: guard,
        }
    }

    /// Checks if the transaction can still perform operations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.closed
    }

    /// Returns the working copy of the tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Returns the node count of the working copy.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    /// Streams a token sequence into the tree as the first children of the
    /// document root.
    ///
    /// Tokens are consumed incrementally; the document is never materialized
    /// outside the tree being built. Top-level fragments occupy child
    /// positions `0..n` of the root in document order, and prior children
    /// keep their relative order after the inserted block.
    ///
    /// On any token error the working copy is restored to its state before
    /// this call and the error is returned; the transaction stays active.
    ///
    /// Returns the number of nodes inserted.
    ///
    /// # Errors
    ///
    /// Returns `TransactionClosed` after a commit, or the underlying
    /// tokenizer error.
    pub fn insert_subtree_as_first_child<I>(&mut self, tokens: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = XmlResult<XmlToken>>,
    {
        self.ensure_active()?;

        let mut created = Vec::new();
        let mut top_level = Vec::new();

        match self.build_fragments(tokens, &mut created, &mut top_level) {
            Ok(()) => {
                self.tree.prepend_children_to_root(&top_level);
                Ok(created.len())
            }
            Err(err) => {
                self.tree.discard(&created);
                Err(err)
            }
        }
    }

    /// Builds detached fragments from the token stream.
    ///
    /// `created` collects every node added (for rollback); `top_level`
    /// collects the fragment roots in document order (for the final splice).
    fn build_fragments<I>(
        &mut self,
        tokens: I,
        created: &mut Vec<NodeKey>,
        top_level: &mut Vec<NodeKey>,
    ) -> StoreResult<()>
    where
        I: IntoIterator<Item = XmlResult<XmlToken>>,
    {
        let mut open: Vec<NodeKey> = Vec::new();

        for token in tokens {
            match token? {
                XmlToken::StartElement { name, attributes } => {
                    let key = self.tree.add_node(NodeKind::Element { name, attributes });
                    created.push(key);
                    match open.last() {
                        Some(&parent) => self.tree.append_child(parent, key),
                        None => top_level.push(key),
                    }
                    open.push(key);
                }
                XmlToken::EndElement { .. } => {
                    open.pop();
                }
                XmlToken::Text(text) => {
                    let key = self.tree.add_node(NodeKind::Text(text));
                    created.push(key);
                    match open.last() {
                        Some(&parent) => self.tree.append_child(parent, key),
                        None => top_level.push(key),
                    }
                }
            }
        }
        Ok(())
    }

    /// Persists the working copy durably and publishes it to readers.
    ///
    /// The transaction is closed whether or not persistence succeeds; a
    /// failed commit publishes nothing and is not retried.
    pub fn commit(&mut self) -> StoreResult<()> {
        self.ensure_active()?;
        self.closed = true;

        let tree = std::mem::take(&mut self.tree);
        self.session.persist_and_publish(tree)
    }

    /// Discards the working copy without persisting.
    ///
    /// Equivalent to dropping the transaction.
    pub fn rollback(&mut self) {
        self.closed = true;
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::TransactionClosed)
        } else {
            Ok(())
        }
    }
}
