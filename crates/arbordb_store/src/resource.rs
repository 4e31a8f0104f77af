//! Resource sessions.

use crate::config::ResourceConfig;
use crate::dir::atomic_write;
use crate::error::{StoreError, StoreResult};
use crate::transaction::WriteTransaction;
use crate::tree::NodeTree;
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// An open session against one named resource.
///
/// The session owns the resource's current tree snapshot and its writer
/// lock. Readers get cheap `Arc` snapshots via [`read_tree`](Self::read_tree);
/// writers take the single per-resource [`WriteTransaction`] via
/// [`begin_write`](Self::begin_write). Sessions are shared behind `Arc` and
/// cached by their [`Database`](crate::Database).
pub struct ResourceSession {
    config: ResourceConfig,
    tree_path: PathBuf,
    /// Latest committed tree, published atomically on commit.
    current: RwLock<Arc<NodeTree>>,
    /// Per-resource single-writer lock, held by the open transaction.
    write_lock: Mutex<()>,
}

impl ResourceSession {
    /// Opens a session by loading the resource's current tree from disk.
    pub(crate) fn open(config: ResourceConfig, tree_path: PathBuf) -> StoreResult<Self> {
        if !tree_path.exists() {
            return Err(StoreError::corrupt(format!(
                "missing tree file: {}",
                tree_path.display()
            )));
        }
        let data = fs::read(&tree_path)?;
        let tree = NodeTree::decode(&data)?;

        Ok(Self {
            config,
            tree_path,
            current: RwLock::new(Arc::new(tree)),
            write_lock: Mutex::new(()),
        })
    }

    /// Writes the initial empty tree (document root only) for a new resource.
    pub(crate) fn write_initial_tree(tree_path: &Path) -> StoreResult<()> {
        atomic_write(tree_path, &NodeTree::new().encode()?)
    }

    /// Returns the resource configuration.
    #[must_use]
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.config.resource_name
    }

    /// Returns the identity of this incarnation of the resource.
    #[must_use]
    pub fn resource_id(&self) -> Uuid {
        self.config.resource_id
    }

    /// Returns a snapshot of the current committed tree.
    #[must_use]
    pub fn read_tree(&self) -> Arc<NodeTree> {
        Arc::clone(&self.current.read())
    }

    /// Begins a write transaction.
    ///
    /// Blocks until the resource's writer lock is available. The returned
    /// transaction holds the lock until committed or dropped.
    #[must_use]
    pub fn begin_write(&self) -> WriteTransaction<'_> {
        let guard = self.write_lock.lock();
        let tree = self.read_tree().as_ref().clone();
        WriteTransaction::new(self, tree, guard)
    }

    /// Persists `tree` durably and publishes it to readers.
    ///
    /// Persistence is an atomic temp-file rename of the complete encoding;
    /// readers never observe a partially written tree. Publication happens
    /// only after the rename succeeds.
    pub(crate) fn persist_and_publish(&self, tree: NodeTree) -> StoreResult<()> {
        atomic_write(&self.tree_path, &tree.encode()?)?;
        *self.current.write() = Arc::new(tree);
        Ok(())
    }
}
