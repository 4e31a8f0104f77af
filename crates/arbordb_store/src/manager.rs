//! Open-database registry.

use crate::config::DatabaseConfig;
use crate::database::Database;
use crate::dir::{database_registered, sync_dir, validate_name};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Registry of open databases under one storage root.
///
/// A `StoreManager` is created once at process start and passed around by
/// `Arc`; there is no process-global registry. Databases are opened once
/// and cached by path until [`close_all`](Self::close_all). Cross-process
/// exclusivity comes from each database's advisory lock file.
pub struct StoreManager {
    root: PathBuf,
    /// Open databases keyed by directory path.
    databases: RwLock<HashMap<PathBuf, Arc<Database>>>,
}

impl StoreManager {
    /// Creates a manager over the given storage root.
    ///
    /// The root directory is created lazily by the first database
    /// creation beneath it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            databases: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a database name to its directory path under the root.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for names that are not a single clean path
    /// component.
    pub fn database_path(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Checks whether a registered database exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        database_registered(path)
    }

    /// Creates the database described by `config`, or opens it if it is
    /// already registered.
    ///
    /// Idempotent: repeated calls for the same path return the same open
    /// handle without duplicating initialization work. Concurrent callers
    /// are serialized on the registry lock.
    pub fn create(&self, config: DatabaseConfig) -> StoreResult<Arc<Database>> {
        validate_name(&config.database_name)?;

        let mut databases = self.databases.write();
        if let Some(db) = databases.get(&config.path) {
            return Ok(Arc::clone(db));
        }

        let path = config.path.clone();
        let db = Arc::new(Database::create(config)?);
        databases.insert(path, Arc::clone(&db));
        Ok(db)
    }

    /// Opens the registered database at `path`, reusing the cached handle
    /// if it is already open.
    pub fn open(&self, path: &Path) -> StoreResult<Arc<Database>> {
        if let Some(db) = self.databases.read().get(path) {
            return Ok(Arc::clone(db));
        }

        let mut databases = self.databases.write();
        if let Some(db) = databases.get(path) {
            return Ok(Arc::clone(db));
        }

        let db = Arc::new(Database::open(path)?);
        databases.insert(path.to_path_buf(), Arc::clone(&db));
        Ok(db)
    }

    /// Removes the database at `path` from durable storage.
    ///
    /// The cached handle, if any, is closed and evicted first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if nothing exists at `path`.
    pub fn remove(&self, path: &Path) -> StoreResult<()> {
        let mut databases = self.databases.write();

        if let Some(db) = databases.remove(path) {
            db.close();
            if Arc::strong_count(&db) > 1 {
                warn!(
                    database = %db.database_name(),
                    "removing database while other handles are live"
                );
            }
        }

        if !path.exists() {
            let name = DatabaseConfig::for_path(path).database_name;
            return Err(StoreError::database_not_found(name));
        }

        fs::remove_dir_all(path)?;
        if let Some(parent) = path.parent() {
            if parent.exists() {
                sync_dir(parent)?;
            }
        }
        Ok(())
    }

    /// Closes every open database and clears the registry.
    ///
    /// Advisory locks are released as the last handle to each database is
    /// dropped.
    pub fn close_all(&self) {
        let mut databases = self.databases.write();
        for db in databases.values() {
            db.close();
        }
        databases.clear();
    }

    /// Returns the number of open databases.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.databases.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_registers_database() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("catalog").unwrap();

        assert!(!manager.exists(&path));
        manager.create(DatabaseConfig::for_path(&path)).unwrap();
        assert!(manager.exists(&path));
    }

    #[test]
    fn create_is_idempotent() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("catalog").unwrap();

        let first = manager.create(DatabaseConfig::for_path(&path)).unwrap();
        let second = manager.create(DatabaseConfig::for_path(&path)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.open_count(), 1);
    }

    #[test]
    fn open_reuses_cached_handle() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("catalog").unwrap();

        let created = manager.create(DatabaseConfig::for_path(&path)).unwrap();
        let opened = manager.open(&path).unwrap();
        assert!(Arc::ptr_eq(&created, &opened));
    }

    #[test]
    fn open_missing_database_fails() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("ghost").unwrap();

        let result = manager.open(&path);
        assert!(matches!(result, Err(StoreError::DatabaseNotFound { .. })));
    }

    #[test]
    fn remove_deletes_storage() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("catalog").unwrap();

        manager.create(DatabaseConfig::for_path(&path)).unwrap();
        manager.remove(&path).unwrap();

        assert!(!manager.exists(&path));
        assert!(!path.exists());
        assert!(matches!(
            manager.remove(&path),
            Err(StoreError::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn close_all_releases_locks() {
        let temp = tempdir().unwrap();
        let path;
        {
            let manager = StoreManager::new(temp.path());
            path = manager.database_path("catalog").unwrap();
            manager.create(DatabaseConfig::for_path(&path)).unwrap();
            manager.close_all();
            assert_eq!(manager.open_count(), 0);
        }

        let manager = StoreManager::new(temp.path());
        manager.open(&path).unwrap();
    }

    #[test]
    fn database_path_rejects_traversal() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());

        assert!(matches!(
            manager.database_path("../outside"),
            Err(StoreError::InvalidName { .. })
        ));
        assert!(matches!(
            manager.database_path(""),
            Err(StoreError::InvalidName { .. })
        ));
    }
}
