//! Database directory management.
//!
//! This module handles the file system layout for an ArborDB database:
//!
//! ```text
//! <db_path>/
//! ├─ CONFIG            # DatabaseConfig record (magic-prefixed CBOR)
//! ├─ LOCK              # Advisory lock for single-process access
//! └─ resources/
//!    └─ <resource>/
//!       ├─ CONFIG      # ResourceConfig record
//!       └─ tree.db     # Current revision of the node tree
//! ```
//!
//! The LOCK file ensures only one process can use the database at a time.
//! The database `CONFIG` record is written last during initialization via an
//! atomic rename; its presence is what marks the directory as a registered
//! database, so a crash mid-initialization leaves an unregistered directory
//! that a later creation simply re-initializes.

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File names within the database directory.
const CONFIG_FILE: &str = "CONFIG";
const LOCK_FILE: &str = "LOCK";
const RESOURCES_DIR: &str = "resources";
const TREE_FILE: &str = "tree.db";

/// Validates a database or resource name as a single storage path component.
///
/// Rejects blank names, path separators, NUL bytes and the traversal
/// components `.` and `..`.
pub fn validate_name(name: &str) -> StoreResult<()> {
    if name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StoreError::invalid_name(name));
    }
    Ok(())
}

/// Checks whether `path` holds a registered database.
///
/// Registration is the presence of the `CONFIG` record; a bare directory
/// left by an interrupted initialization does not count.
pub(crate) fn database_registered(path: &Path) -> bool {
    path.join(CONFIG_FILE).exists()
}

/// Writes `data` to `path` atomically.
///
/// Write-then-rename: the bytes land in a uniquely named sibling temp
/// file, are synced, and the temp file is renamed over the target. The
/// temp name is fresh per call, so concurrent writers to one path never
/// share a temp file: each rename publishes only bytes its own writer
/// wrote, and the last complete write wins. The parent directory is
/// fsynced afterwards so the rename itself is durable.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    let temp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));

    let result = write_then_rename(&temp_path, path, data);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> StoreResult<()> {
    let mut file = File::create(temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)?;

    if let Some(parent) = path.parent() {
        sync_dir(parent)?;
    }
    Ok(())
}

/// Syncs a directory so entry creations, renames and deletions are durable.
#[cfg(unix)]
pub(crate) fn sync_dir(path: &Path) -> StoreResult<()> {
    let dir = File::open(path)?;
    dir.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_path: &Path) -> StoreResult<()> {
    // NTFS journaling covers metadata durability; directory fsync is not
    // available on Windows.
    Ok(())
}

/// Manages the database directory structure and file locking.
///
/// # Thread Safety
///
/// A `DatabaseDir` holds an exclusive lock on the database directory.
/// Only one `DatabaseDir` instance can exist per directory at a time.
#[derive(Debug)]
pub struct DatabaseDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DatabaseDir {
    /// Opens or creates a database directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another handle holds the lock (returns `DatabaseLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::invalid_format(format!(
                    "database directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(StoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::DatabaseLocked);
        }

        let dir = Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        };
        fs::create_dir_all(dir.resources_dir())?;
        Ok(dir)
    }

    /// Returns the path to the database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the database `CONFIG` file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Returns the path to the resources directory.
    #[must_use]
    pub fn resources_dir(&self) -> PathBuf {
        self.path.join(RESOURCES_DIR)
    }

    /// Returns the directory of a named resource.
    #[must_use]
    pub fn resource_dir(&self, name: &str) -> PathBuf {
        self.resources_dir().join(name)
    }

    /// Returns the path to a resource's `CONFIG` file.
    #[must_use]
    pub fn resource_config_path(&self, name: &str) -> PathBuf {
        self.resource_dir(name).join(CONFIG_FILE)
    }

    /// Returns the path to a resource's tree file.
    #[must_use]
    pub fn resource_tree_path(&self, name: &str) -> PathBuf {
        self.resource_dir(name).join(TREE_FILE)
    }

    /// Checks whether the directory holds a registered database.
    ///
    /// Registration is the presence of the `CONFIG` record, which is only
    /// ever renamed into place after the directory skeleton exists.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// Loads the database configuration from disk.
    ///
    /// Returns `None` if the `CONFIG` record doesn't exist yet.
    pub fn load_config(&self) -> StoreResult<Option<DatabaseConfig>> {
        let config_path = self.config_path();
        if !config_path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&config_path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        if data.is_empty() {
            return Ok(None);
        }

        let config = DatabaseConfig::decode(&self.path, &data)?;
        Ok(Some(config))
    }

    /// Saves the database configuration to disk atomically.
    pub fn save_config(&self, config: &DatabaseConfig) -> StoreResult<()> {
        atomic_write(&self.config_path(), &config.encode()?)
    }
}
