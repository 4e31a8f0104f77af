//! Database facade over one storage directory.

use crate::config::{DatabaseConfig, ResourceConfig, FORMAT_VERSION};
use crate::dir::{atomic_write, sync_dir, validate_name, DatabaseDir};
use crate::error::{StoreError, StoreResult};
use crate::resource::ResourceSession;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// An open database holding zero or more named resources.
///
/// A `Database` owns its directory's exclusive lock and a cache of open
/// [`ResourceSession`]s. Databases are opened through
/// [`StoreManager`](crate::StoreManager) and shared behind `Arc`.
///
/// # Resource lifecycle
///
/// Resource creation registers the resource by renaming its `CONFIG`
/// record into place after the tree file exists, mirroring database
/// registration: a crash mid-creation leaves an unregistered directory
/// that the next creation overwrites. Removal deletes the resource
/// directory and evicts any cached session.
pub struct Database {
    config: DatabaseConfig,
    dir: DatabaseDir,
    /// Open sessions keyed by resource name.
    sessions: RwLock<HashMap<String, Arc<ResourceSession>>>,
}

impl Database {
    /// Creates or opens the database at `config.path`.
    ///
    /// An unregistered directory is initialized: the skeleton is laid out
    /// first, then the `CONFIG` record is renamed into place to register
    /// the database. An already registered directory keeps its persisted
    /// configuration.
    pub(crate) fn create(config: DatabaseConfig) -> StoreResult<Self> {
        let dir = DatabaseDir::open(&config.path, true)?;

        let config = match dir.load_config()? {
            Some(existing) => {
                Self::check_format(&existing)?;
                existing
            }
            None => {
                dir.save_config(&config)?;
                config
            }
        };

        Ok(Self {
            config,
            dir,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Opens a registered database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the directory is absent or holds no
    /// `CONFIG` record, `DatabaseLocked` if another handle has it open.
    pub(crate) fn open(path: &Path) -> StoreResult<Self> {
        let name = DatabaseConfig::for_path(path).database_name;
        if !path.exists() {
            return Err(StoreError::database_not_found(name));
        }

        let dir = DatabaseDir::open(path, false)?;
        let config = dir
            .load_config()?
            .ok_or_else(|| StoreError::database_not_found(name))?;
        Self::check_format(&config)?;

        Ok(Self {
            config,
            dir,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    fn check_format(config: &DatabaseConfig) -> StoreResult<()> {
        if config.format_version.0 != FORMAT_VERSION.0 {
            return Err(StoreError::invalid_format(format!(
                "incompatible format version: database is v{}.{}, expected v{}.{}",
                config.format_version.0,
                config.format_version.1,
                FORMAT_VERSION.0,
                FORMAT_VERSION.1
            )));
        }
        Ok(())
    }

    /// Returns the database name.
    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.config.database_name
    }

    /// Returns the database directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the database configuration.
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Checks whether a resource is registered under `name`.
    #[must_use]
    pub fn resource_exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.dir.resource_config_path(name).exists()
    }

    /// Creates a new resource.
    ///
    /// The persisted configuration gets a freshly stamped `resource_id`,
    /// so recreation under a previously used name yields an observably new
    /// resource.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExists` if `name` is already registered. This is
    /// the recoverable case: remove the occupant and create again.
    pub fn create_resource(&self, config: &ResourceConfig) -> StoreResult<()> {
        let name = &config.resource_name;
        validate_name(name)?;

        let mut sessions = self.sessions.write();
        if self.resource_exists(name) {
            return Err(StoreError::resource_exists(name.clone()));
        }

        let stamped = config.with_fresh_id();
        fs::create_dir_all(self.dir.resource_dir(name))?;
        ResourceSession::write_initial_tree(&self.dir.resource_tree_path(name))?;
        // Registration barrier: the CONFIG rename lands last.
        atomic_write(&self.dir.resource_config_path(name), &stamped.encode()?)?;

        // A session cached from a removed predecessor must not shadow the
        // new resource.
        sessions.remove(name);
        Ok(())
    }

    /// Removes a resource and its entire tree.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if `name` is not registered.
    pub fn remove_resource(&self, name: &str) -> StoreResult<()> {
        validate_name(name)?;

        let mut sessions = self.sessions.write();
        if !self.resource_exists(name) {
            return Err(StoreError::resource_not_found(name));
        }

        if sessions.remove(name).is_some() {
            warn!(
                database = %self.config.database_name,
                resource = %name,
                "removing resource with an open session"
            );
        }

        fs::remove_dir_all(self.dir.resource_dir(name))?;
        sync_dir(&self.dir.resources_dir())?;
        Ok(())
    }

    /// Returns the session for a registered resource, opening it on first
    /// use.
    pub fn resource_session(&self, name: &str) -> StoreResult<Arc<ResourceSession>> {
        validate_name(name)?;

        if let Some(session) = self.sessions.read().get(name) {
            return Ok(Arc::clone(session));
        }

        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(name) {
            return Ok(Arc::clone(session));
        }

        if !self.resource_exists(name) {
            return Err(StoreError::resource_not_found(name));
        }

        let data = fs::read(self.dir.resource_config_path(name))?;
        let config = ResourceConfig::decode(&data)?;
        let session = Arc::new(ResourceSession::open(
            config,
            self.dir.resource_tree_path(name),
        )?);
        sessions.insert(name.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Lists registered resource names in sorted order.
    pub fn list_resources(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir.resources_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && self.resource_exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Drops all cached sessions.
    pub(crate) fn close(&self) {
        self.sessions.write().clear();
    }
}
