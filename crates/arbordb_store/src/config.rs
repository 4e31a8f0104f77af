//! Database and resource configuration records.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Current on-disk format version (major, minor).
pub const FORMAT_VERSION: (u16, u16) = (1, 0);

/// Magic bytes for a database `CONFIG` file.
pub const DATABASE_CONFIG_MAGIC: [u8; 4] = *b"ADBC";

/// Magic bytes for a resource `CONFIG` file.
pub const RESOURCE_CONFIG_MAGIC: [u8; 4] = *b"ARSC";

/// Configuration of a database at a storage location.
///
/// The name and format version are persisted as the database's `CONFIG`
/// record; the presence of that record is what marks the location as a
/// registered database. The path itself is runtime state and is never
/// written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Location of the database directory.
    pub path: PathBuf,
    /// Logical database name.
    pub database_name: String,
    /// Format version (major, minor).
    pub format_version: (u16, u16),
}

/// Persisted portion of [`DatabaseConfig`].
#[derive(Serialize, Deserialize)]
struct DatabaseConfigRecord {
    database_name: String,
    format_version: (u16, u16),
}

impl DatabaseConfig {
    /// Builds the configuration for a database directory path.
    ///
    /// The database name is taken from the final path component.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let database_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            database_name,
            format_version: FORMAT_VERSION,
        }
    }

    /// Encodes the persisted record to bytes.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let record = DatabaseConfigRecord {
            database_name: self.database_name.clone(),
            format_version: self.format_version,
        };
        let mut buf = Vec::new();
        buf.extend_from_slice(&DATABASE_CONFIG_MAGIC);
        ciborium::ser::into_writer(&record, &mut buf)
            .map_err(|err| StoreError::corrupt(format!("database config encode: {err}")))?;
        Ok(buf)
    }

    /// Decodes a persisted record read from `path`'s `CONFIG` file.
    pub fn decode(path: &Path, data: &[u8]) -> StoreResult<Self> {
        if data.len() < 4 || data[0..4] != DATABASE_CONFIG_MAGIC {
            return Err(StoreError::invalid_format("invalid database config magic"));
        }
        let record: DatabaseConfigRecord = ciborium::de::from_reader(&data[4..])
            .map_err(|err| StoreError::corrupt(format!("database config decode: {err}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            database_name: record.database_name,
            format_version: record.format_version,
        })
    }
}

/// Configuration of a resource within a database.
///
/// The whole record is persisted as the resource's `CONFIG` file. The
/// `resource_id` is stamped freshly on every creation, so a removed and
/// recreated resource is observably a new resource even under the same
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource name, unique within its database.
    pub resource_name: String,
    /// Identity of this incarnation of the resource.
    pub resource_id: Uuid,
    /// Format version (major, minor).
    pub format_version: (u16, u16),
}

impl ResourceConfig {
    /// Creates a configuration for a new resource.
    #[must_use]
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            resource_id: Uuid::new_v4(),
            format_version: FORMAT_VERSION,
        }
    }

    /// Sets the format version.
    #[must_use]
    pub fn format_version(mut self, version: (u16, u16)) -> Self {
        self.format_version = version;
        self
    }

    /// Returns a copy of this configuration with a freshly stamped
    /// resource ID.
    #[must_use]
    pub fn with_fresh_id(&self) -> Self {
        Self {
            resource_id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Encodes the record to bytes.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&RESOURCE_CONFIG_MAGIC);
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|err| StoreError::corrupt(format!("resource config encode: {err}")))?;
        Ok(buf)
    }

    /// Decodes a record from bytes.
    pub fn decode(data: &[u8]) -> StoreResult<Self> {
        if data.len() < 4 || data[0..4] != RESOURCE_CONFIG_MAGIC {
            return Err(StoreError::invalid_format("invalid resource config magic"));
        }
        ciborium::de::from_reader(&data[4..])
            .map_err(|err| StoreError::corrupt(format!("resource config decode: {err}")))
    }
}
