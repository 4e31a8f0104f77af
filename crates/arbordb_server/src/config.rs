//! Server configuration.

use std::path::PathBuf;

/// Configuration for the ingestion server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory under which all databases are stored.
    pub storage_root: PathBuf,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// Sets the storage root.
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("arbordb-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.storage_root, PathBuf::from("arbordb-data"));
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::default().with_storage_root("/tmp/stores");
        assert_eq!(config.storage_root, PathBuf::from("/tmp/stores"));
    }
}
