//! Error types for the ArborDB storage engine.

use std::io;
use thiserror::Error;

/// Result type for storage engine operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage engine operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document tokenizer error during ingestion.
    #[error("document error: {0}")]
    Xml(#[from] arbordb_xml::XmlError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Database is already open in another process.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// Database not found on durable storage.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Name of the database.
        name: String,
    },

    /// Resource already exists within the database.
    ///
    /// This is the only creation failure callers may recover from by
    /// removing the occupant and creating again.
    #[error("resource already exists: {name}")]
    ResourceExists {
        /// Name of the resource.
        name: String,
    },

    /// Resource not found within the database.
    #[error("resource not found: {name}")]
    ResourceNotFound {
        /// Name of the resource.
        name: String,
    },

    /// Database or resource name is not usable as a storage location.
    #[error("invalid name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Invalid file format or incompatible version.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("corrupt data: {message}")]
    Corrupt {
        /// Description of the corruption.
        message: String,
    },

    /// Operation on a transaction that was already committed.
    #[error("transaction is closed")]
    TransactionClosed,
}

impl StoreError {
    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a corrupt data error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Creates a database not found error.
    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::DatabaseNotFound { name: name.into() }
    }

    /// Creates a resource already exists error.
    pub fn resource_exists(name: impl Into<String>) -> Self {
        Self::ResourceExists { name: name.into() }
    }

    /// Creates a resource not found error.
    pub fn resource_not_found(name: impl Into<String>) -> Self {
        Self::ResourceNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_names() {
        let err = StoreError::resource_exists("shredded");
        assert!(err.to_string().contains("shredded"));

        let err = StoreError::invalid_name("../escape");
        assert!(err.to_string().contains("../escape"));
    }

    #[test]
    fn xml_errors_convert() {
        let xml = arbordb_xml::XmlError::unexpected_eof("inside start tag");
        let err = StoreError::from(xml);
        assert!(matches!(err, StoreError::Xml(_)));
    }
}
