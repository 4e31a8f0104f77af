//! Error types for the ingestion pipeline.

use arbordb_store::StoreError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a creation request.
///
/// Each variant names the pipeline stage that failed, so callers can
/// map a failure to a status class without inspecting the source chain.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request rejected before any storage work started.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Database or resource provisioning failed.
    #[error("provisioning failed: {0}")]
    Provision(#[source] StoreError),

    /// Parsing or inserting the document failed.
    #[error("ingest failed: {0}")]
    Ingest(#[source] StoreError),

    /// Serializing the stored tree failed.
    #[error("serialization failed: {0}")]
    Serialize(#[source] StoreError),

    /// A blocking worker task panicked or was cancelled.
    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl ServerError {
    /// Creates a validation error from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        ServerError::Validation(message.into())
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::Validation(_) => true,
            ServerError::Provision(source)
            | ServerError::Ingest(source)
            | ServerError::Serialize(source) => matches!(
                source,
                StoreError::Xml(_)
                    | StoreError::InvalidName { .. }
                    | StoreError::DatabaseNotFound { .. }
                    | StoreError::ResourceNotFound { .. }
            ),
            ServerError::TaskFailed(_) => false,
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::validation("missing database name").is_client_error());
        assert!(ServerError::TaskFailed("worker panicked".into()).is_server_error());
        assert!(!ServerError::validation("missing database name").is_server_error());
    }

    #[test]
    fn store_errors_classify_by_source() {
        let bad_doc = ServerError::Ingest(StoreError::Xml(arbordb_xml::XmlError::malformed(
            0,
            "unexpected byte",
        )));
        assert!(bad_doc.is_client_error());

        let corrupt = ServerError::Serialize(StoreError::corrupt("truncated tree record"));
        assert!(corrupt.is_server_error());
    }

    #[test]
    fn error_display_names_the_stage() {
        let err = ServerError::Provision(StoreError::resource_exists("shredded"));
        assert!(err.to_string().starts_with("provisioning failed"));
    }
}
