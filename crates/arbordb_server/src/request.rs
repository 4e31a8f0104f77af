//! Request and response values for the creation endpoint.

/// A request to create a database, a resource, or both.
///
/// The `database` name is always required. With no `resource` the request
/// only ensures the database exists. With a `resource` the `body` carries
/// the document to ingest. Batch handlers read `uploads` instead of
/// `resource`/`body`.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Target database name.
    pub database: Option<String>,
    /// Target resource name (single-resource mode).
    pub resource: Option<String>,
    /// Document text to ingest (single-resource mode).
    pub body: Option<String>,
    /// Uploaded documents (batch mode), one resource per upload.
    pub uploads: Vec<Upload>,
}

impl CreateRequest {
    /// Creates a request that only ensures the database exists.
    pub fn database_only(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::default()
        }
    }

    /// Creates a single-resource ingestion request.
    pub fn single(
        database: impl Into<String>,
        resource: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            database: Some(database.into()),
            resource: Some(resource.into()),
            body: Some(body.into()),
            uploads: Vec::new(),
        }
    }

    /// Creates a batch ingestion request.
    pub fn batch(database: impl Into<String>, uploads: Vec<Upload>) -> Self {
        Self {
            database: Some(database.into()),
            resource: None,
            body: None,
            uploads,
        }
    }
}

/// One uploaded document in a batch request.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Resource name the document is stored under.
    pub file_name: String,
    /// Document text.
    pub content: String,
}

impl Upload {
    /// Creates an upload.
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Response to a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResponse {
    /// Serialized form of the stored resource, when one was ingested.
    pub body: Option<Vec<u8>>,
}

impl CreateResponse {
    /// A response with no payload.
    pub(crate) fn empty() -> Self {
        Self { body: None }
    }

    /// A response carrying the serialized resource.
    pub(crate) fn with_body(body: Vec<u8>) -> Self {
        Self { body: Some(body) }
    }

    /// Returns the payload as text, if present and valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}
