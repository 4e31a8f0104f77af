//! Creation request handler.
//!
//! One handler instance serves either single-resource requests or batch
//! requests; the mode is fixed at construction. Every storage step runs
//! on the blocking pool via the [`Dispatcher`], one closure per pipeline
//! stage, so a request holds no storage locks across awaits.

use crate::dispatch::Dispatcher;
use crate::error::{ServerError, ServerResult};
use crate::request::{CreateRequest, CreateResponse, Upload};
use arbordb_store::serialize::{SerializerOptions, XmlSerializer};
use arbordb_store::{validate_name, DatabaseConfig, ResourceConfig, StoreError, StoreManager};
use arbordb_xml::XmlTokenReader;
use std::sync::Arc;
use tracing::{debug, info};

/// Handles requests that create databases and ingest resources.
pub struct CreateHandler {
    manager: Arc<StoreManager>,
    dispatcher: Dispatcher,
    /// Batch mode: read uploads instead of `resource`/`body`.
    create_multiple_resources: bool,
}

impl CreateHandler {
    /// Creates a handler for single-resource requests.
    pub fn new(manager: Arc<StoreManager>, dispatcher: Dispatcher) -> Self {
        Self {
            manager,
            dispatcher,
            create_multiple_resources: false,
        }
    }

    /// Creates a handler that stores one resource per upload.
    pub fn for_multiple_resources(manager: Arc<StoreManager>, dispatcher: Dispatcher) -> Self {
        Self {
            manager,
            dispatcher,
            create_multiple_resources: true,
        }
    }

    /// Handles one creation request.
    ///
    /// Names and the document body are validated before any storage work
    /// is dispatched; a rejected request leaves no trace on disk.
    pub async fn handle(&self, request: CreateRequest) -> ServerResult<CreateResponse> {
        let database = match request.database.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return Err(ServerError::validation("database name is required")),
        };
        valid_name(&database)?;

        if self.create_multiple_resources {
            return self.create_all(&database, request.uploads).await;
        }

        match request.resource {
            None => {
                self.ensure_database(&database).await?;
                Ok(CreateResponse::empty())
            }
            Some(resource) => {
                valid_name(&resource)?;
                let body = match request.body {
                    Some(body) if !body.trim().is_empty() => body,
                    _ => return Err(ServerError::validation("document body is required")),
                };
                self.create_one(&database, &resource, body).await
            }
        }
    }

    /// Full single-resource pipeline: ensure, provision, ingest, serialize.
    async fn create_one(
        &self,
        database: &str,
        resource: &str,
        body: String,
    ) -> ServerResult<CreateResponse> {
        let config = self.ensure_database(database).await?;
        self.create_or_replace_resource(&config, resource).await?;
        self.ingest_resource(&config, resource, body).await?;
        let serialized = self.serialize_resource(&config, resource).await?;
        Ok(CreateResponse::with_body(serialized))
    }

    /// Batch pipeline: ensure the database once, then store each upload.
    ///
    /// Uploads are processed in order; the first failure stops the batch
    /// and leaves earlier entries in place. No serialized response is
    /// produced.
    async fn create_all(&self, database: &str, uploads: Vec<Upload>) -> ServerResult<CreateResponse> {
        for upload in &uploads {
            valid_name(&upload.file_name)?;
        }

        let config = self.ensure_database(database).await?;
        for upload in uploads {
            self.create_or_replace_resource(&config, &upload.file_name)
                .await?;
            self.ingest_resource(&config, &upload.file_name, upload.content)
                .await?;
        }
        Ok(CreateResponse::empty())
    }

    /// Creates the database if it is not registered yet.
    ///
    /// Safe to call concurrently for the same name; initialization is
    /// serialized inside the store manager.
    async fn ensure_database(&self, database: &str) -> ServerResult<DatabaseConfig> {
        let manager = Arc::clone(&self.manager);
        let name = database.to_string();
        self.dispatcher
            .run_blocking(move || {
                let path = manager.database_path(&name).map_err(ServerError::Provision)?;
                let config = DatabaseConfig::for_path(&path);
                if manager.exists(&path) {
                    debug!(database = %name, "database already registered");
                } else {
                    manager.create(config.clone()).map_err(ServerError::Provision)?;
                    info!(database = %name, "database created");
                }
                Ok(config)
            })
            .await
    }

    /// Creates the resource, replacing any previous occupant of the name.
    ///
    /// The replacement resource gets a fresh identity; readers can tell a
    /// replaced resource from the one it displaced.
    async fn create_or_replace_resource(
        &self,
        config: &DatabaseConfig,
        resource: &str,
    ) -> ServerResult<()> {
        let manager = Arc::clone(&self.manager);
        let path = config.path.clone();
        let name = resource.to_string();
        self.dispatcher
            .run_blocking(move || {
                let db = manager.open(&path).map_err(ServerError::Provision)?;
                let resource_config = ResourceConfig::new(&name);
                match db.create_resource(&resource_config) {
                    Err(StoreError::ResourceExists { .. }) => {
                        db.remove_resource(&name).map_err(ServerError::Provision)?;
                        db.create_resource(&resource_config)
                            .map_err(ServerError::Provision)?;
                        info!(database = %db.database_name(), resource = %name, "resource replaced");
                    }
                    result => {
                        result.map_err(ServerError::Provision)?;
                        debug!(database = %db.database_name(), resource = %name, "resource created");
                    }
                }
                Ok(())
            })
            .await
    }

    /// Parses the document and stores it as the resource's first child.
    ///
    /// Parse and insertion run inside one write transaction; any failure
    /// rolls the resource back to its previous published tree.
    async fn ingest_resource(
        &self,
        config: &DatabaseConfig,
        resource: &str,
        body: String,
    ) -> ServerResult<()> {
        let manager = Arc::clone(&self.manager);
        let path = config.path.clone();
        let name = resource.to_string();
        self.dispatcher
            .run_blocking(move || {
                let db = manager.open(&path).map_err(ServerError::Ingest)?;
                let session = db.resource_session(&name).map_err(ServerError::Ingest)?;
                let mut txn = session.begin_write();
                let inserted = txn
                    .insert_subtree_as_first_child(XmlTokenReader::new(&body))
                    .map_err(ServerError::Ingest)?;
                txn.commit().map_err(ServerError::Ingest)?;
                debug!(resource = %name, nodes = inserted, "document ingested");
                Ok(())
            })
            .await
    }

    /// Serializes the stored tree with identifiers and REST wrappers.
    async fn serialize_resource(
        &self,
        config: &DatabaseConfig,
        resource: &str,
    ) -> ServerResult<Vec<u8>> {
        let manager = Arc::clone(&self.manager);
        let path = config.path.clone();
        let name = resource.to_string();
        self.dispatcher
            .run_blocking(move || {
                let db = manager.open(&path).map_err(ServerError::Serialize)?;
                let session = db.resource_session(&name).map_err(ServerError::Serialize)?;
                let tree = session.read_tree();
                let serializer = XmlSerializer::new(SerializerOptions::full());
                Ok(serializer.serialize(&tree).into_bytes())
            })
            .await
    }
}

fn valid_name(name: &str) -> ServerResult<()> {
    validate_name(name).map_err(|err| ServerError::Validation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn handler_at(root: &std::path::Path) -> CreateHandler {
        let manager = Arc::new(StoreManager::new(root));
        CreateHandler::new(manager, Dispatcher::current())
    }

    #[tokio::test]
    async fn missing_database_name_is_rejected() {
        let dir = tempdir().unwrap();
        let handler = handler_at(dir.path());

        let result = handler.handle(CreateRequest::default()).await;
        assert!(matches!(result, Err(ServerError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_body_is_rejected_before_any_storage_work() {
        let dir = tempdir().unwrap();
        let handler = handler_at(dir.path());

        let request = CreateRequest::single("shop", "inventory", "   \n  ");
        let result = handler.handle(request).await;
        assert!(matches!(result, Err(ServerError::Validation(_))));

        // The storage root was never touched.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn path_like_resource_name_is_rejected() {
        let dir = tempdir().unwrap();
        let handler = handler_at(dir.path());

        let request = CreateRequest::single("shop", "../escape", "<a/>");
        let result = handler.handle(request).await;
        assert!(matches!(result, Err(ServerError::Validation(_))));
    }

    #[tokio::test]
    async fn database_only_request_returns_empty_response() {
        let dir = tempdir().unwrap();
        let handler = handler_at(dir.path());

        let response = handler
            .handle(CreateRequest::database_only("shop"))
            .await
            .unwrap();
        assert_eq!(response.body, None);
        assert!(dir.path().join("shop").is_dir());
    }
}
