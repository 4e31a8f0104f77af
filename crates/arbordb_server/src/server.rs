//! Ingestion server facade.

use crate::config::ServerConfig;
use crate::create::CreateHandler;
use crate::dispatch::Dispatcher;
use crate::error::ServerResult;
use crate::request::{CreateRequest, CreateResponse};
use arbordb_store::StoreManager;
use std::sync::Arc;

/// The ingestion server.
///
/// Owns the store manager for one storage root and exposes the creation
/// pipeline in both single-resource and batch form. Transport is out of
/// scope; an HTTP layer would decode its requests into [`CreateRequest`]
/// values and call [`create`](Self::create) or
/// [`create_multiple`](Self::create_multiple).
///
/// # Example
///
/// ```
/// use arbordb_server::{CreateRequest, Server, ServerConfig};
///
/// # async fn run() -> arbordb_server::ServerResult<()> {
/// let server = Server::new(ServerConfig::new("/var/lib/arbordb"));
/// let response = server
///     .create(CreateRequest::single("shop", "inventory", "<items/>"))
///     .await?;
/// assert!(response.body.is_some());
/// # Ok(())
/// # }
/// ```
pub struct Server {
    manager: Arc<StoreManager>,
    single: CreateHandler,
    batch: CreateHandler,
}

impl Server {
    /// Creates a server over the configured storage root.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime. Use
    /// [`with_dispatcher`](Self::with_dispatcher) to pass a runtime handle
    /// explicitly.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_dispatcher(config, Dispatcher::current())
    }

    /// Creates a server that dispatches blocking work through `dispatcher`.
    pub fn with_dispatcher(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let manager = Arc::new(StoreManager::new(config.storage_root));
        let single = CreateHandler::new(Arc::clone(&manager), dispatcher.clone());
        let batch = CreateHandler::for_multiple_resources(Arc::clone(&manager), dispatcher);

        Self {
            manager,
            single,
            batch,
        }
    }

    /// Returns the shared store manager.
    pub fn manager(&self) -> &Arc<StoreManager> {
        &self.manager
    }

    /// Handles a single-resource creation request.
    pub async fn create(&self, request: CreateRequest) -> ServerResult<CreateResponse> {
        self.single.handle(request).await
    }

    /// Handles a batch creation request, one resource per upload.
    pub async fn create_multiple(&self, request: CreateRequest) -> ServerResult<CreateResponse> {
        self.batch.handle(request).await
    }

    /// Closes every open database and releases their advisory locks.
    pub fn shutdown(&self) {
        self.manager.close_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn server_lifecycle() {
        let dir = tempdir().unwrap();
        let server = Server::new(ServerConfig::new(dir.path()));

        server
            .create(CreateRequest::database_only("shop"))
            .await
            .unwrap();
        assert_eq!(server.manager().open_count(), 1);

        server.shutdown();
        assert_eq!(server.manager().open_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_releases_database_locks() {
        let dir = tempdir().unwrap();

        let first = Server::new(ServerConfig::new(dir.path()));
        first
            .create(CreateRequest::single("shop", "inventory", "<items/>"))
            .await
            .unwrap();
        first.shutdown();
        drop(first);

        // A fresh server can take over the same storage root.
        let second = Server::new(ServerConfig::new(dir.path()));
        let response = second
            .create(CreateRequest::single("shop", "orders", "<orders/>"))
            .await
            .unwrap();
        assert!(response.body.is_some());
        second.shutdown();
    }
}
