//! # ArborDB Server
//!
//! Resource ingestion pipeline for ArborDB.
//!
//! This crate provides:
//! - A creation endpoint (databases, single resources, upload batches)
//! - A dispatch bridge that keeps blocking storage work off async threads
//! - Stage-tagged errors with client/server classification
//!
//! # Architecture
//!
//! A request moves through four stages, each dispatched to the blocking
//! pool as one closure:
//! 1. Ensure the database exists (idempotent)
//! 2. Create the resource, replacing any previous occupant of the name
//! 3. Parse the document and store it as the resource's first child
//! 4. Serialize the stored tree back to the caller
//!
//! Validation happens before stage 1; a rejected request never touches
//! the storage root.
//!
//! # Modes
//!
//! The same handler type serves two endpoint shapes. The single-resource
//! mode reads `resource` and `body` from the request and answers with the
//! serialized tree. The batch mode stores one resource per upload and
//! answers with an empty body.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Handler code must not panic; failures surface as ServerResult errors.
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod create;
mod dispatch;
mod error;
mod request;
mod server;

pub use config::ServerConfig;
pub use create::CreateHandler;
pub use dispatch::Dispatcher;
pub use error::{ServerError, ServerResult};
pub use request::{CreateRequest, CreateResponse, Upload};
pub use server::Server;
