//! # ArborDB Store
//!
//! Tree-document storage engine for ArborDB.
//!
//! This crate provides:
//! - A database registry (`StoreManager`) over a storage root
//! - Named databases holding named resources, each a single node tree
//! - Single-writer transactions with commit-or-rollback semantics
//! - Streaming ingestion of tokenized documents into a tree
//! - Serialization of trees back to document text
//!
//! ## Durability Model
//!
//! Every metadata record and tree revision is written with the
//! write-then-rename pattern: readers and crash recovery only ever see
//! complete files. Database and resource registration rename their
//! `CONFIG` record into place last, so an interrupted creation leaves an
//! unregistered directory that the next creation simply re-initializes.
//!
//! ## Usage
//!
//! ```no_run
//! use arbordb_store::{DatabaseConfig, ResourceConfig, StoreManager};
//! use arbordb_store::{SerializerOptions, XmlSerializer};
//! use arbordb_xml::XmlTokenReader;
//!
//! fn main() -> Result<(), arbordb_store::StoreError> {
//!     let manager = StoreManager::new("/var/lib/arbordb");
//!     let path = manager.database_path("catalog")?;
//!     let db = manager.create(DatabaseConfig::for_path(&path))?;
//!
//!     db.create_resource(&ResourceConfig::new("books"))?;
//!     let session = db.resource_session("books")?;
//!
//!     let mut txn = session.begin_write();
//!     txn.insert_subtree_as_first_child(XmlTokenReader::new("<book/>"))?;
//!     txn.commit()?;
//!
//!     let text = XmlSerializer::new(SerializerOptions::full()).serialize(&session.read_tree());
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod dir;
mod error;
mod manager;
mod resource;
pub mod serialize;
mod transaction;
pub mod tree;

pub use config::{DatabaseConfig, ResourceConfig, FORMAT_VERSION};
pub use database::Database;
pub use dir::validate_name;
pub use error::{StoreError, StoreResult};
pub use manager::StoreManager;
pub use resource::ResourceSession;
pub use serialize::{SerializerOptions, XmlSerializer, REST_NAMESPACE};
pub use transaction::WriteTransaction;
pub use tree::{Node, NodeKey, NodeKind, NodeTree};

#[cfg(test)]
mod tests {
    use super::*;
    use arbordb_xml::XmlTokenReader;
    use tempfile::tempdir;

    #[test]
    fn ingest_then_serialize_round_trip() {
        let temp = tempdir().unwrap();
        let manager = StoreManager::new(temp.path());
        let path = manager.database_path("catalog").unwrap();
        let db = manager.create(DatabaseConfig::for_path(&path)).unwrap();

        db.create_resource(&ResourceConfig::new("fruits")).unwrap();
        let session = db.resource_session("fruits").unwrap();

        let source = "<fruit><name>apple</name></fruit>";
        let mut txn = session.begin_write();
        txn.insert_subtree_as_first_child(XmlTokenReader::new(source))
            .unwrap();
        txn.commit().unwrap();

        let compact = XmlSerializer::new(SerializerOptions::new()).serialize(&session.read_tree());
        assert_eq!(compact, source);
    }
}
