//! CLI command implementations.

pub mod drop;
pub mod ensure;
pub mod export;
pub mod import;
pub mod ingest;
