//! Ingest command implementation.

use arbordb_server::{CreateRequest, Server};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Runs the ingest command.
///
/// Reads the document from `file`, or from standard input when no file is
/// given, and prints the serialized stored resource.
pub async fn run(
    server: &Server,
    database: &str,
    resource: &str,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = match file {
        Some(path) => {
            info!("Reading document from {:?}", path);
            fs::read_to_string(path)?
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let response = server
        .create(CreateRequest::single(database, resource, body))
        .await?;

    if let Some(text) = response.body_text() {
        println!("{text}");
    }
    Ok(())
}
