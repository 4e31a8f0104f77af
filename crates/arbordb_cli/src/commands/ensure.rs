//! Ensure command implementation.

use arbordb_server::{CreateRequest, Server};

/// Runs the ensure command.
pub async fn run(server: &Server, database: &str) -> Result<(), Box<dyn std::error::Error>> {
    server
        .create(CreateRequest::database_only(database))
        .await?;
    println!("Database '{database}' is ready");
    Ok(())
}
