//! Import command implementation.

use arbordb_server::{CreateRequest, Server, Upload};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Runs the import command.
///
/// Each file becomes one resource named after the file stem. The whole
/// batch targets a single database, created on demand.
pub async fn run(
    server: &Server,
    database: &str,
    files: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Importing {} files into '{}'", files.len(), database);

    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| format!("cannot derive a resource name from {}", path.display()))?;
        let content = fs::read_to_string(path)?;
        uploads.push(Upload::new(name, content));
    }

    server
        .create_multiple(CreateRequest::batch(database, uploads))
        .await?;

    let path = server.manager().database_path(database)?;
    let db = server.manager().open(&path)?;
    let resources = db.list_resources()?;

    println!("Imported {} files into '{database}'", files.len());
    println!("Resources:");
    for resource in resources {
        println!("  {resource}");
    }
    Ok(())
}
