//! Drop command implementation.

use arbordb_store::StoreManager;

/// Runs the drop command.
///
/// Removes the database and everything under it from durable storage.
pub fn run(manager: &StoreManager, database: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = manager.database_path(database)?;
    manager.remove(&path)?;
    println!("Removed database '{database}'");
    Ok(())
}
