//! Export command implementation.

use arbordb_store::serialize::{SerializerOptions, XmlSerializer};
use arbordb_store::StoreManager;
use std::fs;
use std::path::Path;

/// Runs the export command.
pub fn run(
    manager: &StoreManager,
    database: &str,
    resource: &str,
    output: Option<&Path>,
    ids: bool,
    rest: bool,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = manager.database_path(database)?;
    let db = manager.open(&path)?;
    let session = db.resource_session(resource)?;

    let options = SerializerOptions::new()
        .emit_ids(ids)
        .emit_rest(rest)
        .emit_rest_sequence(rest)
        .pretty_print(pretty);
    let text = XmlSerializer::new(options).serialize(&session.read_tree());

    match output {
        Some(target) => {
            fs::write(target, &text)?;
            println!(
                "Exported '{database}/{resource}' to {}",
                target.display()
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}
