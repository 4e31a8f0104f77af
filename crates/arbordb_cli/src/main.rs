//! ArborDB CLI
//!
//! Command-line tools for ArborDB document stores.
//!
//! # Commands
//!
//! - `ensure` - Create a database if it does not exist yet
//! - `ingest` - Store one document as a resource
//! - `import` - Store one resource per input file
//! - `export` - Serialize a stored resource
//! - `drop` - Remove a database

mod commands;

use arbordb_server::{Server, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ArborDB command-line document store tools.
#[derive(Parser)]
#[command(name = "arbordb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage root holding all databases
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database if it does not exist yet
    Ensure {
        /// Database name
        database: String,
    },

    /// Store one document as a resource, replacing any previous occupant
    Ingest {
        /// Database name
        database: String,

        /// Resource name
        resource: String,

        /// Read the document from this file instead of standard input
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Store one resource per input file
    Import {
        /// Database name
        database: String,

        /// Document files, one resource per file, named after its stem
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Serialize a stored resource
    Export {
        /// Database name
        database: String,

        /// Resource name
        resource: String,

        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Annotate elements with their node identifiers
        #[arg(long)]
        ids: bool,

        /// Wrap the output in REST sequence/item elements
        #[arg(long)]
        rest: bool,

        /// Indent the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Remove a database and everything under it
    Drop {
        /// Database name
        database: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match cli.root {
        Some(root) => ServerConfig::new(root),
        None => ServerConfig::default(),
    };
    let server = Server::new(config);

    match cli.command {
        Commands::Ensure { database } => {
            commands::ensure::run(&server, &database).await?;
        }
        Commands::Ingest {
            database,
            resource,
            file,
        } => {
            commands::ingest::run(&server, &database, &resource, file.as_deref()).await?;
        }
        Commands::Import { database, files } => {
            commands::import::run(&server, &database, &files).await?;
        }
        Commands::Export {
            database,
            resource,
            output,
            ids,
            rest,
            pretty,
        } => {
            commands::export::run(
                server.manager(),
                &database,
                &resource,
                output.as_deref(),
                ids,
                rest,
                pretty,
            )?;
        }
        Commands::Drop { database } => {
            commands::drop::run(server.manager(), &database)?;
        }
        Commands::Version => {
            println!("ArborDB CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    server.shutdown();
    Ok(())
}
