//! # Etymon CLI Module
//!
//! This module implements the CLI interface for Etymon.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new database
//! - `status` - Show graph status
//! - `search` - Search items by name
//! - `show` - Show one item with its graph context
//! - `similar` - Rank items similar to a name
//! - `influences` - List what influenced an item
//! - `outgoing` - List what an item influences
//! - `expand` - Show an item's one-hop neighborhood
//! - `counts` - Show influence counts in both directions
//! - `conflicts` - Check a payload for conflicts with the graph
//! - `ingest` - Apply a payload under explicit resolutions
//! - `save` - Write a payload without conflict checking
//! - `add` - Attach a payload's influences to an existing item
//! - `merge` - Merge one item into another
//! - `update` - Edit fields of an existing item
//! - `delete` - Remove an item and its edges
//! - `export` - Export the graph to a snapshot file
//! - `import` - Import a snapshot file into the database

mod commands;

use clap::{Parser, Subcommand};
use etymon_core::EtymonError;
use std::path::PathBuf;

pub use commands::*;

use crate::config::EtymonConfig;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Etymon - Influence Graph CLI
///
/// A deterministic knowledge graph of creative works, their creators, and
/// the influences between them, with conflict-aware entity resolution.
#[derive(Parser, Debug)]
#[command(name = "etymon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the graph database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "file" (snapshot file)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to a TOML config file (default: ./etymon.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show graph status
    Status,

    /// Search items by name substring
    Search {
        /// Query text (empty lists the first items)
        query: String,
    },

    /// Show one item with creators, influences, and categories
    Show {
        /// Item id
        id: String,
    },

    /// Rank existing items similar to a candidate name
    Similar {
        /// Candidate name
        name: String,

        /// Creator name to include that creator's items
        #[arg(long)]
        creator: Option<String>,
    },

    /// List the influences on an item (incoming edges)
    Influences {
        /// Item id
        id: String,

        /// Comma-separated scope filter (macro,micro,nano)
        #[arg(short, long)]
        scopes: Option<String>,
    },

    /// List what an item influences (outgoing edges)
    Outgoing {
        /// Item id
        id: String,
    },

    /// Show an item's one-hop neighborhood
    Expand {
        /// Center item id
        id: String,

        /// Limit to incoming edges
        #[arg(long)]
        incoming: bool,

        /// Limit to outgoing edges
        #[arg(long)]
        outgoing: bool,

        /// Expansion depth (clamped to one hop)
        #[arg(short, long, default_value = "1")]
        depth: usize,
    },

    /// Show influence counts in both directions
    Counts {
        /// Item id
        id: String,
    },

    /// Check a candidate payload for conflicts with the graph
    Conflicts {
        /// Path to the payload JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Apply a candidate payload under explicit resolutions
    Ingest {
        /// Path to the payload JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to a resolutions JSON file
        #[arg(short, long)]
        resolutions: Option<PathBuf>,
    },

    /// Write a candidate payload without conflict checking
    Save {
        /// Path to the payload JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Attach a payload's influences to an existing item
    Add {
        /// Target item id
        id: String,

        /// Path to the payload JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Merge one item into another
    Merge {
        /// Source item id (deleted after the merge)
        source: String,

        /// Target item id (survives)
        target: String,
    },

    /// Edit fields of an existing item
    Update {
        /// Item id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New detected type
        #[arg(long = "type")]
        item_type: Option<String>,

        /// New year
        #[arg(long)]
        year: Option<i32>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New confidence score (0.0-1.0)
        #[arg(long)]
        confidence: Option<f64>,

        /// New verification status (ai_generated, user_verified, community_verified)
        #[arg(long)]
        status: Option<String>,
    },

    /// Remove an item and every edge touching it
    Delete {
        /// Item id
        id: String,
    },

    /// Export the graph to a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (binary, json)
        #[arg(short = 't', long, default_value = "binary")]
        format: String,
    },

    /// Import a snapshot file into the database
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), EtymonError> {
    let config = match &cli.config {
        Some(path) => EtymonConfig::from_file(path)?,
        None => EtymonConfig::discover()?,
    };

    let database = config.resolve_database(cli.database);
    let backend = config.resolve_backend(cli.backend);
    let json_mode = config.resolve_json(cli.json_mode);

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&database, &backend, force),
        Some(Commands::Status) => cmd_status(&database, &backend, json_mode),
        Some(Commands::Search { query }) => cmd_search(&database, &backend, json_mode, &query),
        Some(Commands::Show { id }) => cmd_show(&database, &backend, json_mode, &id),
        Some(Commands::Similar { name, creator }) => {
            cmd_similar(&database, &backend, json_mode, &name, creator.as_deref())
        }
        Some(Commands::Influences { id, scopes }) => {
            cmd_influences(&database, &backend, json_mode, &id, scopes.as_deref())
        }
        Some(Commands::Outgoing { id }) => cmd_outgoing(&database, &backend, json_mode, &id),
        Some(Commands::Expand {
            id,
            incoming,
            outgoing,
            depth,
        }) => cmd_expand(&database, &backend, json_mode, &id, incoming, outgoing, depth),
        Some(Commands::Counts { id }) => cmd_counts(&database, &backend, json_mode, &id),
        Some(Commands::Conflicts { file }) => {
            cmd_conflicts(&database, &backend, json_mode, &file)
        }
        Some(Commands::Ingest { file, resolutions }) => cmd_ingest(
            &database,
            &backend,
            json_mode,
            &file,
            resolutions.as_deref(),
        ),
        Some(Commands::Save { file }) => cmd_save(&database, &backend, json_mode, &file),
        Some(Commands::Add { id, file }) => cmd_add(&database, &backend, json_mode, &id, &file),
        Some(Commands::Merge { source, target }) => {
            cmd_merge(&database, &backend, json_mode, &source, &target)
        }
        Some(Commands::Update {
            id,
            name,
            item_type,
            year,
            description,
            confidence,
            status,
        }) => cmd_update(
            &database,
            &backend,
            json_mode,
            &id,
            ItemUpdateArgs {
                name,
                item_type,
                year,
                description,
                confidence,
                status,
            },
        ),
        Some(Commands::Delete { id }) => cmd_delete(&database, &backend, json_mode, &id),
        Some(Commands::Export { output, format }) => {
            cmd_export(&database, &backend, &output, &format)
        }
        Some(Commands::Import { input }) => cmd_import(&database, &backend, &input),
        None => {
            // No subcommand - show status by default
            cmd_status(&database, &backend, json_mode)
        }
    }
}
