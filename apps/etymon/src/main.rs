//! # Etymon - Influence Graph CLI
//!
//! The main binary for the Etymon influence knowledge graph.
//!
//! This application provides:
//! - CLI interface for graph operations (clap-based)
//! - Conflict-checked ingestion of candidate payloads
//! - Snapshot export/import between backends
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            apps/etymon (THE BINARY)         │
//! │                                             │
//! │  ┌─────────────┐        ┌───────────────┐   │
//! │  │   CLI       │        │  TOML config  │   │
//! │  │  (clap)     │        │  (etymon.toml)│   │
//! │  └──────┬──────┘        └───────┬───────┘   │
//! │         │                       │           │
//! │         └───────────┬───────────┘           │
//! │                     ▼                       │
//! │             ┌───────────────┐               │
//! │             │  etymon-core  │               │
//! │             │  (THE LOGIC)  │               │
//! │             └───────────────┘               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Inspect the graph
//! etymon status
//! etymon search "stan"
//!
//! # Conflict-checked ingestion
//! etymon conflicts -f payload.json
//! etymon ingest -f payload.json -r decisions.json
//!
//! # Curation
//! etymon merge <source-id> <target-id>
//! ```

use clap::Parser;
use etymon::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — ETYMON_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ETYMON_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "etymon=debug"
    } else {
        "etymon=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Etymon startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗████████╗██╗   ██╗███╗   ███╗ ██████╗ ███╗   ██╗
  ██╔════╝╚══██╔══╝╚██╗ ██╔╝████╗ ████║██╔═══██╗████╗  ██║
  █████╗     ██║    ╚████╔╝ ██╔████╔██║██║   ██║██╔██╗ ██║
  ██╔══╝     ██║     ╚██╔╝  ██║╚██╔╝██║██║   ██║██║╚██╗██║
  ███████╗   ██║      ██║   ██║ ╚═╝ ██║╚██████╔╝██║ ╚████║
  ╚══════╝   ╚═╝      ╚═╝   ╚═╝     ╚═╝ ╚═════╝ ╚═╝  ╚═══╝

  Influence Graph v{}

  Deterministic • Conflict-Aware • Persistent
"#,
        env!("CARGO_PKG_VERSION")
    );
}
