//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command loads a [`Session`] from the configured backend, runs one
//! core operation, and prints the result as aligned text or pretty JSON.
//! Mutating commands persist the session before reporting.

use etymon_core::{
    CandidatePayload, EtymonError, GraphSnapshot, InfluenceResolutions, ItemId, ItemPatch,
    Resolution, ResolutionOutcome, Scope, Session, VerificationStatus, snapshot_from_bytes,
    snapshot_to_bytes,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for payload and resolution files (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_PAYLOAD_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum file size for import (500 MB).
///
/// Import files can be larger since they contain whole graph snapshots.
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &PathBuf, max_size: u64) -> Result<(), EtymonError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| EtymonError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(EtymonError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// This function:
/// 1. Canonicalizes the path to resolve symlinks and ".."
/// 2. Ensures the path exists
/// 3. Ensures the path is a file (not a directory)
fn validate_file_path(path: &std::path::Path) -> Result<PathBuf, EtymonError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        EtymonError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    // Ensure it's a file, not a directory
    if !canonical.is_file() {
        return Err(EtymonError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path.
///
/// For output files, we validate the parent directory exists and is writable.
fn validate_output_path(path: &std::path::Path) -> Result<PathBuf, EtymonError> {
    // Get parent directory
    let parent = path.parent().unwrap_or(std::path::Path::new("."));

    // Canonicalize parent to resolve ".." and symlinks
    let canonical_parent = parent.canonicalize().map_err(|e| {
        EtymonError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    // Ensure parent is a directory
    if !canonical_parent.is_dir() {
        return Err(EtymonError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    // Return the path with canonical parent + original filename
    let filename = path
        .file_name()
        .ok_or_else(|| EtymonError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &PathBuf, backend: &str, force: bool) -> Result<(), EtymonError> {
    if db_path.exists() && !force {
        return Err(EtymonError::InvalidArgument(
            "Database already exists. Use --force to overwrite.".to_string(),
        ));
    }

    // With --force an existing file is discarded, not merged into
    if db_path.exists() {
        std::fs::remove_file(db_path)
            .map_err(|e| EtymonError::IoError(format!("Remove old database: {}", e)))?;
    }

    match backend {
        "redb" => {
            let _session = Session::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        _ => {
            let session = Session::new();
            save_session(&session, db_path)?;
            println!("Initialized new file database at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(db_path: &PathBuf, backend: &str, json_mode: bool) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;

    let items = session.item_count()?;
    let creators = session.creator_count()?;
    let influences = session.influence_count()?;
    let categories = session.categories()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "item_count": items,
            "creator_count": creators,
            "influence_count": influences,
            "category_count": categories.len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Etymon Graph Status");
    println!("===================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Items:      {}", items);
    println!("Creators:   {}", creators);
    println!("Influences: {}", influences);
    println!("Categories: {}", categories.len());

    if !categories.is_empty() {
        println!();
        println!("Categories:");
        for category in categories.iter().take(10) {
            println!("  {} ({} uses)", category.name, category.usage_count);
        }
        if categories.len() > 10 {
            println!("  ... and {} more", categories.len() - 10);
        }
    }

    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Search items by name substring.
pub fn cmd_search(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    query: &str,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let items = session.search_items(query)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&items).unwrap_or_default()
        );
        return Ok(());
    }

    if items.is_empty() {
        println!("No items match '{}'", query);
        return Ok(());
    }

    println!("Found {} item(s):", items.len());
    for item in &items {
        match item.year {
            Some(year) => println!("  {} ({}) [{}]", item.name, year, item.id),
            None => println!("  {} [{}]", item.name, item.id),
        }
    }

    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Show one item with creators, influences, and categories.
pub fn cmd_show(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let item_id = ItemId::new(id);

    let preview = session.get_item_preview(&item_id)?;
    let counts = session.get_expansion_counts(&item_id)?;

    if json_mode {
        let output = serde_json::json!({
            "item": preview.item,
            "creators": preview.creators,
            "influences": preview.existing_influences,
            "categories": preview.categories,
            "incoming_influences": counts.incoming_influences,
            "outgoing_influences": counts.outgoing_influences
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    let item = &preview.item;
    println!("{}", item.name);
    println!("{}", "=".repeat(item.name.len()));
    println!("Id:         {}", item.id);
    if let Some(ref item_type) = item.auto_detected_type {
        println!("Type:       {}", item_type);
    }
    if let Some(year) = item.year {
        println!("Year:       {}", year);
    }
    if let Some(confidence) = item.confidence_score {
        println!("Confidence: {}", confidence);
    }
    println!("Status:     {}", item.verification_status);
    if let Some(ref description) = item.description {
        println!();
        println!("{}", description);
    }

    if !preview.creators.is_empty() {
        println!();
        println!("Creators: {}", preview.creators.join(", "));
    }

    println!();
    println!(
        "Influences: {} incoming, {} outgoing",
        counts.incoming_influences, counts.outgoing_influences
    );
    for name in &preview.existing_influences {
        println!("  <- {}", name);
    }

    if !preview.categories.is_empty() {
        println!();
        println!("Categories: {}", preview.categories.join(", "));
    }

    Ok(())
}

// =============================================================================
// SIMILAR COMMAND
// =============================================================================

/// Rank existing items similar to a candidate name.
pub fn cmd_similar(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    name: &str,
    creator: Option<&str>,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let matches = session.find_similar(name, creator)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&matches).unwrap_or_default()
        );
        return Ok(());
    }

    if matches.is_empty() {
        println!("No similar items for '{}'", name);
        return Ok(());
    }

    println!("Similar items for '{}':", name);
    for similar in &matches {
        println!(
            "  [score {:>3}] {} ({} incoming influences) [{}]",
            similar.score,
            similar.item.name,
            similar.influence_count,
            similar.item.id
        );
        if !similar.creators.is_empty() {
            println!("              by {}", similar.creators.join(", "));
        }
    }

    Ok(())
}

// =============================================================================
// INFLUENCES COMMAND
// =============================================================================

/// List the influences on an item, optionally filtered by scope.
pub fn cmd_influences(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
    scopes: Option<&str>,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;

    let scope_filter = match scopes {
        Some(raw) => {
            let mut parsed = Vec::new();
            for part in raw.split(',') {
                parsed.push(Scope::from_str(part)?);
            }
            Some(parsed)
        }
        None => None,
    };

    let response = session.get_influences(&ItemId::new(id), scope_filter.as_deref())?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{} influence(s) on {}:",
        response.influences.len(),
        response.main_item.name
    );
    for relation in &response.influences {
        let scope = relation.attrs.scope.map_or("-", |s| s.as_str());
        println!(
            "  <- {} [{} / {}] confidence {:.2}",
            relation.from_item.name, relation.attrs.category, scope, relation.attrs.confidence
        );
        println!("     {}", relation.attrs.explanation);
    }

    if !response.scopes.is_empty() {
        let names: Vec<&str> = response.scopes.iter().map(Scope::as_str).collect();
        println!();
        println!("Scopes present: {}", names.join(", "));
    }

    Ok(())
}

// =============================================================================
// OUTGOING COMMAND
// =============================================================================

/// List what an item influences.
pub fn cmd_outgoing(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let relations = session.get_what_item_influences(&ItemId::new(id))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&relations).unwrap_or_default()
        );
        return Ok(());
    }

    if relations.is_empty() {
        println!("Item {} influences nothing yet", id);
        return Ok(());
    }

    println!("{} outgoing influence(s):", relations.len());
    for relation in &relations {
        println!(
            "  -> {} [{}] confidence {:.2}",
            relation.to_item.name, relation.attrs.category, relation.attrs.confidence
        );
    }

    Ok(())
}

// =============================================================================
// EXPAND COMMAND
// =============================================================================

/// Show an item's one-hop neighborhood.
pub fn cmd_expand(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
    incoming: bool,
    outgoing: bool,
    depth: usize,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;

    // Neither direction flag means both directions
    let (include_incoming, include_outgoing) = if incoming || outgoing {
        (incoming, outgoing)
    } else {
        (true, true)
    };

    let expanded = session.get_expanded_graph(
        &ItemId::new(id),
        include_incoming,
        include_outgoing,
        depth,
    )?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&expanded).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Expanded graph: {} node(s), {} relationship(s)",
        expanded.nodes.len(),
        expanded.relationships.len()
    );
    for node in &expanded.nodes {
        let marker = if node.is_center { "*" } else { " " };
        if node.creators.is_empty() {
            println!("  {} {} [{}]", marker, node.item.name, node.item.id);
        } else {
            let names: Vec<&str> = node.creators.iter().map(|c| c.name.as_str()).collect();
            println!(
                "  {} {} by {} [{}]",
                marker,
                node.item.name,
                names.join(", "),
                node.item.id
            );
        }
    }

    if !expanded.relationships.is_empty() {
        println!();
        for edge in &expanded.relationships {
            println!(
                "  {} -> {} ({:.2})",
                edge.from_id, edge.to_id, edge.attrs.confidence
            );
        }
    }

    Ok(())
}

// =============================================================================
// COUNTS COMMAND
// =============================================================================

/// Show influence counts in both directions.
pub fn cmd_counts(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let item_id = ItemId::new(id);

    let item = session.get_item(&item_id)?;
    let counts = session.get_expansion_counts(&item_id)?;

    if json_mode {
        let output = serde_json::json!({
            "item_id": item.id,
            "name": item.name,
            "incoming_influences": counts.incoming_influences,
            "outgoing_influences": counts.outgoing_influences
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{}", item.name);
    println!("  Influenced by: {}", counts.incoming_influences);
    println!("  Influences:    {}", counts.outgoing_influences);

    Ok(())
}

// =============================================================================
// CONFLICTS COMMAND
// =============================================================================

/// Check a candidate payload for conflicts with the graph.
pub fn cmd_conflicts(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    file: &PathBuf,
) -> Result<(), EtymonError> {
    let session = load_or_create_session(db_path, backend)?;
    let payload = load_payload(file)?;

    let report = session.find_comprehensive_conflicts(&payload)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }

    if report.is_empty() {
        println!("No conflicts: payload can be saved as-is");
        return Ok(());
    }

    println!("Found {} potential conflict(s)", report.total_conflicts);
    println!();

    if !report.main_item_conflicts.is_empty() {
        println!("Main item '{}' matches:", payload.main_item.name);
        for similar in &report.main_item_conflicts {
            println!(
                "  [score {:>3}] {} [{}]",
                similar.score, similar.item.name, similar.item.id
            );
        }
        println!();
    }

    for (index, conflict) in &report.influence_conflicts {
        println!("Influence #{} '{}' matches:", index, conflict.candidate.name);
        for similar in &conflict.similar_items {
            println!(
                "  [score {:>3}] {} [{}]",
                similar.score, similar.item.name, similar.item.id
            );
        }
    }

    println!();
    println!("Resolve with: etymon ingest --file <payload> --resolutions <decisions>");

    Ok(())
}

// =============================================================================
// INGEST COMMAND
// =============================================================================

/// Decisions read from a resolutions file.
///
/// `main` is the resolution for the payload's main item; `influences` maps
/// payload indices to per-influence resolutions. Both default to empty, which
/// means "create new" everywhere an exact match does not force a decision.
#[derive(Debug, Default, Deserialize)]
pub struct ResolutionFile {
    #[serde(default)]
    pub main: Option<Resolution>,
    #[serde(default)]
    pub influences: InfluenceResolutions,
}

/// Apply a candidate payload under explicit resolutions.
pub fn cmd_ingest(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    file: &PathBuf,
    resolutions: Option<&std::path::Path>,
) -> Result<(), EtymonError> {
    tracing::info!("Ingesting payload from {:?}", file);

    let mut session = load_or_create_session(db_path, backend)?;
    let payload = load_payload(file)?;

    let decisions = match resolutions {
        Some(path) => load_resolutions(path)?,
        None => ResolutionFile::default(),
    };

    let outcome =
        session.apply_resolutions(&payload, decisions.main.as_ref(), &decisions.influences)?;

    save_session(&session, db_path)?;

    print_outcome(&session, &outcome, json_mode)
}

// =============================================================================
// SAVE COMMAND
// =============================================================================

/// Write a candidate payload without conflict checking.
pub fn cmd_save(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    file: &PathBuf,
) -> Result<(), EtymonError> {
    let mut session = load_or_create_session(db_path, backend)?;
    let payload = load_payload(file)?;

    let outcome = session.save_payload(&payload)?;

    save_session(&session, db_path)?;

    print_outcome(&session, &outcome, json_mode)
}

// =============================================================================
// ADD COMMAND
// =============================================================================

/// Attach a payload's influences to an existing item.
pub fn cmd_add(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
    file: &PathBuf,
) -> Result<(), EtymonError> {
    let mut session = load_or_create_session(db_path, backend)?;
    let payload = load_payload(file)?;

    let outcome = session.add_influences_to_existing(&ItemId::new(id), &payload)?;

    save_session(&session, db_path)?;

    print_outcome(&session, &outcome, json_mode)
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

/// Merge one item into another.
pub fn cmd_merge(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    source: &str,
    target: &str,
) -> Result<(), EtymonError> {
    tracing::info!("Merging {} into {}", source, target);

    let mut session = load_or_create_session(db_path, backend)?;

    let source_id = ItemId::new(source);
    let target_id = ItemId::new(target);
    let survivor = session.merge_items(&source_id, &target_id)?;

    save_session(&session, db_path)?;

    if json_mode {
        let output = serde_json::json!({
            "merged": source_id,
            "survivor": survivor
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    let counts = session.get_expansion_counts(&survivor)?;
    println!("Merged {} into {}", source_id, survivor);
    println!(
        "  Surviving item now has {} incoming, {} outgoing influence(s)",
        counts.incoming_influences, counts.outgoing_influences
    );

    Ok(())
}

// =============================================================================
// UPDATE COMMAND
// =============================================================================

/// Field edits collected from `update` command flags.
#[derive(Debug, Default)]
pub struct ItemUpdateArgs {
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub confidence: Option<f64>,
    pub status: Option<String>,
}

/// Edit fields of an existing item.
pub fn cmd_update(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
    args: ItemUpdateArgs,
) -> Result<(), EtymonError> {
    let mut session = load_or_create_session(db_path, backend)?;

    let verification_status = match args.status.as_deref() {
        Some(raw) => Some(VerificationStatus::from_str(raw)?),
        None => None,
    };

    let patch = ItemPatch {
        name: args.name,
        auto_detected_type: args.item_type,
        year: args.year,
        description: args.description,
        confidence_score: args.confidence,
        verification_status,
    };

    let updated = session.update_item(&ItemId::new(id), patch)?;

    save_session(&session, db_path)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&updated).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Updated {}", updated.id);
    println!("  Name:   {}", updated.name);
    if let Some(year) = updated.year {
        println!("  Year:   {}", year);
    }
    println!("  Status: {}", updated.verification_status);

    Ok(())
}

// =============================================================================
// DELETE COMMAND
// =============================================================================

/// Remove an item and every edge touching it.
pub fn cmd_delete(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    id: &str,
) -> Result<(), EtymonError> {
    let mut session = load_or_create_session(db_path, backend)?;

    let item_id = ItemId::new(id);
    let deleted = session.delete_item(&item_id)?;

    save_session(&session, db_path)?;

    if json_mode {
        let output = serde_json::json!({
            "item_id": item_id,
            "deleted": deleted
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if deleted {
        println!("Deleted {} and every influence touching it", item_id);
    } else {
        println!("Item {} not found", item_id);
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the graph to a snapshot file.
///
/// Works with both backends: the session reads every table into a snapshot
/// before encoding.
pub fn cmd_export(
    db_path: &PathBuf,
    backend: &str,
    output: &std::path::Path,
    format: &str,
) -> Result<(), EtymonError> {
    let validated_output = validate_output_path(output)?;

    let session = load_or_create_session(db_path, backend)?;
    let snapshot = session.export_snapshot()?;

    let data = match format {
        "binary" => snapshot_to_bytes(&snapshot)?,
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| EtymonError::SerializationError(e.to_string()))?,
        _ => {
            return Err(EtymonError::InvalidArgument(format!(
                "Unknown format: {}. Use: binary, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| EtymonError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a snapshot file into the database.
///
/// Accepts both the binary snapshot format and its JSON rendering, and works
/// with both backends: the snapshot replaces whatever the database held.
pub fn cmd_import(
    db_path: &PathBuf,
    backend: &str,
    input: &std::path::Path,
) -> Result<(), EtymonError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| EtymonError::IoError(format!("Read file: {}", e)))?;

    // Try the binary snapshot format first, then JSON
    let snapshot = match snapshot_from_bytes(&data) {
        Ok(snapshot) => snapshot,
        Err(_) => serde_json::from_slice::<GraphSnapshot>(&data).map_err(|_| {
            EtymonError::SerializationError(
                "Could not parse import file as a binary or JSON snapshot".to_string(),
            )
        })?,
    };

    let mut session = match backend {
        "redb" => Session::with_redb(db_path)?,
        _ => Session::new(),
    };
    session.load_snapshot(snapshot)?;

    save_session(&session, db_path)?;

    println!(
        "Imported graph: {} items, {} creators, {} influences",
        session.item_count()?,
        session.creator_count()?,
        session.influence_count()?
    );

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load or create a session from a database path with specified backend.
pub fn load_or_create_session(db_path: &PathBuf, backend: &str) -> Result<Session, EtymonError> {
    match backend {
        "redb" => Session::with_redb(db_path),
        _ => {
            if db_path.exists() {
                let data = std::fs::read(db_path)
                    .map_err(|e| EtymonError::IoError(format!("Read db: {}", e)))?;

                // Try the binary snapshot format first
                if let Ok(snapshot) = snapshot_from_bytes(&data) {
                    let mut session = Session::new();
                    session.load_snapshot(snapshot)?;
                    return Ok(session);
                }

                // Try JSON format
                if let Ok(snapshot) = serde_json::from_slice::<GraphSnapshot>(&data) {
                    let mut session = Session::new();
                    session.load_snapshot(snapshot)?;
                    return Ok(session);
                }

                Err(EtymonError::SerializationError(
                    "Could not parse database file".to_string(),
                ))
            } else {
                Ok(Session::new())
            }
        }
    }
}

/// Save a session to a database path.
pub fn save_session(session: &Session, db_path: &PathBuf) -> Result<(), EtymonError> {
    if session.is_persistent() {
        // Redb backend - already persisted, nothing to do
        Ok(())
    } else {
        // File backend - encode the whole graph as a binary snapshot
        let snapshot = session.export_snapshot()?;
        let data = snapshot_to_bytes(&snapshot)?;
        std::fs::write(db_path, &data)
            .map_err(|e| EtymonError::IoError(format!("Write db: {}", e)))?;
        Ok(())
    }
}

/// Read and parse a candidate payload from a JSON file.
fn load_payload(file: &PathBuf) -> Result<CandidatePayload, EtymonError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_PAYLOAD_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| EtymonError::IoError(format!("Read file: {}", e)))?;

    serde_json::from_slice(&contents)
        .map_err(|e| EtymonError::SerializationError(format!("Parse payload: {}", e)))
}

/// Read and parse a resolutions file.
fn load_resolutions(file: &std::path::Path) -> Result<ResolutionFile, EtymonError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_PAYLOAD_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| EtymonError::IoError(format!("Read file: {}", e)))?;

    serde_json::from_slice(&contents)
        .map_err(|e| EtymonError::SerializationError(format!("Parse resolutions: {}", e)))
}

/// Print what a resolution batch did, then the graph totals.
fn print_outcome(
    session: &Session,
    outcome: &ResolutionOutcome,
    json_mode: bool,
) -> Result<(), EtymonError> {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Applied payload to item {}", outcome.item_id);
    println!("  Candidates: {}", outcome.candidates_supplied);
    println!("  Created:    {}", outcome.influences_created);
    println!("  Merged:     {}", outcome.influences_merged);
    println!("  Skipped:    {}", outcome.skipped.len());
    for skip in &outcome.skipped {
        println!("    #{} '{}': {}", skip.index, skip.name, skip.reason);
    }
    println!();
    println!(
        "Graph now has {} items, {} influences",
        session.item_count()?,
        session.influence_count()?
    );

    Ok(())
}
