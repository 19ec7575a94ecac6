//! Integration tests for the Etymon CLI commands.
//!
//! Drives the command functions directly against temporary databases on both
//! backends, without spawning the binary.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use etymon::cli::{
    ItemUpdateArgs, ResolutionFile, cmd_add, cmd_conflicts, cmd_counts, cmd_delete, cmd_expand,
    cmd_export, cmd_import, cmd_influences, cmd_ingest, cmd_init, cmd_merge, cmd_outgoing,
    cmd_save, cmd_search, cmd_show, cmd_similar, cmd_status, cmd_update, load_or_create_session,
};
use etymon_core::{
    CandidateInfluence, CandidateItem, CandidatePayload, EtymonError, ItemId, Resolution, Session,
    VerificationStatus,
};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// A payload with one main item and two influences.
fn stan_payload() -> CandidatePayload {
    let mut main_item = CandidateItem::new("Stan");
    main_item.item_type = Some("song".to_string());
    main_item.creator = Some("Eminem".to_string());
    main_item.year = Some(2000);

    let mut payload = CandidatePayload::new(main_item);
    let mut dido = CandidateInfluence::new("Thank You", 0.95);
    dido.creator_name = Some("Dido".to_string());
    dido.category = Some("Audio Samples".to_string());
    payload.influences.push(dido);
    payload
        .influences
        .push(CandidateInfluence::new("Epistolary Literature", 0.85));
    payload
}

/// Serialize a value as pretty JSON into `dir/name` and return the path.
fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

/// Look an item id up by exact name via search.
fn find_id(session: &Session, name: &str) -> ItemId {
    session
        .search_items(name)
        .unwrap()
        .first()
        .unwrap()
        .id
        .clone()
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_a_database_for_each_backend() {
    let dir = tempdir().unwrap();

    let redb_path = dir.path().join("graph.db");
    cmd_init(&redb_path, "redb", false).unwrap();
    assert!(redb_path.exists());

    let file_path = dir.path().join("graph.bin");
    cmd_init(&file_path, "file", false).unwrap();
    assert!(file_path.exists());
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.bin");

    cmd_init(&path, "file", false).unwrap();

    let err = cmd_init(&path, "file", false).unwrap_err();
    assert!(matches!(err, EtymonError::InvalidArgument(_)));

    // --force starts over
    cmd_init(&path, "file", true).unwrap();
    let session = load_or_create_session(&path, "file").unwrap();
    assert_eq!(session.item_count().unwrap(), 0);
}

// =============================================================================
// SAVE & RELOAD TESTS
// =============================================================================

#[test]
fn test_save_command_persists_on_the_file_backend() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    assert_eq!(session.item_count().unwrap(), 3);
    assert_eq!(session.creator_count().unwrap(), 2);
    assert_eq!(session.influence_count().unwrap(), 2);
}

#[test]
fn test_save_command_persists_on_the_redb_backend() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.db");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "redb", false, &payload).unwrap();

    let session = load_or_create_session(&db, "redb").unwrap();
    assert_eq!(session.item_count().unwrap(), 3);
    assert_eq!(session.influence_count().unwrap(), 2);
}

#[test]
fn test_missing_database_file_yields_an_empty_session() {
    let dir = tempdir().unwrap();

    let session = load_or_create_session(&dir.path().join("absent.bin"), "file").unwrap();

    assert_eq!(session.item_count().unwrap(), 0);
    assert!(!session.is_persistent());
}

#[test]
fn test_corrupt_database_file_is_rejected() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("garbage.bin");
    std::fs::write(&db, b"definitely not a snapshot").unwrap();

    let err = load_or_create_session(&db, "file").unwrap_err();
    assert!(matches!(err, EtymonError::SerializationError(_)));
}

// =============================================================================
// INGEST & RESOLUTION FILE TESTS
// =============================================================================

#[test]
fn test_resolution_file_accepts_string_indexed_maps() {
    let raw = r#"{
        "main": {"resolution": "merge", "target_item_id": "item-stan-12ab34cd"},
        "influences": {
            "0": {"resolution": "create_new"},
            "2": {"resolution": "merge", "target_item_id": "item-thank-you-aa11bb22"}
        }
    }"#;

    let parsed: ResolutionFile = serde_json::from_str(raw).unwrap();

    assert_eq!(
        parsed.main,
        Some(Resolution::Merge {
            target_item_id: ItemId::new("item-stan-12ab34cd")
        })
    );
    assert_eq!(parsed.influences.len(), 2);
    assert_eq!(parsed.influences.get(&0), Some(&Resolution::CreateNew));
}

#[test]
fn test_empty_resolution_file_defaults_to_create_new() {
    let parsed: ResolutionFile = serde_json::from_str("{}").unwrap();
    assert!(parsed.main.is_none());
    assert!(parsed.influences.is_empty());
}

#[test]
fn test_ingest_without_resolutions_errors_on_exact_duplicate() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let err = cmd_ingest(&db, "file", false, &payload, None).unwrap_err();
    assert!(matches!(err, EtymonError::Conflict(_)));

    // The failed ingest wrote nothing
    let session = load_or_create_session(&db, "file").unwrap();
    assert_eq!(session.item_count().unwrap(), 3);
}

#[test]
fn test_ingest_with_merge_resolutions_reuses_existing_items() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");
    let thank_you = find_id(&session, "Thank You");
    let epistolary = find_id(&session, "Epistolary Literature");

    let decisions = serde_json::json!({
        "main": {"resolution": "merge", "target_item_id": stan},
        "influences": {
            "0": {"resolution": "merge", "target_item_id": thank_you},
            "1": {"resolution": "merge", "target_item_id": epistolary}
        }
    });
    let decisions_path = write_json(dir.path(), "decisions.json", &decisions);

    cmd_ingest(&db, "file", false, &payload, Some(&decisions_path)).unwrap();

    // Everything resolved onto existing records: no new items, no new edges
    let reloaded = load_or_create_session(&db, "file").unwrap();
    assert_eq!(reloaded.item_count().unwrap(), 3);
    assert_eq!(reloaded.influence_count().unwrap(), 2);
}

// =============================================================================
// CURATION COMMAND TESTS
// =============================================================================

#[test]
fn test_add_command_attaches_influences_to_an_existing_item() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let thank_you = find_id(&session, "Thank You");

    let mut extra = CandidatePayload::new(CandidateItem::new("Thank You"));
    extra
        .influences
        .push(CandidateInfluence::new("Dido Discography", 0.8));
    let extra_path = write_json(dir.path(), "extra.json", &extra);

    cmd_add(&db, "file", false, thank_you.as_str(), &extra_path).unwrap();

    let reloaded = load_or_create_session(&db, "file").unwrap();
    assert_eq!(reloaded.item_count().unwrap(), 4);
    let counts = reloaded.get_expansion_counts(&thank_you).unwrap();
    assert_eq!(counts.incoming_influences, 1);
}

#[test]
fn test_merge_command_transfers_edges_and_deletes_the_source() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let source = find_id(&session, "Thank You");
    let target = find_id(&session, "Epistolary Literature");

    cmd_merge(&db, "file", false, source.as_str(), target.as_str()).unwrap();

    let reloaded = load_or_create_session(&db, "file").unwrap();
    assert!(reloaded.get_item(&source).is_err());

    // Both original edges collapse into one from the survivor
    let stan = find_id(&reloaded, "Stan");
    let counts = reloaded.get_expansion_counts(&stan).unwrap();
    assert_eq!(counts.incoming_influences, 1);
}

#[test]
fn test_update_command_edits_fields_and_keeps_the_rest() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");

    cmd_update(
        &db,
        "file",
        false,
        stan.as_str(),
        ItemUpdateArgs {
            year: Some(2001),
            status: Some("user_verified".to_string()),
            ..ItemUpdateArgs::default()
        },
    )
    .unwrap();

    let reloaded = load_or_create_session(&db, "file").unwrap();
    let item = reloaded.get_item(&stan).unwrap();
    assert_eq!(item.year, Some(2001));
    assert_eq!(item.verification_status, VerificationStatus::UserVerified);
    assert_eq!(item.name, "Stan");
}

#[test]
fn test_update_command_rejects_an_unknown_status() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");

    let err = cmd_update(
        &db,
        "file",
        false,
        stan.as_str(),
        ItemUpdateArgs {
            status: Some("definitely_true".to_string()),
            ..ItemUpdateArgs::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, EtymonError::Validation(_)));
}

#[test]
fn test_delete_command_removes_the_item_and_its_edges() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");

    cmd_delete(&db, "file", false, stan.as_str()).unwrap();

    let reloaded = load_or_create_session(&db, "file").unwrap();
    assert_eq!(reloaded.item_count().unwrap(), 2);
    assert_eq!(reloaded.influence_count().unwrap(), 0);
}

// =============================================================================
// EXPORT & IMPORT TESTS
// =============================================================================

#[test]
fn test_binary_export_imports_into_another_file_database() {
    let dir = tempdir().unwrap();
    let db1 = dir.path().join("one.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db1, "file", false, &payload).unwrap();

    let snap = dir.path().join("graph.etym");
    cmd_export(&db1, "file", &snap, "binary").unwrap();

    let db2 = dir.path().join("two.bin");
    cmd_import(&db2, "file", &snap).unwrap();

    let restored = load_or_create_session(&db2, "file").unwrap();
    assert_eq!(restored.item_count().unwrap(), 3);
    assert_eq!(restored.influence_count().unwrap(), 2);
}

#[test]
fn test_json_export_imports_into_a_redb_database() {
    let dir = tempdir().unwrap();
    let db1 = dir.path().join("one.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db1, "file", false, &payload).unwrap();

    let snap = dir.path().join("graph.json");
    cmd_export(&db1, "file", &snap, "json").unwrap();

    let db2 = dir.path().join("two.db");
    cmd_import(&db2, "redb", &snap).unwrap();

    let restored = load_or_create_session(&db2, "redb").unwrap();
    assert_eq!(restored.item_count().unwrap(), 3);
    assert_eq!(restored.categories().unwrap().len(), 2);
}

#[test]
fn test_export_rejects_an_unknown_format() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let err = cmd_export(&db, "file", &dir.path().join("out.yaml"), "yaml").unwrap_err();
    assert!(matches!(err, EtymonError::InvalidArgument(_)));
}

// =============================================================================
// PAYLOAD FILE ERROR TESTS
// =============================================================================

#[test]
fn test_missing_payload_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");

    let err = cmd_save(&db, "file", false, &dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, EtymonError::IoError(_)));
}

#[test]
fn test_malformed_payload_file_is_a_serialization_error() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, b"{ this is not json").unwrap();

    let err = cmd_save(&db, "file", false, &bad).unwrap_err();
    assert!(matches!(err, EtymonError::SerializationError(_)));
}

// =============================================================================
// READ COMMAND TESTS
// =============================================================================

#[test]
fn test_read_commands_run_against_a_populated_graph() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");

    cmd_status(&db, "file", false).unwrap();
    cmd_status(&db, "file", true).unwrap();
    cmd_search(&db, "file", false, "stan").unwrap();
    cmd_show(&db, "file", false, stan.as_str()).unwrap();
    cmd_similar(&db, "file", false, "Stan", Some("Eminem")).unwrap();
    cmd_influences(&db, "file", false, stan.as_str(), Some("macro")).unwrap();
    cmd_outgoing(&db, "file", false, stan.as_str()).unwrap();
    cmd_expand(&db, "file", false, stan.as_str(), false, false, 1).unwrap();
    cmd_counts(&db, "file", false, stan.as_str()).unwrap();
    cmd_conflicts(&db, "file", false, &payload).unwrap();
}

#[test]
fn test_show_command_errors_on_a_missing_item() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");

    let err = cmd_show(&db, "file", false, "item-unknown-00000000").unwrap_err();
    assert!(matches!(err, EtymonError::NotFound(_)));
}

#[test]
fn test_influences_command_rejects_a_bad_scope() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("graph.bin");
    let payload = write_json(dir.path(), "payload.json", &stan_payload());

    cmd_save(&db, "file", false, &payload).unwrap();

    let session = load_or_create_session(&db, "file").unwrap();
    let stan = find_id(&session, "Stan");

    let err = cmd_influences(&db, "file", false, stan.as_str(), Some("cosmic")).unwrap_err();
    assert!(matches!(err, EtymonError::Validation(_)));
}
