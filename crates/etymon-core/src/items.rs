//! # Item Engine
//!
//! CRUD operations for item nodes.
//!
//! - Validate fields before any write
//! - Mint identifiers once at creation; ids are never reassigned
//! - Search and deletion define the simple read/write surface beneath the
//!   conflict and merge machinery

use chrono::Utc;

use crate::graph::GraphStore;
use crate::identity;
use crate::primitives::{MAX_NAME_LENGTH, MAX_SEARCH_RESULTS, MAX_TEXT_LENGTH};
use crate::types::{EtymonError, Item, ItemId, VerificationStatus};

/// Fields for a new item. Only the name is required.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub auto_detected_type: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub confidence_score: Option<f64>,
    pub verification_status: VerificationStatus,
}

impl NewItem {
    /// A new-item spec with only a name; everything else defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_detected_type: None,
            year: None,
            description: None,
            confidence_score: None,
            verification_status: VerificationStatus::default(),
        }
    }
}

/// Partial update of an existing item. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub auto_detected_type: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub confidence_score: Option<f64>,
    pub verification_status: Option<VerificationStatus>,
}

/// The ItemEngine handles item CRUD against any graph store.
pub struct ItemEngine;

impl ItemEngine {
    /// Validate a new-item spec.
    ///
    /// An item is valid if:
    /// - The name is non-empty after trimming and within length limits
    /// - The confidence score, when present, is a finite value in 0.0–1.0
    /// - The description, when present, is within length limits
    pub fn validate(spec: &NewItem) -> Result<(), EtymonError> {
        let name = spec.name.trim();

        if name.is_empty() {
            return Err(EtymonError::Validation(
                "item name must be non-empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EtymonError::Validation(format!(
                "item name exceeds {MAX_NAME_LENGTH} bytes"
            )));
        }
        if let Some(desc) = &spec.description {
            if desc.len() > MAX_TEXT_LENGTH {
                return Err(EtymonError::Validation(format!(
                    "item description exceeds {MAX_TEXT_LENGTH} bytes"
                )));
            }
        }
        if let Some(confidence) = spec.confidence_score {
            validate_confidence(confidence)?;
        }

        Ok(())
    }

    /// Create a new item in the store.
    ///
    /// The identifier is minted from the name and optional type; the stored
    /// name is the trimmed input.
    pub fn create_item<G: GraphStore>(graph: &mut G, spec: NewItem) -> Result<Item, EtymonError> {
        Self::validate(&spec)?;

        let name = spec.name.trim().to_string();
        let id = identity::mint_item_id(&name, spec.auto_detected_type.as_deref());

        let item = Item {
            id,
            name,
            auto_detected_type: spec.auto_detected_type,
            year: spec.year,
            description: spec.description,
            confidence_score: spec.confidence_score,
            verification_status: spec.verification_status,
            created_at: Some(Utc::now()),
        };

        graph.put_item(item.clone())?;
        Ok(item)
    }

    /// Fetch a single item by id.
    pub fn get_item<G: GraphStore>(graph: &G, id: &ItemId) -> Result<Item, EtymonError> {
        graph.item(id)?.ok_or_else(|| EtymonError::item_not_found(id))
    }

    /// Search items whose name contains the query, case-insensitively.
    ///
    /// Results are ordered by name (then id) and capped at
    /// `MAX_SEARCH_RESULTS`. An empty query matches everything up to the cap.
    pub fn search_items<G: GraphStore>(graph: &G, query: &str) -> Result<Vec<Item>, EtymonError> {
        let needle = query.trim().to_lowercase();

        let mut matches: Vec<Item> = graph
            .items()?
            .into_iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(MAX_SEARCH_RESULTS);
        Ok(matches)
    }

    /// Apply a partial update to an existing item.
    ///
    /// The id is immutable. An all-`None` patch returns the item unchanged.
    pub fn update_item<G: GraphStore>(
        graph: &mut G,
        id: &ItemId,
        patch: ItemPatch,
    ) -> Result<Item, EtymonError> {
        let mut item = Self::get_item(graph, id)?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(EtymonError::Validation(
                    "item name must be non-empty".to_string(),
                ));
            }
            if name.len() > MAX_NAME_LENGTH {
                return Err(EtymonError::Validation(format!(
                    "item name exceeds {MAX_NAME_LENGTH} bytes"
                )));
            }
            item.name = name;
        }
        if let Some(confidence) = patch.confidence_score {
            validate_confidence(confidence)?;
            item.confidence_score = Some(confidence);
        }
        if let Some(item_type) = patch.auto_detected_type {
            item.auto_detected_type = Some(item_type);
        }
        if let Some(year) = patch.year {
            item.year = Some(year);
        }
        if let Some(description) = patch.description {
            item.description = Some(description);
        }
        if let Some(status) = patch.verification_status {
            item.verification_status = status;
        }

        graph.put_item(item.clone())?;
        Ok(item)
    }

    /// Delete an item and every edge touching it.
    ///
    /// Returns whether an item was actually deleted.
    pub fn delete_item_completely<G: GraphStore>(
        graph: &mut G,
        id: &ItemId,
    ) -> Result<bool, EtymonError> {
        graph.detach_delete_item(id)
    }
}

/// Check a confidence value is finite and within 0.0–1.0.
pub(crate) fn validate_confidence(confidence: f64) -> Result<(), EtymonError> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(EtymonError::Validation(format!(
            "confidence {confidence} outside 0.0-1.0"
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::types::InfluenceAttrs;

    #[test]
    fn create_and_get_roundtrip() {
        let mut graph = MemoryGraph::new();
        let mut spec = NewItem::new("  Stan  ");
        spec.auto_detected_type = Some("song".to_string());
        spec.year = Some(2000);

        let created = ItemEngine::create_item(&mut graph, spec).expect("create");
        assert_eq!(created.name, "Stan");
        assert!(created.id.as_str().starts_with("stan-song-"));
        assert!(created.created_at.is_some());

        let fetched = ItemEngine::get_item(&graph, &created.id).expect("get");
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let mut graph = MemoryGraph::new();

        assert!(ItemEngine::create_item(&mut graph, NewItem::new("   ")).is_err());

        let mut spec = NewItem::new("Stan");
        spec.confidence_score = Some(1.5);
        assert!(ItemEngine::create_item(&mut graph, spec).is_err());

        assert_eq!(graph.item_count().expect("count"), 0);
    }

    #[test]
    fn duplicate_names_get_distinct_ids() {
        let mut graph = MemoryGraph::new();
        let a = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");
        let b = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");

        assert_ne!(a.id, b.id);
        assert_eq!(graph.item_count().expect("count"), 2);
    }

    #[test]
    fn get_missing_item_is_not_found() {
        let graph = MemoryGraph::new();
        let err = ItemEngine::get_item(&graph, &ItemId::new("ghost")).expect_err("missing");
        assert!(matches!(err, EtymonError::NotFound(_)));
    }

    #[test]
    fn search_is_case_insensitive_and_name_ordered() {
        let mut graph = MemoryGraph::new();
        for name in ["The Matrix", "The Matrix Reloaded", "Inception", "Memento"] {
            ItemEngine::create_item(&mut graph, NewItem::new(name)).expect("create");
        }

        let results = ItemEngine::search_items(&graph, "matrix").expect("search");
        let names: Vec<&str> = results.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["The Matrix", "The Matrix Reloaded"]);

        assert!(ItemEngine::search_items(&graph, "western")
            .expect("search")
            .is_empty());
    }

    #[test]
    fn search_caps_result_count() {
        let mut graph = MemoryGraph::new();
        for n in 0..(MAX_SEARCH_RESULTS + 5) {
            ItemEngine::create_item(&mut graph, NewItem::new(format!("Song {n:02}")))
                .expect("create");
        }

        let results = ItemEngine::search_items(&graph, "song").expect("search");
        assert_eq!(results.len(), MAX_SEARCH_RESULTS);
        assert_eq!(results[0].name, "Song 00");
    }

    #[test]
    fn update_applies_only_supplied_fields() {
        let mut graph = MemoryGraph::new();
        let mut spec = NewItem::new("Stan");
        spec.year = Some(2000);
        let created = ItemEngine::create_item(&mut graph, spec).expect("create");

        let patch = ItemPatch {
            description: Some("Song by Eminem".to_string()),
            ..ItemPatch::default()
        };
        let updated = ItemEngine::update_item(&mut graph, &created.id, patch).expect("update");

        assert_eq!(updated.description.as_deref(), Some("Song by Eminem"));
        assert_eq!(updated.year, Some(2000));
        assert_eq!(updated.name, "Stan");
        assert_eq!(updated.id, created.id);

        let unchanged =
            ItemEngine::update_item(&mut graph, &created.id, ItemPatch::default()).expect("update");
        assert_eq!(unchanged, updated);
    }

    #[test]
    fn update_validates_name_and_target() {
        let mut graph = MemoryGraph::new();
        let created = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");

        let patch = ItemPatch {
            name: Some("  ".to_string()),
            ..ItemPatch::default()
        };
        assert!(ItemEngine::update_item(&mut graph, &created.id, patch).is_err());

        let err = ItemEngine::update_item(&mut graph, &ItemId::new("ghost"), ItemPatch::default())
            .expect_err("missing");
        assert!(matches!(err, EtymonError::NotFound(_)));
    }

    #[test]
    fn delete_cascades_to_edges() {
        let mut graph = MemoryGraph::new();
        let a = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");
        let b = ItemEngine::create_item(&mut graph, NewItem::new("Thank You")).expect("create");

        let attrs = InfluenceAttrs {
            confidence: 0.95,
            influence_type: "audio_sample".to_string(),
            explanation: "sampled chorus".to_string(),
            category: "Audio Samples".to_string(),
            scope: None,
            source: None,
            year_of_influence: None,
            clusters: Vec::new(),
            created_at: None,
        };
        graph.put_influence(&b.id, &a.id, attrs).expect("edge");

        assert!(ItemEngine::delete_item_completely(&mut graph, &a.id).expect("delete"));
        assert_eq!(graph.influence_count().expect("count"), 0);
        assert!(!ItemEngine::delete_item_completely(&mut graph, &a.id).expect("delete again"));
    }
}
