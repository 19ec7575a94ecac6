//! # Conflict Resolution Orchestrator
//!
//! The write path for candidate payloads.
//!
//! An external generation process proposes a main item plus the influences
//! that shaped it. Before anything is written, `find_comprehensive_conflicts`
//! ranks the existing items each entity might duplicate. The caller answers
//! with per-entity resolutions, and `apply_resolutions` executes them:
//! reuse the chosen existing records, create the rest.
//!
//! ## Skip vs. Abort
//!
//! Payload-level problems (empty main name, out-of-range confidence) and a
//! missing main merge target fail the call before any write. Per-influence
//! problems (a vanished merge target, an invalid candidate) are logged,
//! recorded in the outcome, and skipped; the rest of the batch proceeds.
//! Every outcome reports written-vs-supplied counts, so partial application
//! is visible, never hidden.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::creators::CreatorEngine;
use crate::graph::GraphStore;
use crate::influences::InfluenceEngine;
use crate::items::{ItemEngine, NewItem, validate_confidence};
use crate::primitives::{MAX_INFLUENCES_PER_CANDIDATE, MAX_NAME_LENGTH, SCORE_EXACT};
use crate::similarity::{SimilarItem, SimilarityMatcher, is_sentinel_name};
use crate::types::{
    CandidateInfluence, CandidatePayload, CreatorRole, EtymonError, Item, ItemId,
    VerificationStatus,
};

// =============================================================================
// RESOLUTION TYPES
// =============================================================================

/// How one entity in a candidate payload should be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// Write a brand-new record.
    CreateNew,
    /// Reuse the named existing item instead of creating one.
    Merge { target_item_id: ItemId },
}

/// Per-index resolutions for the influences of a payload. Indices absent
/// from the map default to [`Resolution::CreateNew`].
pub type InfluenceResolutions = BTreeMap<usize, Resolution>;

// =============================================================================
// CONFLICT REPORT
// =============================================================================

/// The ranked matches found for one candidate influence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluenceConflict {
    pub candidate: CandidateInfluence,
    pub similar_items: Vec<SimilarItem>,
}

/// Everything in the store a payload might duplicate.
///
/// `influence_conflicts` is keyed by the candidate's index in the payload;
/// indices with zero matches are omitted. `total_conflicts` is the sum of
/// all similar-item counts, main item included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    pub main_item_conflicts: Vec<SimilarItem>,
    pub influence_conflicts: BTreeMap<usize, InfluenceConflict>,
    pub total_conflicts: usize,
}

impl ConflictReport {
    /// True when neither the main item nor any influence matched anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_conflicts == 0
    }
}

// =============================================================================
// RESOLUTION OUTCOME
// =============================================================================

/// One influence candidate that produced no write, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCandidate {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// What a resolution batch actually did.
///
/// `candidates_supplied` always equals `influences_created +
/// influences_merged + skipped.len()`: every candidate is accounted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    /// The main item all written edges point at.
    pub item_id: ItemId,
    pub candidates_supplied: usize,
    pub influences_created: usize,
    pub influences_merged: usize,
    pub skipped: Vec<SkippedCandidate>,
}

impl ResolutionOutcome {
    fn new(item_id: ItemId, candidates_supplied: usize) -> Self {
        Self {
            item_id,
            candidates_supplied,
            influences_created: 0,
            influences_merged: 0,
            skipped: Vec::new(),
        }
    }

    /// Number of influence edges actually written.
    #[must_use]
    pub fn influences_written(&self) -> usize {
        self.influences_created + self.influences_merged
    }

    fn skip(&mut self, index: usize, name: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedCandidate {
            index,
            name: name.to_string(),
            reason: reason.into(),
        });
    }
}

// =============================================================================
// PREVIEWS
// =============================================================================

/// The graph context around one existing item, for merge-review UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPreview {
    pub item: Item,
    pub creators: Vec<String>,
    /// Names of the items currently influencing this one.
    pub existing_influences: Vec<String>,
    /// Categories present on the incoming edges.
    pub categories: Vec<String>,
}

/// One candidate influence next to its best existing match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluencePreview {
    pub candidate: CandidateInfluence,
    pub similar_item: SimilarItem,
    /// Absent when the matched item vanished since the report was built.
    pub preview: Option<ItemPreview>,
}

/// Review material for a whole conflict report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergePreview {
    pub main_item_preview: Option<ItemPreview>,
    pub influence_previews: BTreeMap<usize, InfluencePreview>,
}

// =============================================================================
// CONFLICT ENGINE
// =============================================================================

/// Orchestrates conflict detection and resolution against any graph store.
pub struct ConflictEngine;

impl ConflictEngine {
    /// Validate a payload before any write.
    ///
    /// Checks the main item name (non-empty, no placeholder, length cap),
    /// the influence count cap, and every non-sentinel candidate's
    /// confidence range. Per-candidate name and text problems are not
    /// checked here; those surface as skips during application.
    pub fn validate_payload(payload: &CandidatePayload) -> Result<(), EtymonError> {
        let name = payload.main_item.name.trim();

        if name.is_empty() {
            return Err(EtymonError::Validation(
                "main item name must be non-empty".to_string(),
            ));
        }
        if is_sentinel_name(name) {
            return Err(EtymonError::Validation(format!(
                "main item name '{name}' is a placeholder"
            )));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EtymonError::Validation(format!(
                "main item name exceeds {MAX_NAME_LENGTH} bytes"
            )));
        }
        if payload.influences.len() > MAX_INFLUENCES_PER_CANDIDATE {
            return Err(EtymonError::Validation(format!(
                "payload carries {} influences; the cap is {MAX_INFLUENCES_PER_CANDIDATE}",
                payload.influences.len()
            )));
        }
        for candidate in &payload.influences {
            if is_sentinel_name(&candidate.name) {
                continue;
            }
            validate_confidence(candidate.confidence)?;
        }

        Ok(())
    }

    /// Rank existing items the payload's entities might duplicate.
    ///
    /// Runs the matcher once for the main item and once per candidate
    /// influence, skipping sentinel-named candidates. Read-only.
    pub fn find_comprehensive_conflicts<G: GraphStore>(
        graph: &G,
        payload: &CandidatePayload,
    ) -> Result<ConflictReport, EtymonError> {
        let main_item_conflicts = SimilarityMatcher::find_similar(
            graph,
            &payload.main_item.name,
            payload.main_item.creator.as_deref(),
        )?;
        let mut total_conflicts = main_item_conflicts.len();

        let mut influence_conflicts = BTreeMap::new();
        for (index, candidate) in payload.influences.iter().enumerate() {
            if is_sentinel_name(&candidate.name) {
                continue;
            }

            let similar_items = SimilarityMatcher::find_similar(
                graph,
                &candidate.name,
                candidate.creator_name.as_deref(),
            )?;
            if similar_items.is_empty() {
                continue;
            }

            total_conflicts = total_conflicts.saturating_add(similar_items.len());
            influence_conflicts.insert(
                index,
                InfluenceConflict {
                    candidate: candidate.clone(),
                    similar_items,
                },
            );
        }

        Ok(ConflictReport {
            main_item_conflicts,
            influence_conflicts,
            total_conflicts,
        })
    }

    /// Apply a resolved payload to the store.
    ///
    /// The main item goes first: a `merge` resolution reuses the named
    /// existing item (`NotFound` when absent), `create_new` writes a fresh
    /// one. With no main resolution at all, an exact-match (score 100)
    /// existing item fails the call with `Conflict` rather than silently
    /// duplicating; an explicit `create_new` always wins.
    ///
    /// Candidate influences are then applied in index order. Unresolved
    /// indices default to `create_new`.
    pub fn apply_resolutions<G: GraphStore>(
        graph: &mut G,
        payload: &CandidatePayload,
        main_resolution: Option<&Resolution>,
        influence_resolutions: &InfluenceResolutions,
    ) -> Result<ResolutionOutcome, EtymonError> {
        Self::validate_payload(payload)?;

        let main_name = payload.main_item.name.trim().to_string();
        let main_id = match main_resolution {
            Some(Resolution::Merge { target_item_id }) => {
                if !graph.contains_item(target_item_id)? {
                    return Err(EtymonError::item_not_found(target_item_id));
                }
                target_item_id.clone()
            }
            Some(Resolution::CreateNew) => Self::create_main_item(graph, payload)?,
            None => {
                let matches = SimilarityMatcher::find_similar(
                    graph,
                    &main_name,
                    payload.main_item.creator.as_deref(),
                )?;
                if matches.iter().any(|m| m.score == SCORE_EXACT) {
                    return Err(EtymonError::Conflict(format!(
                        "an item matching '{main_name}' already exists; resolve explicitly"
                    )));
                }
                Self::create_main_item(graph, payload)?
            }
        };

        let mut outcome = ResolutionOutcome::new(main_id.clone(), payload.influences.len());

        for (index, candidate) in payload.influences.iter().enumerate() {
            if is_sentinel_name(&candidate.name) {
                outcome.skip(index, &candidate.name, "sentinel or empty name");
                continue;
            }
            if let Err(e) = InfluenceEngine::validate_candidate(candidate) {
                let reason = e.to_string();
                log_skip(index, &candidate.name, &reason);
                outcome.skip(index, &candidate.name, reason);
                continue;
            }

            match influence_resolutions.get(&index) {
                Some(Resolution::Merge { target_item_id }) => {
                    if !graph.contains_item(target_item_id)? {
                        let reason = format!("merge target '{target_item_id}' not found");
                        log_skip(index, &candidate.name, &reason);
                        outcome.skip(index, &candidate.name, reason);
                        continue;
                    }
                    let attrs = InfluenceEngine::attrs_from_candidate(candidate, Utc::now());
                    let category = attrs.category.clone();
                    InfluenceEngine::upsert_influence(graph, target_item_id, &main_id, attrs)?;
                    InfluenceEngine::register_category(graph, &category)?;
                    outcome.influences_merged += 1;
                }
                Some(Resolution::CreateNew) | None => {
                    match Self::create_influence(graph, &main_id, &main_name, candidate) {
                        Ok(()) => outcome.influences_created += 1,
                        Err(EtymonError::Validation(reason)) => {
                            log_skip(index, &candidate.name, &reason);
                            outcome.skip(index, &candidate.name, reason);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Attach a payload's influences to an already-existing item.
    ///
    /// Backfills the primary creator when the item has none and the payload
    /// supplies one. Candidates whose name (case-insensitively) matches an
    /// item already influencing the target are skipped, so re-applying the
    /// same payload is idempotent. The duplicate set is fetched once and
    /// maintained across the batch.
    pub fn add_influences_to_existing<G: GraphStore>(
        graph: &mut G,
        existing: &ItemId,
        payload: &CandidatePayload,
    ) -> Result<ResolutionOutcome, EtymonError> {
        Self::validate_payload(payload)?;
        let existing_item = ItemEngine::get_item(graph, existing)?;

        if let Some(creator_name) = payload.main_item.creator.as_deref() {
            if !is_sentinel_name(creator_name)
                && CreatorEngine::creators_of(graph, existing)?.is_empty()
            {
                let creator = CreatorEngine::create_or_get(
                    graph,
                    creator_name,
                    payload.main_item.creator_type.unwrap_or_default(),
                )?;
                CreatorEngine::link_to_item(graph, existing, &creator.id, CreatorRole::primary())?;
            }
        }

        let mut influencing_names = BTreeSet::new();
        for (from, _) in graph.incoming(existing)? {
            if let Some(item) = graph.item(&from)? {
                influencing_names.insert(item.name.to_lowercase());
            }
        }

        let mut outcome = ResolutionOutcome::new(existing.clone(), payload.influences.len());

        for (index, candidate) in payload.influences.iter().enumerate() {
            if is_sentinel_name(&candidate.name) {
                outcome.skip(index, &candidate.name, "sentinel or empty name");
                continue;
            }
            if let Err(e) = InfluenceEngine::validate_candidate(candidate) {
                let reason = e.to_string();
                log_skip(index, &candidate.name, &reason);
                outcome.skip(index, &candidate.name, reason);
                continue;
            }

            let name_key = candidate.name.trim().to_lowercase();
            if influencing_names.contains(&name_key) {
                outcome.skip(index, &candidate.name, "already an influence on this item");
                continue;
            }

            match Self::create_influence(graph, existing, &existing_item.name, candidate) {
                Ok(()) => {
                    influencing_names.insert(name_key);
                    outcome.influences_created += 1;
                }
                Err(EtymonError::Validation(reason)) => {
                    log_skip(index, &candidate.name, &reason);
                    outcome.skip(index, &candidate.name, reason);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    /// The no-conflict bulk path: main item, primary creator, and every
    /// influence, with no conflict checking. Equivalent to
    /// [`apply_resolutions`](Self::apply_resolutions) with everything
    /// explicitly `create_new`.
    pub fn save_payload<G: GraphStore>(
        graph: &mut G,
        payload: &CandidatePayload,
    ) -> Result<ResolutionOutcome, EtymonError> {
        Self::apply_resolutions(
            graph,
            payload,
            Some(&Resolution::CreateNew),
            &InfluenceResolutions::new(),
        )
    }

    /// The graph context around one item: linked creators, names of its
    /// current influences, and the categories on those edges.
    pub fn get_item_preview<G: GraphStore>(
        graph: &G,
        id: &ItemId,
    ) -> Result<ItemPreview, EtymonError> {
        let item = ItemEngine::get_item(graph, id)?;
        let creators = CreatorEngine::creators_of(graph, id)?
            .into_iter()
            .map(|(creator, _)| creator.name)
            .collect();

        let mut existing_influences = Vec::new();
        let mut categories = BTreeSet::new();
        for (from, attrs) in graph.incoming(id)? {
            if let Some(influence) = graph.item(&from)? {
                existing_influences.push(influence.name);
            }
            categories.insert(attrs.category);
        }
        existing_influences.sort();

        Ok(ItemPreview {
            item,
            creators,
            existing_influences,
            categories: categories.into_iter().collect(),
        })
    }

    /// Review material for a report: the top-ranked match for the main item
    /// and for each conflicting influence, each with its graph context.
    pub fn get_comprehensive_preview<G: GraphStore>(
        graph: &G,
        report: &ConflictReport,
    ) -> Result<MergePreview, EtymonError> {
        let main_item_preview = match report.main_item_conflicts.first() {
            Some(top) => Self::preview_or_none(graph, &top.item.id)?,
            None => None,
        };

        let mut influence_previews = BTreeMap::new();
        for (index, conflict) in &report.influence_conflicts {
            let Some(top) = conflict.similar_items.first() else {
                continue;
            };
            influence_previews.insert(
                *index,
                InfluencePreview {
                    candidate: conflict.candidate.clone(),
                    similar_item: top.clone(),
                    preview: Self::preview_or_none(graph, &top.item.id)?,
                },
            );
        }

        Ok(MergePreview {
            main_item_preview,
            influence_previews,
        })
    }

    // -------------------------------------------------------------------------
    // Write helpers
    // -------------------------------------------------------------------------

    /// Create the payload's main item and link its primary creator.
    fn create_main_item<G: GraphStore>(
        graph: &mut G,
        payload: &CandidatePayload,
    ) -> Result<ItemId, EtymonError> {
        let main = &payload.main_item;
        let item = ItemEngine::create_item(
            graph,
            NewItem {
                name: main.name.clone(),
                auto_detected_type: main.item_type.clone(),
                year: main.year,
                description: main.description.clone(),
                confidence_score: None,
                verification_status: VerificationStatus::default(),
            },
        )?;

        if let Some(creator_name) = main.creator.as_deref() {
            if !is_sentinel_name(creator_name) {
                let creator = CreatorEngine::create_or_get(
                    graph,
                    creator_name,
                    main.creator_type.unwrap_or_default(),
                )?;
                CreatorEngine::link_to_item(graph, &item.id, &creator.id, CreatorRole::primary())?;
            }
        }

        Ok(item.id)
    }

    /// Create one influence item with its creator, edge, and category.
    ///
    /// The item description falls back to the candidate's explanation, then
    /// to "Influence on {main item name}".
    fn create_influence<G: GraphStore>(
        graph: &mut G,
        main_id: &ItemId,
        main_name: &str,
        candidate: &CandidateInfluence,
    ) -> Result<(), EtymonError> {
        let description = candidate
            .explanation
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(|| format!("Influence on {main_name}"), str::to_string);

        let item = ItemEngine::create_item(
            graph,
            NewItem {
                name: candidate.name.clone(),
                auto_detected_type: candidate.item_type.clone(),
                year: candidate.year,
                description: Some(description),
                confidence_score: Some(candidate.confidence),
                verification_status: VerificationStatus::default(),
            },
        )?;

        if let Some(creator_name) = candidate.creator_name.as_deref() {
            if !is_sentinel_name(creator_name) {
                let creator = CreatorEngine::create_or_get(
                    graph,
                    creator_name,
                    candidate.creator_type.unwrap_or_default(),
                )?;
                CreatorEngine::link_to_item(graph, &item.id, &creator.id, CreatorRole::primary())?;
            }
        }

        let attrs = InfluenceEngine::attrs_from_candidate(candidate, Utc::now());
        let category = attrs.category.clone();
        InfluenceEngine::upsert_influence(graph, &item.id, main_id, attrs)?;
        InfluenceEngine::register_category(graph, &category)?;

        Ok(())
    }

    fn preview_or_none<G: GraphStore>(
        graph: &G,
        id: &ItemId,
    ) -> Result<Option<ItemPreview>, EtymonError> {
        match Self::get_item_preview(graph, id) {
            Ok(preview) => Ok(Some(preview)),
            Err(EtymonError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Structured stderr record for a skipped candidate. The app layer owns
/// real tracing; this keeps skips observable from the library alone.
fn log_skip(index: usize, name: &str, reason: &str) {
    eprintln!(
        "{{\"level\":\"warn\",\"target\":\"etymon_core::conflict\",\"message\":\"skipping influence {index} ('{name}'): {reason}\"}}"
    );
}

// =============================================================================
// TESTS
// =============================================================================
