//! # Influence Engine
//!
//! Directed `INFLUENCES` edges and their attribute cleanup.
//!
//! Candidates arrive from an external generation process with uneven
//! quality. The engine validates each one, substitutes documented fallback
//! values for the required text fields, and upserts the edge — at most one
//! edge exists per ordered item pair, and re-asserting a pair overwrites
//! its whole attribute record.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::graph::GraphStore;
use crate::items::validate_confidence;
use crate::primitives::{
    DEFAULT_CATEGORY, DEFAULT_EXPLANATION, DEFAULT_INFLUENCE_TYPE, MAX_NAME_LENGTH,
    MAX_TEXT_LENGTH,
};
use crate::types::{
    CandidateInfluence, Category, EtymonError, InfluenceAttrs, ItemId, Scope,
};

/// The InfluenceEngine handles influence edges against any graph store.
pub struct InfluenceEngine;

impl InfluenceEngine {
    /// Validate a candidate influence.
    ///
    /// A candidate is valid if:
    /// - The name is non-empty after trimming and within length limits
    /// - The confidence is a finite value in 0.0–1.0
    /// - The explanation, when present, is within length limits
    ///
    /// Sentinel names ("none"/"null") are a skip condition decided by the
    /// orchestrator, not a validation failure.
    pub fn validate_candidate(candidate: &CandidateInfluence) -> Result<(), EtymonError> {
        let name = candidate.name.trim();

        if name.is_empty() {
            return Err(EtymonError::Validation(
                "influence name must be non-empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EtymonError::Validation(format!(
                "influence name exceeds {MAX_NAME_LENGTH} bytes"
            )));
        }
        validate_confidence(candidate.confidence)?;
        if let Some(explanation) = &candidate.explanation {
            if explanation.len() > MAX_TEXT_LENGTH {
                return Err(EtymonError::Validation(format!(
                    "influence explanation exceeds {MAX_TEXT_LENGTH} bytes"
                )));
            }
        }

        Ok(())
    }

    /// Build the edge attribute record for a candidate.
    ///
    /// Required text fields fall back to their documented defaults; scope
    /// defaults to macro; clusters are trimmed and deduplicated preserving
    /// first-occurrence order.
    #[must_use]
    pub fn attrs_from_candidate(
        candidate: &CandidateInfluence,
        now: DateTime<Utc>,
    ) -> InfluenceAttrs {
        let explanation = candidate
            .explanation
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string();
        let category = candidate
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        let influence_type = candidate
            .influence_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_INFLUENCE_TYPE)
            .to_string();
        let source = candidate
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut clusters = Vec::new();
        let mut seen = BTreeSet::new();
        for cluster in &candidate.clusters {
            let cluster = cluster.trim();
            if cluster.is_empty() || !seen.insert(cluster.to_string()) {
                continue;
            }
            clusters.push(cluster.to_string());
        }

        InfluenceAttrs {
            confidence: candidate.confidence,
            influence_type,
            explanation,
            category,
            scope: Some(candidate.scope.unwrap_or(Scope::Macro)),
            source,
            year_of_influence: candidate.year,
            clusters,
            created_at: Some(now),
        }
    }

    /// Upsert the influence edge `from —INFLUENCES→ to`.
    ///
    /// Both endpoints must exist. Re-asserting an existing pair replaces
    /// the previous attribute record.
    pub fn upsert_influence<G: GraphStore>(
        graph: &mut G,
        from: &ItemId,
        to: &ItemId,
        attrs: InfluenceAttrs,
    ) -> Result<(), EtymonError> {
        validate_confidence(attrs.confidence)?;
        graph.put_influence(from, to, attrs)
    }

    /// Register a category use: create it on first sight, bump the usage
    /// counter afterwards.
    pub fn register_category<G: GraphStore>(
        graph: &mut G,
        name: &str,
    ) -> Result<Category, EtymonError> {
        graph.bump_category(name, Utc::now())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::items::{ItemEngine, NewItem};

    fn candidate(name: &str, confidence: f64) -> CandidateInfluence {
        CandidateInfluence::new(name, confidence)
    }

    #[test]
    fn validate_rejects_empty_name_and_bad_confidence() {
        assert!(InfluenceEngine::validate_candidate(&candidate("  ", 0.5)).is_err());
        assert!(InfluenceEngine::validate_candidate(&candidate("Thank You", 1.5)).is_err());
        assert!(InfluenceEngine::validate_candidate(&candidate("Thank You", f64::NAN)).is_err());
        assert!(InfluenceEngine::validate_candidate(&candidate("Thank You", 0.95)).is_ok());
    }

    #[test]
    fn attrs_apply_documented_fallbacks() {
        let now = Utc::now();
        let attrs = InfluenceEngine::attrs_from_candidate(&candidate("Thank You", 0.95), now);

        assert_eq!(attrs.explanation, DEFAULT_EXPLANATION);
        assert_eq!(attrs.category, DEFAULT_CATEGORY);
        assert_eq!(attrs.influence_type, DEFAULT_INFLUENCE_TYPE);
        assert_eq!(attrs.scope, Some(Scope::Macro));
        assert_eq!(attrs.created_at, Some(now));
        assert!(attrs.source.is_none());
    }

    #[test]
    fn attrs_trim_and_keep_supplied_values() {
        let mut c = candidate("Thank You", 0.95);
        c.explanation = Some("  sampled the chorus  ".to_string());
        c.category = Some("Audio Samples".to_string());
        c.influence_type = Some("audio_sample".to_string());
        c.scope = Some(Scope::Nano);
        c.source = Some("   ".to_string());
        c.year = Some(1998);

        let attrs = InfluenceEngine::attrs_from_candidate(&c, Utc::now());
        assert_eq!(attrs.explanation, "sampled the chorus");
        assert_eq!(attrs.category, "Audio Samples");
        assert_eq!(attrs.influence_type, "audio_sample");
        assert_eq!(attrs.scope, Some(Scope::Nano));
        assert_eq!(attrs.year_of_influence, Some(1998));
        assert!(attrs.source.is_none());
    }

    #[test]
    fn clusters_deduplicate_preserving_order() {
        let mut c = candidate("Thank You", 0.95);
        c.clusters = vec![
            " chorus ".to_string(),
            "production".to_string(),
            "chorus".to_string(),
            "".to_string(),
        ];

        let attrs = InfluenceEngine::attrs_from_candidate(&c, Utc::now());
        assert_eq!(attrs.clusters, vec!["chorus", "production"]);
    }

    #[test]
    fn upsert_replaces_existing_edge() {
        let mut graph = MemoryGraph::new();
        let a = ItemEngine::create_item(&mut graph, NewItem::new("Thank You")).expect("create");
        let b = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");

        let first = InfluenceEngine::attrs_from_candidate(&candidate("Thank You", 0.4), Utc::now());
        InfluenceEngine::upsert_influence(&mut graph, &a.id, &b.id, first).expect("upsert");

        let second =
            InfluenceEngine::attrs_from_candidate(&candidate("Thank You", 0.95), Utc::now());
        InfluenceEngine::upsert_influence(&mut graph, &a.id, &b.id, second).expect("upsert");

        assert_eq!(graph.influence_count().expect("count"), 1);
        let stored = graph.influence(&a.id, &b.id).expect("get").expect("edge");
        assert_eq!(stored.confidence, 0.95);
    }

    #[test]
    fn register_category_counts_uses() {
        let mut graph = MemoryGraph::new();

        let first = InfluenceEngine::register_category(&mut graph, "Audio Samples").expect("bump");
        assert_eq!(first.usage_count, 1);
        assert!(first.created_at.is_some());

        let second = InfluenceEngine::register_category(&mut graph, "Audio Samples").expect("bump");
        assert_eq!(second.usage_count, 2);
    }
}
