//! # Similarity Matcher
//!
//! Rule-based scoring of "are these two names the same real-world thing?".
//!
//! This is the conflict-detection primitive: every creation path runs a
//! candidate name through it before writing, and the resolution engine
//! builds its conflict reports from its output.
//!
//! ## Score Ladder
//!
//! Evaluated in priority order, highest applicable score wins:
//!
//! 1. Exact normalized-name match -> 100.
//! 2. Candidate name contained in an existing name -> 90.
//! 3. Existing name contained in the candidate name -> 85.
//! 4. Token overlap >= 60% -> the percentage itself, capped at 80.
//!
//! Containment requires the contained name to be at least 4 characters.
//! No rule firing means score 0, which excludes the pair entirely.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::GraphStore;
use crate::primitives::{
    MAX_SIMILAR_RESULTS, MIN_CONTAINMENT_LENGTH, MIN_TOKEN_LENGTH, SCORE_CANDIDATE_IN_EXISTING,
    SCORE_EXACT, SCORE_EXISTING_IN_CANDIDATE, SCORE_TOKEN_OVERLAP_CAP, SENTINEL_NAMES, STOP_WORDS,
    TOKEN_OVERLAP_MIN_PCT,
};
use crate::types::{EtymonError, Item};

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// One ranked match from a similarity lookup.
///
/// Creators and the incoming-influence count are evidence for a human
/// deciding merge-vs-create, not inputs to the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarItem {
    pub item: Item,
    pub creators: Vec<String>,
    pub influence_count: usize,
    pub score: u32,
}

// =============================================================================
// SIMILARITY MATCHER
// =============================================================================

/// Stateless entity-resolution scorer.
pub struct SimilarityMatcher;

impl SimilarityMatcher {
    /// Rank existing items that plausibly match the candidate name.
    ///
    /// An item is included when its name score is nonzero OR when
    /// `creator_name` is supplied and contained (case-insensitively) in
    /// one of the item's linked creator names. Creator containment is an
    /// inclusion condition only; such items keep their name score.
    ///
    /// Results are ordered by score descending, with name then id as
    /// tie-breaks, and capped at `MAX_SIMILAR_RESULTS`. No match is an
    /// empty list, not an error.
    pub fn find_similar<G: GraphStore>(
        graph: &G,
        name: &str,
        creator_name: Option<&str>,
    ) -> Result<Vec<SimilarItem>, EtymonError> {
        let candidate = normalize_name(name);
        let creator_query = creator_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches = Vec::new();
        for item in graph.items()? {
            let score = Self::score_normalized(&candidate, &normalize_name(&item.name));

            let creators: Vec<String> = graph
                .creators_of(&item.id)?
                .into_iter()
                .map(|(creator, _)| creator.name)
                .collect();

            let creator_hit = creator_query.as_deref().is_some_and(|query| {
                creators
                    .iter()
                    .any(|creator| creator.to_lowercase().contains(query))
            });

            if score == 0 && !creator_hit {
                continue;
            }

            let influence_count = graph.incoming_count(&item.id)?;
            matches.push(SimilarItem {
                item,
                creators,
                influence_count,
                score,
            });
        }

        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.item.name.cmp(&b.item.name))
                .then_with(|| a.item.id.cmp(&b.item.id))
        });
        matches.truncate(MAX_SIMILAR_RESULTS);
        Ok(matches)
    }

    /// Score a candidate name against an existing name. Both are
    /// normalized first.
    #[must_use]
    pub fn score_names(candidate: &str, existing: &str) -> u32 {
        Self::score_normalized(&normalize_name(candidate), &normalize_name(existing))
    }

    fn score_normalized(candidate: &str, existing: &str) -> u32 {
        if candidate.is_empty() || existing.is_empty() {
            return 0;
        }

        if candidate == existing {
            return SCORE_EXACT;
        }

        if candidate.len() >= MIN_CONTAINMENT_LENGTH && existing.contains(candidate) {
            return SCORE_CANDIDATE_IN_EXISTING;
        }

        if existing.len() >= MIN_CONTAINMENT_LENGTH && candidate.contains(existing) {
            return SCORE_EXISTING_IN_CANDIDATE;
        }

        let candidate_tokens = token_set(candidate);
        if candidate_tokens.is_empty() {
            return 0;
        }
        let existing_tokens = token_set(existing);

        let overlap = candidate_tokens.intersection(&existing_tokens).count();
        let pct = overlap.saturating_mul(100) / candidate_tokens.len();
        let pct = u32::try_from(pct).unwrap_or(0);

        if pct >= TOKEN_OVERLAP_MIN_PCT {
            pct.min(SCORE_TOKEN_OVERLAP_CAP)
        } else {
            0
        }
    }
}

// =============================================================================
// NAME HANDLING
// =============================================================================

/// Canonical comparison form of a name: lowercased, apostrophes and
/// quotes dropped, all other punctuation treated as word breaks,
/// whitespace collapsed.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            '\'' | '"' => {}
            c if c.is_alphanumeric() => out.push(c),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for placeholder names an upstream generation step emits when it
/// has nothing to say ("none", "null", empty).
#[must_use]
pub fn is_sentinel_name(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    SENTINEL_NAMES.contains(&lowered.as_str())
}

fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.len() >= MIN_TOKEN_LENGTH && !STOP_WORDS.contains(token))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::types::{Creator, CreatorId, CreatorRole, InfluenceAttrs, ItemId};

    fn test_item(id: &str, name: &str) -> Item {
        Item {
            id: ItemId::new(id),
            name: name.to_string(),
            auto_detected_type: None,
            year: None,
            description: None,
            confidence_score: None,
            verification_status: Default::default(),
            created_at: None,
        }
    }

    #[test]
    fn normalization_collapses_punctuation_and_case() {
        assert_eq!(normalize_name("The Matrix"), "the matrix");
        assert_eq!(normalize_name("  Spider-Man  "), "spider man");
        assert_eq!(normalize_name("Don't Look Back"), "dont look back");
        assert_eq!(normalize_name("Rock & Roll"), "rock roll");
        assert_eq!(normalize_name("snake_case_title"), "snake case title");
    }

    #[test]
    fn exact_match_scores_100() {
        assert_eq!(SimilarityMatcher::score_names("Stan", "Stan"), 100);
        assert_eq!(SimilarityMatcher::score_names("thank you", "Thank You"), 100);
        assert_eq!(
            SimilarityMatcher::score_names("Spider-Man", "Spider Man"),
            100
        );
    }

    #[test]
    fn containment_scores_90_and_85() {
        assert_eq!(
            SimilarityMatcher::score_names("The Matrix", "The Matrix Reloaded"),
            90
        );
        assert_eq!(
            SimilarityMatcher::score_names("The Matrix Reloaded", "The Matrix"),
            85
        );
    }

    #[test]
    fn short_names_never_trigger_containment() {
        // "it" is two characters; the guard blocks both directions.
        assert_eq!(SimilarityMatcher::score_names("It", "It Follows"), 0);
        assert_eq!(SimilarityMatcher::score_names("It Follows", "It"), 0);
    }

    #[test]
    fn token_overlap_scores_the_percentage() {
        // {dark, knight, returns} vs {dark, knight, rises}: 2 of 3 = 66%.
        assert_eq!(
            SimilarityMatcher::score_names("Dark Knight Returns", "The Dark Knight Rises"),
            66
        );
    }

    #[test]
    fn token_overlap_is_capped_at_80() {
        // All candidate tokens match but the names are not substrings.
        assert_eq!(
            SimilarityMatcher::score_names("Worlds War", "The War of the Worlds"),
            80
        );
    }

    #[test]
    fn weak_token_overlap_scores_zero() {
        // {city, gold, dreams} vs {city, lights}: 1 of 3 = 33%, below 60.
        assert_eq!(
            SimilarityMatcher::score_names("City Gold Dreams", "City Lights"),
            0
        );
        assert_eq!(SimilarityMatcher::score_names("Inception", "The Matrix"), 0);
    }

    #[test]
    fn sentinel_names_are_detected() {
        assert!(is_sentinel_name("None"));
        assert!(is_sentinel_name(" null "));
        assert!(is_sentinel_name(""));
        assert!(is_sentinel_name("   "));
        assert!(!is_sentinel_name("Nonexistent"));
        assert!(!is_sentinel_name("Stan"));
    }

    #[test]
    fn find_similar_returns_ranked_annotated_matches() {
        let mut graph = MemoryGraph::new();
        graph
            .put_item(test_item("matrix-reloaded-1", "The Matrix Reloaded"))
            .expect("put");
        graph
            .put_item(test_item("feeder-1", "Feeder"))
            .expect("put");
        graph
            .put_influence(
                &ItemId::new("feeder-1"),
                &ItemId::new("matrix-reloaded-1"),
                InfluenceAttrs {
                    confidence: 0.8,
                    influence_type: "inspiration".to_string(),
                    explanation: "test".to_string(),
                    category: "Film".to_string(),
                    scope: None,
                    source: None,
                    year_of_influence: None,
                    clusters: Vec::new(),
                    created_at: None,
                },
            )
            .expect("edge");

        let matches =
            SimilarityMatcher::find_similar(&graph, "The Matrix", None).expect("find");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].item.name, "The Matrix Reloaded");
        assert_eq!(matches[0].score, 90);
        assert_eq!(matches[0].influence_count, 1);
    }

    #[test]
    fn find_similar_with_no_match_returns_empty() {
        let mut graph = MemoryGraph::new();
        graph
            .put_item(test_item("inception-1", "Inception"))
            .expect("put");

        let matches =
            SimilarityMatcher::find_similar(&graph, "The Matrix", None).expect("find");
        assert!(matches.is_empty());
    }

    #[test]
    fn exact_match_ranks_first() {
        let mut graph = MemoryGraph::new();
        graph
            .put_item(test_item("matrix-1", "The Matrix"))
            .expect("put");
        graph
            .put_item(test_item("matrix-reloaded-1", "The Matrix Reloaded"))
            .expect("put");

        let matches =
            SimilarityMatcher::find_similar(&graph, "The Matrix", None).expect("find");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].item.name, "The Matrix");
        assert_eq!(matches[0].score, 100);
        assert_eq!(matches[1].score, 90);
    }

    #[test]
    fn creator_containment_includes_zero_score_items() {
        let mut graph = MemoryGraph::new();
        graph
            .put_item(test_item("memento-1", "Memento"))
            .expect("put");
        graph
            .put_creator(Creator {
                id: CreatorId::new("christopher-nolan-person-1"),
                name: "Christopher Nolan".to_string(),
                creator_type: Default::default(),
            })
            .expect("put");
        graph
            .link_creator(
                &ItemId::new("memento-1"),
                &CreatorId::new("christopher-nolan-person-1"),
                CreatorRole::primary(),
            )
            .expect("link");

        let matches =
            SimilarityMatcher::find_similar(&graph, "Unrelated Title", Some("nolan"))
                .expect("find");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].item.name, "Memento");
        assert_eq!(matches[0].score, 0);
        assert_eq!(matches[0].creators, vec!["Christopher Nolan".to_string()]);
    }

    #[test]
    fn results_are_capped() {
        let mut graph = MemoryGraph::new();
        for i in 0..8 {
            graph
                .put_item(test_item(&format!("stan-{i}"), "Stan"))
                .expect("put");
        }

        let matches = SimilarityMatcher::find_similar(&graph, "Stan", None).expect("find");
        assert_eq!(matches.len(), MAX_SIMILAR_RESULTS);
        assert!(matches.iter().all(|m| m.score == 100));
    }
}
