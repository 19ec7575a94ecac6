//! # Creator Engine
//!
//! Creator nodes and their `CREATED_BY` linkage to items.
//!
//! Creators are deduplicated by exact name: creating "Eminem" twice yields
//! the same record, regardless of the creator type supplied the second time.

use crate::graph::GraphStore;
use crate::identity;
use crate::primitives::MAX_NAME_LENGTH;
use crate::types::{Creator, CreatorId, CreatorRole, CreatorType, EtymonError, ItemId};

/// The CreatorEngine handles creator CRUD against any graph store.
pub struct CreatorEngine;

impl CreatorEngine {
    /// Create a creator, or return the existing one with the same name.
    ///
    /// Name matching is exact and case-sensitive; the first-seen record wins,
    /// including its type.
    pub fn create_or_get<G: GraphStore>(
        graph: &mut G,
        name: &str,
        creator_type: CreatorType,
    ) -> Result<Creator, EtymonError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(EtymonError::Validation(
                "creator name must be non-empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(EtymonError::Validation(format!(
                "creator name exceeds {MAX_NAME_LENGTH} bytes"
            )));
        }

        if let Some(existing) = graph.creator_by_name(name)? {
            return Ok(existing);
        }

        let creator = Creator {
            id: identity::mint_creator_id(name, creator_type),
            name: name.to_string(),
            creator_type,
        };
        graph.put_creator(creator.clone())?;
        Ok(creator)
    }

    /// Link a creator to an item with the given role.
    ///
    /// Idempotent per (item, creator, role) triple. Both endpoints must
    /// already exist.
    pub fn link_to_item<G: GraphStore>(
        graph: &mut G,
        item: &ItemId,
        creator: &CreatorId,
        role: CreatorRole,
    ) -> Result<(), EtymonError> {
        graph.link_creator(item, creator, role)
    }

    /// All creators linked to an item, with their roles.
    pub fn creators_of<G: GraphStore>(
        graph: &G,
        item: &ItemId,
    ) -> Result<Vec<(Creator, CreatorRole)>, EtymonError> {
        graph.creators_of(item)
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

    #[test]
    fn create_or_get_is_idempotent() {
        let mut graph = MemoryGraph::new();

        let first =
            CreatorEngine::create_or_get(&mut graph, "Eminem", CreatorType::Person).expect("create");
        let second =
            CreatorEngine::create_or_get(&mut graph, "Eminem", CreatorType::Person).expect("get");

        assert_eq!(first.id, second.id);
        assert_eq!(graph.creator_count().expect("count"), 1);
    }

    #[test]
    fn first_seen_type_wins() {
        let mut graph = MemoryGraph::new();

        let first = CreatorEngine::create_or_get(&mut graph, "Wu-Tang Clan", CreatorType::Collective)
            .expect("create");
        let second = CreatorEngine::create_or_get(&mut graph, "Wu-Tang Clan", CreatorType::Person)
            .expect("get");

        assert_eq!(second.id, first.id);
        assert_eq!(second.creator_type, CreatorType::Collective);
    }

    #[test]
    fn name_matching_is_exact() {
        let mut graph = MemoryGraph::new();

        CreatorEngine::create_or_get(&mut graph, "Eminem", CreatorType::Person).expect("create");
        CreatorEngine::create_or_get(&mut graph, "eminem", CreatorType::Person).expect("create");

        assert_eq!(graph.creator_count().expect("count"), 2);
    }

    #[test]
    fn empty_name_rejected() {
        let mut graph = MemoryGraph::new();
        assert!(CreatorEngine::create_or_get(&mut graph, "   ", CreatorType::Person).is_err());
    }

    #[test]
    fn link_and_list_roles() {
        let mut graph = MemoryGraph::new();
        let item = ItemEngine::create_item(&mut graph, NewItem::new("Stan")).expect("create");
        let creator =
            CreatorEngine::create_or_get(&mut graph, "Eminem", CreatorType::Person).expect("create");

        CreatorEngine::link_to_item(&mut graph, &item.id, &creator.id, CreatorRole::primary())
            .expect("link");
        CreatorEngine::link_to_item(&mut graph, &item.id, &creator.id, CreatorRole::primary())
            .expect("relink");

        let linked = CreatorEngine::creators_of(&graph, &item.id).expect("list");
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].0.name, "Eminem");
        assert_eq!(linked[0].1, CreatorRole::primary());
    }

    #[test]
    fn link_requires_existing_endpoints() {
        let mut graph = MemoryGraph::new();
        let creator =
            CreatorEngine::create_or_get(&mut graph, "Eminem", CreatorType::Person).expect("create");

        let err = CreatorEngine::link_to_item(
            &mut graph,
            &ItemId::new("ghost"),
            &creator.id,
            CreatorRole::primary(),
        )
        .expect_err("missing item");
        assert!(matches!(err, EtymonError::NotFound(_)));
    }
}
