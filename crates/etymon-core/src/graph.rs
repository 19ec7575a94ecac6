//! # Graph Engine
//!
//! The deterministic property-graph storage for the Etymon CORE.
//!
//! This module defines the `GraphStore` trait and its in-memory
//! implementation. All data structures use `BTreeMap` for deterministic
//! ordering.
//!
//! Two node labels (Item, Creator) plus a lightweight Category index,
//! and two edge kinds: `INFLUENCES` (item -> item, attributed) and
//! `CREATED_BY` (item -> creator, role-labelled). At most one influence
//! edge exists per ordered item pair.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{
    Category, Creator, CreatorId, CreatorRole, EtymonError, InfluenceAttrs, Item, ItemId,
};

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the core graph operations.
///
/// All mutation of the graph goes through these methods, so the
/// one-edge-per-pair and id-uniqueness invariants are enforced in one
/// place regardless of backend.
///
/// All fallible operations return `Result<T, EtymonError>` to support both
/// in-memory and persistent storage backends uniformly.
pub trait GraphStore {
    /// Insert or overwrite an item record keyed by its id.
    fn put_item(&mut self, item: Item) -> Result<(), EtymonError>;

    /// Lookup an item by id. Returns an owned record for storage compatibility.
    fn item(&self, id: &ItemId) -> Result<Option<Item>, EtymonError>;

    /// All items, ordered by id.
    fn items(&self) -> Result<Vec<Item>, EtymonError>;

    /// Check if an item exists.
    fn contains_item(&self, id: &ItemId) -> Result<bool, EtymonError>;

    /// Delete an item together with every edge touching it, in either
    /// direction, including creator links. Returns false if absent.
    fn detach_delete_item(&mut self, id: &ItemId) -> Result<bool, EtymonError>;

    /// Insert or overwrite a creator record keyed by its id.
    fn put_creator(&mut self, creator: Creator) -> Result<(), EtymonError>;

    /// Lookup a creator by id.
    fn creator(&self, id: &CreatorId) -> Result<Option<Creator>, EtymonError>;

    /// Lookup a creator by exact, case-sensitive name.
    fn creator_by_name(&self, name: &str) -> Result<Option<Creator>, EtymonError>;

    /// Link an item to a creator with a role. Idempotent for an
    /// identical (item, creator, role) triple.
    fn link_creator(
        &mut self,
        item: &ItemId,
        creator: &CreatorId,
        role: CreatorRole,
    ) -> Result<(), EtymonError>;

    /// Creators linked to an item, with their roles, ordered by creator id.
    fn creators_of(&self, item: &ItemId) -> Result<Vec<(Creator, CreatorRole)>, EtymonError>;

    /// Insert or overwrite the influence edge `from -> to` (upsert: the
    /// whole attribute record is replaced when the edge exists).
    fn put_influence(
        &mut self,
        from: &ItemId,
        to: &ItemId,
        attrs: InfluenceAttrs,
    ) -> Result<(), EtymonError>;

    /// Get the attribute record of an influence edge, if present.
    fn influence(
        &self,
        from: &ItemId,
        to: &ItemId,
    ) -> Result<Option<InfluenceAttrs>, EtymonError>;

    /// Remove a single influence edge. Returns false if absent.
    fn remove_influence(&mut self, from: &ItemId, to: &ItemId) -> Result<bool, EtymonError>;

    /// Incoming influence edges of an item: every `source -> item` pair,
    /// ordered by source id.
    fn incoming(&self, to: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError>;

    /// Outgoing influence edges of an item: every `item -> target` pair,
    /// ordered by target id.
    fn outgoing(&self, from: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError>;

    /// Number of incoming influence edges, without materializing records.
    fn incoming_count(&self, to: &ItemId) -> Result<usize, EtymonError>;

    /// Number of outgoing influence edges, without materializing records.
    fn outgoing_count(&self, from: &ItemId) -> Result<usize, EtymonError>;

    /// Create the category on first use (usage_count = 1) or increment
    /// its usage counter. Returns the record after the bump.
    fn bump_category(
        &mut self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Category, EtymonError>;

    /// Lookup a category by name.
    fn category(&self, name: &str) -> Result<Option<Category>, EtymonError>;

    /// All categories, ordered by name.
    fn categories(&self) -> Result<Vec<Category>, EtymonError>;

    /// Total number of items.
    fn item_count(&self) -> Result<usize, EtymonError>;

    /// Total number of creators.
    fn creator_count(&self) -> Result<usize, EtymonError>;

    /// Total number of influence edges.
    fn influence_count(&self) -> Result<usize, EtymonError>;

    /// Capture the whole graph as a serializable snapshot.
    fn snapshot(&self) -> Result<GraphSnapshot, EtymonError>;

    /// Replace the whole graph with the snapshot's contents.
    fn load_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), EtymonError>;
}

// =============================================================================
// IN-MEMORY GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory graph.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
/// No `HashMap` allowed.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    /// Item storage: ItemId -> Item
    items: BTreeMap<ItemId, Item>,

    /// Creator storage: CreatorId -> Creator
    creators: BTreeMap<CreatorId, Creator>,

    /// Exact-name lookup: name -> CreatorId
    creator_name_index: BTreeMap<String, CreatorId>,

    /// CREATED_BY edges: item -> {(creator, role)}
    created_by: BTreeMap<ItemId, BTreeSet<(CreatorId, CreatorRole)>>,

    /// INFLUENCES adjacency: source -> (target -> attrs)
    influences: BTreeMap<ItemId, BTreeMap<ItemId, InfluenceAttrs>>,

    /// Reverse adjacency: target -> {sources}
    reverse: BTreeMap<ItemId, BTreeSet<ItemId>>,

    /// Category index: name -> Category
    categories: BTreeMap<String, Category>,
}

impl MemoryGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All influence edges in deterministic (source, target) order.
    pub fn influence_edges(
        &self,
    ) -> impl Iterator<Item = (&ItemId, &ItemId, &InfluenceAttrs)> + '_ {
        self.influences.iter().flat_map(|(from, targets)| {
            targets.iter().map(move |(to, attrs)| (from, to, attrs))
        })
    }

    /// Check if an influence edge exists (internal, non-Result version).
    #[must_use]
    pub fn contains_influence(&self, from: &ItemId, to: &ItemId) -> bool {
        self.influences
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }
}

impl GraphStore for MemoryGraph {
    fn put_item(&mut self, item: Item) -> Result<(), EtymonError> {
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    fn item(&self, id: &ItemId) -> Result<Option<Item>, EtymonError> {
        Ok(self.items.get(id).cloned())
    }

    fn items(&self) -> Result<Vec<Item>, EtymonError> {
        Ok(self.items.values().cloned().collect())
    }

    fn contains_item(&self, id: &ItemId) -> Result<bool, EtymonError> {
        Ok(self.items.contains_key(id))
    }

    fn detach_delete_item(&mut self, id: &ItemId) -> Result<bool, EtymonError> {
        if self.items.remove(id).is_none() {
            return Ok(false);
        }

        self.created_by.remove(id);

        // Outgoing edges: drop the adjacency row and the reverse entries.
        if let Some(targets) = self.influences.remove(id) {
            for to in targets.keys() {
                if let Some(sources) = self.reverse.get_mut(to) {
                    sources.remove(id);
                }
            }
        }

        // Incoming edges: drop each source's forward entry.
        if let Some(sources) = self.reverse.remove(id) {
            for from in &sources {
                if let Some(targets) = self.influences.get_mut(from) {
                    targets.remove(id);
                }
            }
        }

        Ok(true)
    }

    fn put_creator(&mut self, creator: Creator) -> Result<(), EtymonError> {
        self.creator_name_index
            .insert(creator.name.clone(), creator.id.clone());
        self.creators.insert(creator.id.clone(), creator);
        Ok(())
    }

    fn creator(&self, id: &CreatorId) -> Result<Option<Creator>, EtymonError> {
        Ok(self.creators.get(id).cloned())
    }

    fn creator_by_name(&self, name: &str) -> Result<Option<Creator>, EtymonError> {
        Ok(self
            .creator_name_index
            .get(name)
            .and_then(|id| self.creators.get(id))
            .cloned())
    }

    fn link_creator(
        &mut self,
        item: &ItemId,
        creator: &CreatorId,
        role: CreatorRole,
    ) -> Result<(), EtymonError> {
        if !self.items.contains_key(item) {
            return Err(EtymonError::item_not_found(item));
        }
        if !self.creators.contains_key(creator) {
            return Err(EtymonError::NotFound(format!("creator '{creator}'")));
        }
        self.created_by
            .entry(item.clone())
            .or_default()
            .insert((creator.clone(), role));
        Ok(())
    }

    fn creators_of(&self, item: &ItemId) -> Result<Vec<(Creator, CreatorRole)>, EtymonError> {
        let mut result = Vec::new();
        if let Some(links) = self.created_by.get(item) {
            for (creator_id, role) in links {
                if let Some(creator) = self.creators.get(creator_id) {
                    result.push((creator.clone(), role.clone()));
                }
            }
        }
        Ok(result)
    }

    fn put_influence(
        &mut self,
        from: &ItemId,
        to: &ItemId,
        attrs: InfluenceAttrs,
    ) -> Result<(), EtymonError> {
        if !self.items.contains_key(from) {
            return Err(EtymonError::item_not_found(from));
        }
        if !self.items.contains_key(to) {
            return Err(EtymonError::item_not_found(to));
        }
        self.influences
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), attrs);
        self.reverse.entry(to.clone()).or_default().insert(from.clone());
        Ok(())
    }

    fn influence(
        &self,
        from: &ItemId,
        to: &ItemId,
    ) -> Result<Option<InfluenceAttrs>, EtymonError> {
        Ok(self
            .influences
            .get(from)
            .and_then(|targets| targets.get(to))
            .cloned())
    }

    fn remove_influence(&mut self, from: &ItemId, to: &ItemId) -> Result<bool, EtymonError> {
        let removed = self
            .influences
            .get_mut(from)
            .is_some_and(|targets| targets.remove(to).is_some());
        if removed {
            if let Some(sources) = self.reverse.get_mut(to) {
                sources.remove(from);
            }
        }
        Ok(removed)
    }

    fn incoming(&self, to: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError> {
        let mut result = Vec::new();
        if let Some(sources) = self.reverse.get(to) {
            for from in sources {
                if let Some(attrs) = self.influences.get(from).and_then(|t| t.get(to)) {
                    result.push((from.clone(), attrs.clone()));
                }
            }
        }
        Ok(result)
    }

    fn outgoing(&self, from: &ItemId) -> Result<Vec<(ItemId, InfluenceAttrs)>, EtymonError> {
        Ok(self
            .influences
            .get(from)
            .into_iter()
            .flat_map(|targets| {
                targets
                    .iter()
                    .map(|(to, attrs)| (to.clone(), attrs.clone()))
            })
            .collect())
    }

    fn incoming_count(&self, to: &ItemId) -> Result<usize, EtymonError> {
        Ok(self.reverse.get(to).map_or(0, BTreeSet::len))
    }

    fn outgoing_count(&self, from: &ItemId) -> Result<usize, EtymonError> {
        Ok(self.influences.get(from).map_or(0, BTreeMap::len))
    }

    fn bump_category(
        &mut self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Category, EtymonError> {
        let category = self
            .categories
            .entry(name.to_string())
            .and_modify(|c| c.usage_count = c.usage_count.saturating_add(1))
            .or_insert_with(|| Category {
                name: name.to_string(),
                usage_count: 1,
                created_at: Some(created_at),
            });
        Ok(category.clone())
    }

    fn category(&self, name: &str) -> Result<Option<Category>, EtymonError> {
        Ok(self.categories.get(name).cloned())
    }

    fn categories(&self) -> Result<Vec<Category>, EtymonError> {
        Ok(self.categories.values().cloned().collect())
    }

    fn item_count(&self) -> Result<usize, EtymonError> {
        Ok(self.items.len())
    }

    fn creator_count(&self) -> Result<usize, EtymonError> {
        Ok(self.creators.len())
    }

    fn influence_count(&self) -> Result<usize, EtymonError> {
        Ok(self.influences.values().map(BTreeMap::len).sum())
    }

    fn snapshot(&self) -> Result<GraphSnapshot, EtymonError> {
        Ok(GraphSnapshot::from(self))
    }

    fn load_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), EtymonError> {
        *self = Self::from(snapshot);
        Ok(())
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

use serde::{Deserialize, Serialize};

/// Serializable representation of the graph for persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub items: Vec<Item>,
    pub creators: Vec<Creator>,
    pub created_by: Vec<(ItemId, CreatorId, CreatorRole)>,
    pub influences: Vec<(ItemId, ItemId, InfluenceAttrs)>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl From<&MemoryGraph> for GraphSnapshot {
    fn from(graph: &MemoryGraph) -> Self {
        let created_by = graph
            .created_by
            .iter()
            .flat_map(|(item, links)| {
                links
                    .iter()
                    .map(move |(creator, role)| (item.clone(), creator.clone(), role.clone()))
            })
            .collect();

        let influences = graph
            .influence_edges()
            .map(|(from, to, attrs)| (from.clone(), to.clone(), attrs.clone()))
            .collect();

        Self {
            items: graph.items.values().cloned().collect(),
            creators: graph.creators.values().cloned().collect(),
            created_by,
            influences,
            categories: graph.categories.values().cloned().collect(),
        }
    }
}

impl From<GraphSnapshot> for MemoryGraph {
    fn from(snapshot: GraphSnapshot) -> Self {
        let mut graph = Self::new();

        for item in snapshot.items {
            graph.items.insert(item.id.clone(), item);
        }

        for creator in snapshot.creators {
            graph
                .creator_name_index
                .insert(creator.name.clone(), creator.id.clone());
            graph.creators.insert(creator.id.clone(), creator);
        }

        // Skip edges whose endpoints did not survive (defects in old files).
        for (item, creator, role) in snapshot.created_by {
            if graph.items.contains_key(&item) && graph.creators.contains_key(&creator) {
                graph
                    .created_by
                    .entry(item)
                    .or_default()
                    .insert((creator, role));
            }
        }

        for (from, to, attrs) in snapshot.influences {
            if graph.items.contains_key(&from) && graph.items.contains_key(&to) {
                let _ = graph.put_influence(&from, &to, attrs);
            }
        }

        for category in snapshot.categories {
            graph.categories.insert(category.name.clone(), category);
        }

        graph
    }
}

// =============================================================================
// TESTS
// =============================================================================
