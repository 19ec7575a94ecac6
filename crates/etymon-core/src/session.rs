//! # Session Module
//!
//! The stateful entry point into the Etymon CORE: a [`Session`] pairs a
//! storage backend with the stateless engines and exposes every graph
//! operation through one surface.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: in-memory [`MemoryGraph`] (fast, volatile unless
//!   explicitly snapshotted)
//! - `Persistent`: [`RedbGraph`] for disk-backed ACID storage
//!
//! Every operation dispatches to the same engine code regardless of
//! backend, so the two stay behaviorally identical.

use crate::conflict::{
    ConflictEngine, ConflictReport, InfluenceResolutions, ItemPreview, MergePreview, Resolution,
    ResolutionOutcome,
};
use crate::graph::{GraphSnapshot, GraphStore, MemoryGraph};
use crate::items::{ItemEngine, ItemPatch, NewItem};
use crate::merge::MergeEngine;
use crate::query::{ExpandedGraph, ExpansionCounts, GraphResponse, InfluenceRelation, QueryEngine};
use crate::similarity::{SimilarItem, SimilarityMatcher};
use crate::storage::RedbGraph;
use crate::types::{CandidatePayload, Category, EtymonError, Item, ItemId, Scope};
use std::path::Path;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(MemoryGraph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryGraph::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbGraph (database handle) cannot be safely cloned.
// Use Session::try_clone() for explicit cloning with proper error handling.

// =============================================================================
// SESSION
// =============================================================================

/// A Session binds a graph store to the resolution and query engines.
///
/// The Session provides a high-level interface for:
/// - Item and creator maintenance
/// - Conflict detection and payload resolution
/// - Merging duplicate items
/// - Read-only graph queries
///
/// Note: Session does NOT implement Clone directly.
/// Use `try_clone()` for explicit cloning with proper error handling.
#[derive(Debug, Default)]
pub struct Session {
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an existing in-memory graph.
    #[must_use]
    pub fn with_graph(graph: MemoryGraph) -> Self {
        Self {
            backend: StorageBackend::InMemory(graph),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, EtymonError> {
        let redb = RedbGraph::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(redb),
        })
    }

    /// Create a session with an existing `RedbGraph`.
    #[must_use]
    pub fn with_redb_graph(redb: RedbGraph) -> Self {
        Self {
            backend: StorageBackend::Persistent(redb),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get an optional reference to the in-memory graph.
    ///
    /// Returns `Some(&MemoryGraph)` for in-memory backends, `None` for
    /// persistent backends.
    ///
    /// # Example
    /// ```
    /// use etymon_core::Session;
    ///
    /// let session = Session::new();
    /// assert!(session.graph_opt().is_some()); // In-memory session has graph
    /// ```
    #[must_use]
    pub fn graph_opt(&self) -> Option<&MemoryGraph> {
        match &self.backend {
            StorageBackend::InMemory(g) => Some(g),
            StorageBackend::Persistent(_) => None,
        }
    }

    /// Get a mutable reference to the in-memory graph.
    ///
    /// Returns `None` if using persistent storage.
    /// Callers should use session methods directly for persistent backends.
    #[must_use]
    pub fn graph_mut(&mut self) -> Option<&mut MemoryGraph> {
        match &mut self.backend {
            StorageBackend::InMemory(g) => Some(g),
            StorageBackend::Persistent(_) => None,
        }
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Try to clone the session.
    ///
    /// Returns `Some(Session)` for in-memory backends with a cloned graph.
    /// Returns `None` for persistent backends (database handles cannot be
    /// safely cloned).
    ///
    /// # Example
    /// ```
    /// use etymon_core::Session;
    ///
    /// let session = Session::new();
    /// if let Some(cloned) = session.try_clone() {
    ///     // Work with the cloned session
    /// } else {
    ///     // Handle persistent backend case
    /// }
    /// ```
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        match &self.backend {
            StorageBackend::InMemory(g) => Some(Self {
                backend: StorageBackend::InMemory(g.clone()),
            }),
            StorageBackend::Persistent(_) => None,
        }
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    /// Create a new item from a validated spec.
    pub fn create_item(&mut self, spec: NewItem) -> Result<Item, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => ItemEngine::create_item(graph, spec),
            StorageBackend::Persistent(redb) => ItemEngine::create_item(redb, spec),
        }
    }

    /// Fetch an item by id.
    pub fn get_item(&self, id: &ItemId) -> Result<Item, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => ItemEngine::get_item(graph, id),
            StorageBackend::Persistent(redb) => ItemEngine::get_item(redb, id),
        }
    }

    /// Apply a partial update to an existing item.
    pub fn update_item(&mut self, id: &ItemId, patch: ItemPatch) -> Result<Item, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => ItemEngine::update_item(graph, id, patch),
            StorageBackend::Persistent(redb) => ItemEngine::update_item(redb, id, patch),
        }
    }

    /// Delete an item and every edge touching it.
    pub fn delete_item(&mut self, id: &ItemId) -> Result<bool, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => ItemEngine::delete_item_completely(graph, id),
            StorageBackend::Persistent(redb) => ItemEngine::delete_item_completely(redb, id),
        }
    }

    /// Case-insensitive substring search over item names.
    pub fn search_items(&self, query: &str) -> Result<Vec<Item>, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => ItemEngine::search_items(graph, query),
            StorageBackend::Persistent(redb) => ItemEngine::search_items(redb, query),
        }
    }

    // =========================================================================
    // SIMILARITY & CONFLICT RESOLUTION
    // =========================================================================

    /// Rank existing items similar to a candidate name.
    pub fn find_similar(
        &self,
        name: &str,
        creator_name: Option<&str>,
    ) -> Result<Vec<SimilarItem>, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => {
                SimilarityMatcher::find_similar(graph, name, creator_name)
            }
            StorageBackend::Persistent(redb) => {
                SimilarityMatcher::find_similar(redb, name, creator_name)
            }
        }
    }

    /// Rank existing items the payload's entities might duplicate.
    pub fn find_comprehensive_conflicts(
        &self,
        payload: &CandidatePayload,
    ) -> Result<ConflictReport, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => {
                ConflictEngine::find_comprehensive_conflicts(graph, payload)
            }
            StorageBackend::Persistent(redb) => {
                ConflictEngine::find_comprehensive_conflicts(redb, payload)
            }
        }
    }

    /// Write a payload to the graph under the given resolutions.
    pub fn apply_resolutions(
        &mut self,
        payload: &CandidatePayload,
        main_resolution: Option<&Resolution>,
        influence_resolutions: &InfluenceResolutions,
    ) -> Result<ResolutionOutcome, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => ConflictEngine::apply_resolutions(
                graph,
                payload,
                main_resolution,
                influence_resolutions,
            ),
            StorageBackend::Persistent(redb) => ConflictEngine::apply_resolutions(
                redb,
                payload,
                main_resolution,
                influence_resolutions,
            ),
        }
    }

    /// Attach a payload's influences to an item already in the graph.
    pub fn add_influences_to_existing(
        &mut self,
        existing: &ItemId,
        payload: &CandidatePayload,
    ) -> Result<ResolutionOutcome, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => {
                ConflictEngine::add_influences_to_existing(graph, existing, payload)
            }
            StorageBackend::Persistent(redb) => {
                ConflictEngine::add_influences_to_existing(redb, existing, payload)
            }
        }
    }

    /// Write a whole payload without conflict checking.
    pub fn save_payload(
        &mut self,
        payload: &CandidatePayload,
    ) -> Result<ResolutionOutcome, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => ConflictEngine::save_payload(graph, payload),
            StorageBackend::Persistent(redb) => ConflictEngine::save_payload(redb, payload),
        }
    }

    /// The graph context around one item, for merge review.
    pub fn get_item_preview(&self, id: &ItemId) -> Result<ItemPreview, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => ConflictEngine::get_item_preview(graph, id),
            StorageBackend::Persistent(redb) => ConflictEngine::get_item_preview(redb, id),
        }
    }

    /// Review material for every top-ranked match in a conflict report.
    pub fn get_comprehensive_preview(
        &self,
        report: &ConflictReport,
    ) -> Result<MergePreview, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => {
                ConflictEngine::get_comprehensive_preview(graph, report)
            }
            StorageBackend::Persistent(redb) => {
                ConflictEngine::get_comprehensive_preview(redb, report)
            }
        }
    }

    // =========================================================================
    // MERGE
    // =========================================================================

    /// Merge one item into another, transferring edges and deleting the
    /// source. Returns the surviving item's id.
    pub fn merge_items(&mut self, source: &ItemId, target: &ItemId) -> Result<ItemId, EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => MergeEngine::merge_items(graph, source, target),
            StorageBackend::Persistent(redb) => MergeEngine::merge_items(redb, source, target),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The item and its incoming influences, optionally filtered by scope.
    pub fn get_influences(
        &self,
        item_id: &ItemId,
        scope_filter: Option<&[Scope]>,
    ) -> Result<GraphResponse, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => {
                QueryEngine::get_influences(graph, item_id, scope_filter)
            }
            StorageBackend::Persistent(redb) => {
                QueryEngine::get_influences(redb, item_id, scope_filter)
            }
        }
    }

    /// Outgoing edges: what this item influences.
    pub fn get_what_item_influences(
        &self,
        item_id: &ItemId,
    ) -> Result<Vec<InfluenceRelation>, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => {
                QueryEngine::get_what_item_influences(graph, item_id)
            }
            StorageBackend::Persistent(redb) => {
                QueryEngine::get_what_item_influences(redb, item_id)
            }
        }
    }

    /// Center item plus its one-hop neighborhood.
    pub fn get_expanded_graph(
        &self,
        center: &ItemId,
        include_incoming: bool,
        include_outgoing: bool,
        max_depth: usize,
    ) -> Result<ExpandedGraph, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => QueryEngine::get_expanded_graph(
                graph,
                center,
                include_incoming,
                include_outgoing,
                max_depth,
            ),
            StorageBackend::Persistent(redb) => QueryEngine::get_expanded_graph(
                redb,
                center,
                include_incoming,
                include_outgoing,
                max_depth,
            ),
        }
    }

    /// Edge counts in each direction.
    pub fn get_expansion_counts(&self, item_id: &ItemId) -> Result<ExpansionCounts, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => QueryEngine::get_expansion_counts(graph, item_id),
            StorageBackend::Persistent(redb) => QueryEngine::get_expansion_counts(redb, item_id),
        }
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Total number of items in the graph.
    pub fn item_count(&self) -> Result<usize, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph.item_count(),
            StorageBackend::Persistent(redb) => redb.item_count(),
        }
    }

    /// Total number of creators in the graph.
    pub fn creator_count(&self) -> Result<usize, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph.creator_count(),
            StorageBackend::Persistent(redb) => redb.creator_count(),
        }
    }

    /// Total number of influence edges in the graph.
    pub fn influence_count(&self) -> Result<usize, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph.influence_count(),
            StorageBackend::Persistent(redb) => redb.influence_count(),
        }
    }

    /// All categories, ordered by name.
    pub fn categories(&self) -> Result<Vec<Category>, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph.categories(),
            StorageBackend::Persistent(redb) => redb.categories(),
        }
    }

    // =========================================================================
    // SNAPSHOT SUPPORT
    // =========================================================================

    /// Capture the whole graph as a serializable snapshot.
    ///
    /// Works with both backends; for persistent storage this reads every
    /// table, so it is intended for export and backup rather than hot paths.
    pub fn export_snapshot(&self) -> Result<GraphSnapshot, EtymonError> {
        match &self.backend {
            StorageBackend::InMemory(graph) => graph.snapshot(),
            StorageBackend::Persistent(redb) => redb.snapshot(),
        }
    }

    /// Replace the whole graph with the snapshot's contents.
    pub fn load_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<(), EtymonError> {
        match &mut self.backend {
            StorageBackend::InMemory(graph) => graph.load_snapshot(snapshot),
            StorageBackend::Persistent(redb) => redb.load_snapshot(snapshot),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{CandidateInfluence, CandidateItem};
    use tempfile::tempdir;

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

    fn find_id(session: &Session, name: &str) -> ItemId {
        session
            .search_items(name)
            .expect("search")
            .first()
            .expect("search hit")
            .id
            .clone()
    }

    #[test]
    fn save_payload_populates_an_in_memory_session() {
        let mut session = Session::new();
        assert!(!session.is_persistent());

        let outcome = session
            .save_payload(&stan_payload())
            .expect("save payload");

        assert_eq!(outcome.influences_created, 2);
        assert_eq!(session.item_count().expect("items"), 3);
        assert_eq!(session.creator_count().expect("creators"), 2);
        assert_eq!(session.influence_count().expect("edges"), 2);

        let response = session
            .get_influences(&outcome.item_id, None)
            .expect("influences");
        assert_eq!(response.influences.len(), 2);
    }

    #[test]
    fn redb_backend_persists_across_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.db");

        let main_id = {
            let mut session = Session::with_redb(&path).expect("open");
            assert!(session.is_persistent());
            session
                .save_payload(&stan_payload())
                .expect("save payload")
                .item_id
        };

        let session = Session::with_redb(&path).expect("reopen");
        let item = session.get_item(&main_id).expect("persisted item");
        assert_eq!(item.name, "Stan");
        assert_eq!(session.influence_count().expect("edges"), 2);
    }

    #[test]
    fn try_clone_covers_in_memory_only() {
        let dir = tempdir().expect("tempdir");
        let persistent = Session::with_redb(dir.path().join("clone.db")).expect("open");
        assert!(persistent.try_clone().is_none());

        let mut original = Session::new();
        original
            .create_item(NewItem::new("Original"))
            .expect("create");

        let mut cloned = original.try_clone().expect("in-memory clone");
        cloned.create_item(NewItem::new("Divergent")).expect("create");

        // The clone diverges without touching the original.
        assert_eq!(original.item_count().expect("items"), 1);
        assert_eq!(cloned.item_count().expect("items"), 2);
    }

    #[test]
    fn snapshot_moves_a_graph_between_sessions() {
        let mut source = Session::new();
        source.save_payload(&stan_payload()).expect("save payload");

        let snapshot = source.export_snapshot().expect("snapshot");

        let mut restored = Session::new();
        restored.load_snapshot(snapshot).expect("load");

        assert_eq!(restored.item_count().expect("items"), 3);
        assert_eq!(restored.creator_count().expect("creators"), 2);
        assert_eq!(restored.influence_count().expect("edges"), 2);
        assert_eq!(restored.categories().expect("categories").len(), 2);
    }

    #[test]
    fn merge_runs_through_the_session_surface() {
        let mut session = Session::new();
        let outcome = session.save_payload(&stan_payload()).expect("save payload");

        let source = find_id(&session, "Thank You");
        let target = find_id(&session, "Epistolary Literature");
        let survivor = session.merge_items(&source, &target).expect("merge");

        assert_eq!(survivor, target);
        assert!(session.get_item(&source).is_err());
        // Both influence edges now point out of the surviving item.
        let counts = session
            .get_expansion_counts(&outcome.item_id)
            .expect("counts");
        assert_eq!(counts.incoming_influences, 1);
    }
}
