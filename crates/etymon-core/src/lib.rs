//! # etymon-core
//!
//! The deterministic Resolution Engine for Etymon - THE LOGIC.
//!
//! This crate implements the CORE of the influence knowledge graph: a
//! property graph of creative works ("items"), their creators, and directed
//! influence edges between items, together with the entity-resolution
//! machinery that keeps that graph free of duplicates as new proposals
//! arrive from an external generation process.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Owns all graph state; callers go through [`Session`] or the engines
//! - Is synchronous: every operation is a plain call, no background work
//! - Is deterministic given store contents; randomness enters only at id
//!   minting
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod conflict;
pub mod creators;
pub mod formats;
pub mod graph;
pub mod identity;
pub mod influences;
pub mod items;
pub mod merge;
pub mod primitives;
pub mod query;
pub mod session;
pub mod similarity;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CandidateInfluence, CandidateItem, CandidatePayload, Category, Creator, CreatorId,
    CreatorRole, CreatorType, EtymonError, InfluenceAttrs, Item, ItemId, Scope,
    VerificationStatus,
};

// =============================================================================
// RE-EXPORTS: Resolution Engine
// =============================================================================

pub use conflict::{
    ConflictEngine, ConflictReport, InfluenceConflict, InfluencePreview, InfluenceResolutions,
    ItemPreview, MergePreview, Resolution, ResolutionOutcome, SkippedCandidate,
};
pub use creators::CreatorEngine;
pub use graph::{GraphSnapshot, GraphStore, MemoryGraph};
pub use identity::{generate_id, mint_creator_id, mint_item_id, slugify};
pub use influences::InfluenceEngine;
pub use items::{ItemEngine, ItemPatch, NewItem};
pub use merge::MergeEngine;
pub use query::{
    ExpandedGraph, ExpansionCounts, GraphEdge, GraphNode, GraphResponse, InfluenceRelation,
    QueryEngine,
};
pub use session::{Session, StorageBackend};
pub use similarity::{SimilarItem, SimilarityMatcher, is_sentinel_name, normalize_name};
pub use storage::RedbGraph;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, snapshot_from_bytes, snapshot_to_bytes};
