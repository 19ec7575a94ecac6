//! # Storage Backends
//!
//! Persistent storage for the Etymon graph.
//!
//! The in-memory `MemoryGraph` lives in `crate::graph`; this module holds
//! the disk-backed alternative. Both implement `GraphStore`, so engines
//! never know which one they are talking to.

pub mod redb_graph;

pub use redb_graph::RedbGraph;
