//! # On-Disk Formats
//!
//! Pure byte-level encodings for Etymon data.
//!
//! Everything in this module is a transformation between in-memory
//! structures and byte buffers. File I/O lives with the callers, so the
//! formats stay testable without touching a filesystem.

pub mod persistence;

pub use persistence::{snapshot_from_bytes, snapshot_to_bytes, PersistenceHeader};
