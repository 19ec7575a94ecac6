//! # Persistence Format
//!
//! Binary serialization for Etymon graph snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot data.
//! - 4 bytes: Magic ("ETYM")
//! - 1 byte: Version
//!
//! ## Security
//!
//! This module validates data before deserialization:
//! - Maximum payload size limit (`MAX_PERSISTENCE_PAYLOAD_SIZE`)
//! - Header validation before payload parsing
//! - Graceful error handling for corrupted data

use crate::graph::GraphSnapshot;
use crate::primitives;
use crate::types::EtymonError;

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed payload size for persistence format.
///
/// This prevents memory exhaustion from malicious or corrupted data.
/// 500 MB is a reasonable upper bound for graph data.
///
/// **Security Note**: This limit is validated BEFORE attempting deserialization
/// to prevent allocation-based DoS attacks.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all snapshot data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), EtymonError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(EtymonError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(EtymonError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EtymonError> {
        if bytes.len() < 5 {
            return Err(EtymonError::SerializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn snapshot_to_bytes(snapshot: &GraphSnapshot) -> Result<Vec<u8>, EtymonError> {
    let header = PersistenceHeader::new();

    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| EtymonError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(5 + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a snapshot from bytes.
///
/// This is a pure transformation - no file I/O.
///
/// Validation order:
/// 1. Minimum data size (header must be present)
/// 2. Maximum payload size (prevents memory exhaustion DoS)
/// 3. Header magic bytes and version
///
/// All validation occurs BEFORE attempting payload deserialization.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<GraphSnapshot, EtymonError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(EtymonError::SerializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(EtymonError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    // Validate header BEFORE processing payload
    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    // Now safe to deserialize (size has been validated)
    let payload = &bytes[5..];
    let snapshot: GraphSnapshot = postcard::from_bytes(payload).map_err(|e| {
        EtymonError::SerializationError(format!("Failed to deserialize graph data: {e}"))
    })?;

    Ok(snapshot)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphStore, MemoryGraph};
    use crate::types::{InfluenceAttrs, Item, ItemId};

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

    fn test_attrs() -> InfluenceAttrs {
        InfluenceAttrs {
            confidence: 0.8,
            influence_type: "inspiration".to_string(),
            explanation: "test edge".to_string(),
            category: "Testing".to_string(),
            scope: None,
            source: None,
            year_of_influence: None,
            clusters: Vec::new(),
            created_at: None,
        }
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let bytes = header.to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let mut graph = MemoryGraph::new();
        graph.put_item(test_item("a", "Alpha")).expect("put");
        graph.put_item(test_item("b", "Beta")).expect("put");
        graph
            .put_influence(&ItemId::new("a"), &ItemId::new("b"), test_attrs())
            .expect("edge");

        // First serialization
        let snapshot1 = graph.snapshot().expect("snapshot");
        let bytes1 = snapshot_to_bytes(&snapshot1).expect("first serialize");

        // Deserialize and reserialize
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");

        // Must be bit-exact
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn restored_snapshot_rebuilds_graph() {
        let mut graph = MemoryGraph::new();
        graph.put_item(test_item("a", "Alpha")).expect("put");
        graph.put_item(test_item("b", "Beta")).expect("put");
        graph
            .put_influence(&ItemId::new("a"), &ItemId::new("b"), test_attrs())
            .expect("edge");

        let bytes = snapshot_to_bytes(&graph.snapshot().expect("snapshot")).expect("serialize");
        let restored = MemoryGraph::from(snapshot_from_bytes(&bytes).expect("deserialize"));

        assert_eq!(restored.item_count().expect("count"), 2);
        assert_eq!(restored.influence_count().expect("count"), 1);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX"); // Wrong magic

        let result = snapshot_from_bytes(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut bytes = snapshot_to_bytes(&GraphSnapshot::default()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;

        let result = snapshot_from_bytes(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn truncated_data_rejected() {
        let result = snapshot_from_bytes(b"ET");
        assert!(result.is_err());
    }
}
