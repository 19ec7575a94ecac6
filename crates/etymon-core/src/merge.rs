//! # Merge Operator
//!
//! Collapses a duplicate item into its canonical record.
//!
//! Merging transfers influence edges only. Creator links, description,
//! year, and every other scalar field stay whatever the target already
//! has; the target record is authoritative.
//!
//! ## Edge Transfer Rules
//!
//! - Incoming `X -> source` becomes `X -> target` unless the target
//!   already has an edge from the same X. The existing target edge
//!   survives untouched and the source edge is dropped; attributes are
//!   never combined.
//! - Outgoing edges transfer the same way.
//! - Edges between source and target themselves are dropped, never
//!   rewritten into self-loops.
//!
//! The order is fixed: incoming transfer, outgoing transfer, then the
//! source delete. The source keeps its own edges until the final
//! delete, so an interrupted merge leaves a graph a re-run completes.

use crate::graph::GraphStore;
use crate::types::{EtymonError, ItemId};

// =============================================================================
// MERGE ENGINE
// =============================================================================

/// Stateless executor of the merge operation.
pub struct MergeEngine;

impl MergeEngine {
    /// Merge `source` into `target`, returning the target id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when source and target are the same item,
    /// `NotFound` when either id is absent.
    pub fn merge_items<G: GraphStore>(
        graph: &mut G,
        source: &ItemId,
        target: &ItemId,
    ) -> Result<ItemId, EtymonError> {
        if source == target {
            return Err(EtymonError::InvalidArgument(format!(
                "cannot merge item '{source}' into itself"
            )));
        }
        if !graph.contains_item(source)? {
            return Err(EtymonError::item_not_found(source));
        }
        if !graph.contains_item(target)? {
            return Err(EtymonError::item_not_found(target));
        }

        // Incoming: X -> source becomes X -> target.
        for (from, attrs) in graph.incoming(source)? {
            if from == *target || graph.influence(&from, target)?.is_some() {
                continue;
            }
            graph.put_influence(&from, target, attrs)?;
        }

        // Outgoing: source -> Y becomes target -> Y.
        for (to, attrs) in graph.outgoing(source)? {
            if to == *target || graph.influence(target, &to)?.is_some() {
                continue;
            }
            graph.put_influence(target, &to, attrs)?;
        }

        graph.detach_delete_item(source)?;

        Ok(target.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================
