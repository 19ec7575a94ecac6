//! # Graph Query Service
//!
//! Read-only views over the influence graph.
//!
//! These assemble the response shapes a host renders: an item with its
//! incoming influences, the reverse "what does this influence" list, a
//! one-hop neighborhood for graph visualizations, and cheap expansion
//! counts for lazy-loading UIs.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::creators::CreatorEngine;
use crate::graph::GraphStore;
use crate::items::ItemEngine;
use crate::primitives::MAX_EXPANSION_DEPTH;
use crate::types::{Creator, EtymonError, InfluenceAttrs, Item, ItemId, Scope};

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// One influence edge with both endpoints resolved to full items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluenceRelation {
    pub from_item: Item,
    pub to_item: Item,
    #[serde(flatten)]
    pub attrs: InfluenceAttrs,
}

/// An item with its incoming influences and the surrounding filter context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphResponse {
    pub main_item: Item,
    /// Incoming edges, influencing item's year ascending, unknown years
    /// last.
    pub influences: Vec<InfluenceRelation>,
    /// Categories present among the returned (filtered) edges.
    pub categories: Vec<String>,
    pub creators: Vec<Creator>,
    /// Scopes present across all of the item's incoming edges, ignoring
    /// the filter. Feeds filter UIs.
    pub scopes: Vec<Scope>,
}

/// One node of an expanded neighborhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub item: Item,
    pub creators: Vec<Creator>,
    pub is_center: bool,
}

/// One edge of an expanded neighborhood, by endpoint ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_id: ItemId,
    pub to_id: ItemId,
    #[serde(flatten)]
    pub attrs: InfluenceAttrs,
}

/// A center item with its one-hop neighborhood.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpandedGraph {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphEdge>,
}

/// Edge counts in each direction, for lazy-loading UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionCounts {
    pub incoming_influences: usize,
    pub outgoing_influences: usize,
}

// =============================================================================
// QUERY ENGINE
// =============================================================================

/// Read-only queries against any graph store.
pub struct QueryEngine;

impl QueryEngine {
    /// The item and its incoming influences, optionally filtered by scope.
    ///
    /// Edges without a scope are excluded by any filter. The response's
    /// `scopes` list is computed across all edges regardless of the
    /// filter. Missing item is `NotFound`.
    pub fn get_influences<G: GraphStore>(
        graph: &G,
        item_id: &ItemId,
        scope_filter: Option<&[Scope]>,
    ) -> Result<GraphResponse, EtymonError> {
        let main_item = ItemEngine::get_item(graph, item_id)?;

        let mut influences = Vec::new();
        let mut categories = BTreeSet::new();
        let mut scopes = BTreeSet::new();

        for (from, attrs) in graph.incoming(item_id)? {
            if let Some(scope) = attrs.scope {
                scopes.insert(scope);
            }

            let keep = match scope_filter {
                Some(filter) => attrs.scope.is_some_and(|scope| filter.contains(&scope)),
                None => true,
            };
            if !keep {
                continue;
            }

            categories.insert(attrs.category.clone());
            influences.push(InfluenceRelation {
                from_item: ItemEngine::get_item(graph, &from)?,
                to_item: main_item.clone(),
                attrs,
            });
        }

        influences.sort_by(|a, b| {
            year_order(a.from_item.year, b.from_item.year)
                .then_with(|| a.from_item.name.cmp(&b.from_item.name))
                .then_with(|| a.from_item.id.cmp(&b.from_item.id))
        });

        let creators = CreatorEngine::creators_of(graph, item_id)?
            .into_iter()
            .map(|(creator, _)| creator)
            .collect();

        Ok(GraphResponse {
            main_item,
            influences,
            categories: categories.into_iter().collect(),
            creators,
            scopes: scopes.into_iter().collect(),
        })
    }

    /// Outgoing edges: what this item influences, influenced item's year
    /// descending, unknown years last. Missing item is `NotFound`.
    pub fn get_what_item_influences<G: GraphStore>(
        graph: &G,
        item_id: &ItemId,
    ) -> Result<Vec<InfluenceRelation>, EtymonError> {
        let main_item = ItemEngine::get_item(graph, item_id)?;

        let mut influences = Vec::new();
        for (to, attrs) in graph.outgoing(item_id)? {
            influences.push(InfluenceRelation {
                from_item: main_item.clone(),
                to_item: ItemEngine::get_item(graph, &to)?,
                attrs,
            });
        }

        influences.sort_by(|a, b| {
            year_order_desc(a.to_item.year, b.to_item.year)
                .then_with(|| a.to_item.name.cmp(&b.to_item.name))
                .then_with(|| a.to_item.id.cmp(&b.to_item.id))
        });

        Ok(influences)
    }

    /// Center item plus its neighborhood, one hop in each requested
    /// direction.
    ///
    /// Nodes are deduplicated by id and carry their creators and an
    /// `is_center` flag. A depth of zero returns the center alone; values
    /// above one are clamped to a single hop. A missing center is an
    /// empty graph, not an error.
    pub fn get_expanded_graph<G: GraphStore>(
        graph: &G,
        center: &ItemId,
        include_incoming: bool,
        include_outgoing: bool,
        max_depth: usize,
    ) -> Result<ExpandedGraph, EtymonError> {
        let Some(center_item) = graph.item(center)? else {
            return Ok(ExpandedGraph::default());
        };

        let mut expanded = ExpandedGraph::default();
        let mut seen = BTreeSet::new();

        seen.insert(center.clone());
        expanded.nodes.push(GraphNode {
            item: center_item,
            creators: Self::creator_records(graph, center)?,
            is_center: true,
        });

        let depth = max_depth.min(MAX_EXPANSION_DEPTH);
        if depth == 0 {
            return Ok(expanded);
        }

        if include_outgoing {
            for (to, attrs) in graph.outgoing(center)? {
                if seen.insert(to.clone()) {
                    expanded.nodes.push(GraphNode {
                        item: ItemEngine::get_item(graph, &to)?,
                        creators: Self::creator_records(graph, &to)?,
                        is_center: false,
                    });
                }
                expanded.relationships.push(GraphEdge {
                    from_id: center.clone(),
                    to_id: to,
                    attrs,
                });
            }
        }

        if include_incoming {
            for (from, attrs) in graph.incoming(center)? {
                if seen.insert(from.clone()) {
                    expanded.nodes.push(GraphNode {
                        item: ItemEngine::get_item(graph, &from)?,
                        creators: Self::creator_records(graph, &from)?,
                        is_center: false,
                    });
                }
                expanded.relationships.push(GraphEdge {
                    from_id: from,
                    to_id: center.clone(),
                    attrs,
                });
            }
        }

        Ok(expanded)
    }

    /// Edge counts in each direction without materializing records.
    /// A missing item has zero of both.
    pub fn get_expansion_counts<G: GraphStore>(
        graph: &G,
        item_id: &ItemId,
    ) -> Result<ExpansionCounts, EtymonError> {
        Ok(ExpansionCounts {
            incoming_influences: graph.incoming_count(item_id)?,
            outgoing_influences: graph.outgoing_count(item_id)?,
        })
    }

    fn creator_records<G: GraphStore>(
        graph: &G,
        item_id: &ItemId,
    ) -> Result<Vec<Creator>, EtymonError> {
        Ok(graph
            .creators_of(item_id)?
            .into_iter()
            .map(|(creator, _)| creator)
            .collect())
    }
}

/// Ascending year order with unknown years sorted last.
fn year_order(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Descending year order; unknown years still sort last.
fn year_order_desc(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// TESTS
// =============================================================================
