//! # Resolution Benchmarks
//!
//! Performance benchmarks for etymon-core matching and query operations.
//!
//! Run with: `cargo bench -p etymon-core`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use etymon_core::graph::{GraphStore, MemoryGraph};
use etymon_core::{
    CandidateInfluence, CandidateItem, CandidatePayload, ConflictEngine, InfluenceAttrs, Item,
    ItemId, QueryEngine, SimilarityMatcher, VerificationStatus, snapshot_to_bytes,
};
use std::hint::black_box;

fn catalog_item(index: usize) -> Item {
    Item {
        id: ItemId::new(format!("item-{index}")),
        name: format!("Catalog Entry {index}"),
        auto_detected_type: Some("song".to_string()),
        year: Some(1950),
        description: None,
        confidence_score: None,
        verification_status: VerificationStatus::default(),
        created_at: None,
    }
}

fn bench_attrs() -> InfluenceAttrs {
    InfluenceAttrs {
        confidence: 0.9,
        influence_type: "other".to_string(),
        explanation: "No explanation provided".to_string(),
        category: "Uncategorized".to_string(),
        scope: None,
        source: None,
        year_of_influence: None,
        clusters: Vec::new(),
        created_at: None,
    }
}

/// A graph with N unrelated catalog items.
fn create_catalog(size: usize) -> MemoryGraph {
    let mut graph = MemoryGraph::new();
    for index in 0..size {
        graph.put_item(catalog_item(index)).expect("put");
    }
    graph
}

/// A hub item with N influences pointing into it.
fn create_influence_star(size: usize) -> (MemoryGraph, ItemId) {
    let mut graph = MemoryGraph::new();
    let hub = catalog_item(0);
    let hub_id = hub.id.clone();
    graph.put_item(hub).expect("put");

    for index in 1..size {
        let spoke = catalog_item(index);
        let spoke_id = spoke.id.clone();
        graph.put_item(spoke).expect("put");
        graph
            .put_influence(&spoke_id, &hub_id, bench_attrs())
            .expect("edge");
    }

    (graph, hub_id)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_item_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("item_insertion");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let graph = create_catalog(size);
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_find_similar(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_similar");

    for size in [100, 1000, 10000].iter() {
        let graph = create_catalog(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let query = format!("Catalog Entry {}", size / 2);
            b.iter(|| black_box(SimilarityMatcher::find_similar(&graph, &query, None)));
        });
    }

    group.finish();
}

fn bench_conflict_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_report");

    for size in [100, 1000].iter() {
        let graph = create_catalog(*size);

        let mut payload = CandidatePayload::new(CandidateItem::new("Catalog Entry 0"));
        for index in 0..10 {
            payload
                .influences
                .push(CandidateInfluence::new(format!("Catalog Entry {index}"), 0.9));
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(ConflictEngine::find_comprehensive_conflicts(&graph, &payload)));
        });
    }

    group.finish();
}

fn bench_incoming_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("incoming_query");

    for size in [100, 500, 1000].iter() {
        let (graph, hub) = create_influence_star(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(QueryEngine::get_influences(&graph, &hub, None)));
        });
    }

    group.finish();
}

fn bench_snapshot_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_encode");

    for size in [100, 500, 1000].iter() {
        let (graph, _) = create_influence_star(*size);
        let snapshot = graph.snapshot().expect("snapshot");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(snapshot_to_bytes(&snapshot)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_item_insertion,
    bench_find_similar,
    bench_conflict_report,
    bench_incoming_query,
    bench_snapshot_encode,
);

criterion_main!(benches);
