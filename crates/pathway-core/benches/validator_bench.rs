//! # Validator Benchmarks
//!
//! Validation and JSON round trips over large workflows.
//!
//! Run with: `cargo bench -p pathway-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pathway_core::primitives::MAX_IMPORT_NODE_COUNT;
use pathway_core::{
    BranchLabel, ConditionKind, ConditionPayload, Edge, EdgeId, ExerciseKind, ExercisePayload,
    GraphDocument, Node, NodeId, Position, from_json_str, node_states, to_json_string, validate,
};
use std::hint::black_box;

/// Lesson/gate pairs in the largest chain that fits the import limit.
const LIMIT_PAIRS: usize = (MAX_IMPORT_NODE_COUNT - 2) / 2;

/// Entry -> N exercises, each followed by a pass/fail gate -> Exit.
///
/// Assembled from parts so setup stays linear at the import limit.
fn create_gated_chain(size: usize) -> GraphDocument {
    let (mut nodes, _, entry) = GraphDocument::create_empty().into_parts();
    let mut edges = Vec::new();
    let mut prev = entry.clone();
    let mut prev_label = None;

    for i in 1..=size {
        let lesson = NodeId::new(format!("exercise-{}", i));
        let gate = NodeId::new(format!("condition-{}", i));
        nodes.insert(
            lesson.clone(),
            Node::exercise(
                lesson.clone(),
                "Talk",
                Position::default(),
                ExercisePayload::new(ExerciseKind::Conversation),
            ),
        );
        nodes.insert(
            gate.clone(),
            Node::condition(
                gate.clone(),
                "Passed?",
                Position::default(),
                ConditionPayload::new("score >= 70", ConditionKind::ScoreThreshold),
            ),
        );
        for (source, label, target) in [
            (prev.clone(), prev_label, lesson.clone()),
            (lesson.clone(), None, gate.clone()),
            (gate.clone(), Some(BranchLabel::Fail), lesson.clone()),
        ] {
            let id = EdgeId::new(format!("edge-{}", edges.len() + 1));
            edges.push(Edge::new(id, source, label, target));
        }
        prev = gate;
        prev_label = Some(BranchLabel::Pass);
    }

    // The last gate passes to the exit
    let id = EdgeId::new(format!("edge-{}", edges.len() + 1));
    edges.push(Edge::new(id, prev, prev_label, NodeId::new("exit-1")));
    GraphDocument::from_parts(nodes, edges, entry)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for size in [10, 100, 500, LIMIT_PAIRS] {
        let doc = create_gated_chain(size);
        group.bench_with_input(BenchmarkId::new("gated_chain", size), &doc, |b, doc| {
            b.iter(|| validate(black_box(doc)));
        });
        group.bench_with_input(BenchmarkId::new("node_states", size), &doc, |b, doc| {
            b.iter(|| node_states(black_box(doc)));
        });
    }

    group.finish();
}

fn bench_json_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_round_trip");

    for size in [10, 100, 500, LIMIT_PAIRS] {
        let doc = create_gated_chain(size);
        let text = to_json_string(&doc).expect("serialize");
        group.bench_with_input(BenchmarkId::new("serialize", size), &doc, |b, doc| {
            b.iter(|| to_json_string(black_box(doc)));
        });
        group.bench_with_input(BenchmarkId::new("deserialize", size), &text, |b, text| {
            b.iter(|| from_json_str(black_box(text)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_json_round_trip);
criterion_main!(benches);
