use std::collections::HashSet;
use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use model_tree::invariants::tree_invariant_violations;
use model_tree::models::{Edge, Node, Tree};
use model_tree::operations::cleanup_orphaned_edges;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn node(idx: usize) -> Node {
    Node {
        id: format!("node_{idx}"),
        label: None,
        data: Default::default(),
        created_at: None,
        updated_at: None,
    }
}

fn synthetic_tree(node_count: usize, edge_count: usize) -> Tree {
    let nodes: Vec<Node> = (0..node_count).map(node).collect();

    let mut state = 0x1234_5678_9abc_def0u64;
    let mut seen = HashSet::with_capacity(edge_count);
    let mut edges = Vec::with_capacity(edge_count);
    while edges.len() < edge_count {
        let a = (lcg_next(&mut state) as usize) % node_count;
        let b = (lcg_next(&mut state) as usize) % node_count;
        if a == b {
            continue;
        }
        if seen.insert((a, b)) {
            edges.push(Edge {
                source: nodes[a].id.clone(),
                target: nodes[b].id.clone(),
                relation: None,
                data: Default::default(),
            });
        }
    }

    Tree {
        nodes,
        edges,
        ..Default::default()
    }
}

fn bench_invariant_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("invariant_sweep");
    for (node_count, edge_count) in [(100, 300), (1_000, 3_000), (5_000, 15_000)] {
        let tree = synthetic_tree(node_count, edge_count);
        group.throughput(Throughput::Elements(edge_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{node_count}n_{edge_count}e")),
            &tree,
            |b, tree| {
                b.iter(|| tree_invariant_violations(black_box(&tree.nodes), black_box(&tree.edges)))
            },
        );
    }
    group.finish();
}

fn bench_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleanup_orphaned_edges");
    for (node_count, edge_count) in [(100, 300), (1_000, 3_000), (5_000, 15_000)] {
        // Drop a tenth of the nodes so the sweep has orphans to remove.
        let mut tree = synthetic_tree(node_count, edge_count);
        tree.nodes.truncate(node_count - node_count / 10);
        group.throughput(Throughput::Elements(edge_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{node_count}n_{edge_count}e")),
            &tree,
            |b, tree| {
                b.iter_batched(
                    || tree.clone(),
                    |mut tree| cleanup_orphaned_edges(black_box(&mut tree)),
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_invariant_sweep, bench_cleanup);
criterion_main!(benches);
