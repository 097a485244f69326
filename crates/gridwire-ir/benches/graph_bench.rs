//! Benchmarks for link graph algorithms
//!
//! Run with: cargo bench -p gridwire-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gridwire_ir::{ComponentId, LinkGraph};

fn chain(n: u32) -> LinkGraph {
    let mut graph = LinkGraph::new();
    for i in 1..n {
        graph.drive(ComponentId(i), ComponentId(i + 1));
    }
    graph
}

fn rings(n: u32, ring: u32) -> LinkGraph {
    let mut graph = LinkGraph::new();
    for start in (1..=n).step_by(ring as usize) {
        let end = (start + ring - 1).min(n);
        for i in start..end {
            graph.drive(ComponentId(i), ComponentId(i + 1));
        }
        graph.drive(ComponentId(end), ComponentId(start));
        if end < n {
            graph.drive(ComponentId(end), ComponentId(end + 1));
        }
    }
    graph
}

/// Benchmark SCC condensation and layering
fn bench_condense(c: &mut Criterion) {
    let mut group = c.benchmark_group("condense");

    for size in &[100u32, 1_000, 10_000] {
        let graph = chain(*size);
        group.bench_with_input(BenchmarkId::new("chain", size), &graph, |b, g| {
            b.iter(|| black_box(g).condense().unwrap());
        });

        let graph = rings(*size, 8);
        group.bench_with_input(BenchmarkId::new("rings", size), &graph, |b, g| {
            b.iter(|| black_box(g).condense().unwrap());
        });
    }

    group.finish();
}

/// Benchmark the weak component split
fn bench_weak_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("weak_components");

    for size in &[100u32, 1_000, 10_000] {
        let graph = rings(*size, 4);
        group.bench_with_input(BenchmarkId::new("rings", size), &graph, |b, g| {
            b.iter(|| black_box(g).weak_components());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_condense, bench_weak_components);
criterion_main!(benches);
