//! Benchmarks for validation and auto-layout
//!
//! Run with: cargo bench -p gridwire-import

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gridwire_import::{Importer, Workspace};
use gridwire_ir::{ComponentId, LinkEnd, Orientation, Placement, PortId, Primitive, StructuralRecord};

fn gate(record: &mut StructuralRecord) -> ComponentId {
    record.push_component(Primitive::And.type_id(), Placement::Undefined, Orientation::Zero)
}

fn wire(record: &mut StructuralRecord, from: ComponentId, to: ComponentId) {
    record.connect(LinkEnd::new(from, PortId(1)), LinkEnd::new(to, PortId(0)));
}

/// A single chain of gates.
fn chain(n: usize) -> StructuralRecord {
    let mut record = StructuralRecord::new("chain");
    let mut prev = gate(&mut record);
    for _ in 1..n {
        let next = gate(&mut record);
        wire(&mut record, prev, next);
        prev = next;
    }
    record
}

/// Square grid where each gate feeds its right and lower neighbour.
fn grid(side: usize) -> StructuralRecord {
    let mut record = StructuralRecord::new("grid");
    let ids: Vec<ComponentId> = (0..side * side).map(|_| gate(&mut record)).collect();
    for row in 0..side {
        for col in 0..side {
            let here = ids[row * side + col];
            if col + 1 < side {
                wire(&mut record, here, ids[row * side + col + 1]);
            }
            if row + 1 < side {
                wire(&mut record, here, ids[(row + 1) * side + col]);
            }
        }
    }
    record
}

/// Independent feedback rings of eight gates.
fn rings(n: usize) -> StructuralRecord {
    let mut record = StructuralRecord::new("rings");
    for _ in 0..n.div_ceil(8) {
        let ring: Vec<ComponentId> = (0..8).map(|_| gate(&mut record)).collect();
        for (i, &id) in ring.iter().enumerate() {
            wire(&mut record, id, ring[(i + 1) % ring.len()]);
        }
    }
    record
}

/// Benchmark the full validation pipeline
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let importer = Importer::default();

    for size in &[100usize, 1_000, 5_000] {
        let record = chain(*size);
        group.bench_with_input(BenchmarkId::new("chain", size), &record, |b, r| {
            b.iter(|| {
                let mut record = r.clone();
                let mut ws = Workspace::new();
                importer.validate(black_box(&mut record), &mut ws).unwrap();
            });
        });

        let record = rings(*size);
        group.bench_with_input(BenchmarkId::new("rings", size), &record, |b, r| {
            b.iter(|| {
                let mut record = r.clone();
                let mut ws = Workspace::new();
                importer.validate(black_box(&mut record), &mut ws).unwrap();
            });
        });
    }

    for side in &[10usize, 30, 70] {
        let record = grid(*side);
        group.bench_with_input(BenchmarkId::new("grid", side * side), &record, |b, r| {
            b.iter(|| {
                let mut record = r.clone();
                let mut ws = Workspace::new();
                importer.validate(black_box(&mut record), &mut ws).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
