//! Performance benchmarks for shape-lod-lib
//!
//! Run with: cargo bench --package shape-lod-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use shape_lod_lib::builder::{build_sampled, build_sorted};
use shape_lod_lib::{Config, GeneralizationTree, ShapeCollection, VertexChain};
use std::hint::black_box;

/// Generate a noisy closed ring resembling a coastline
fn generate_ring(num_points: usize) -> Vec<Coord<f64>> {
    (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64 * std::f64::consts::TAU;
            let r = 1000.0 + 80.0 * (t * 13.0).sin() + 12.0 * (t * 97.0).cos();
            Coord {
                x: r * t.cos(),
                y: r * t.sin(),
            }
        })
        .collect()
}

/// Encode a single-record polygon shapefile around `ring`
fn generate_shapefile(ring: &[Coord<f64>]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&5i32.to_le_bytes());
    for v in [-1100.0f64, -1100.0, 1100.0, 1100.0] {
        content.extend_from_slice(&v.to_le_bytes());
    }
    content.extend_from_slice(&1i32.to_le_bytes());
    content.extend_from_slice(&(ring.len() as i32).to_le_bytes());
    content.extend_from_slice(&0i32.to_le_bytes());
    for c in ring {
        content.extend_from_slice(&c.x.to_le_bytes());
        content.extend_from_slice(&c.y.to_le_bytes());
    }

    let mut file = vec![0u8; 100];
    file[0..4].copy_from_slice(&9994i32.to_be_bytes());
    let total_words = ((100 + 8 + content.len()) / 2) as i32;
    file[24..28].copy_from_slice(&total_words.to_be_bytes());
    file[28..32].copy_from_slice(&1000i32.to_le_bytes());
    file[32..36].copy_from_slice(&5i32.to_le_bytes());
    file.extend_from_slice(&1i32.to_be_bytes());
    file.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
    file.extend(content);
    file
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_build");

    for &n in &[1_000usize, 10_000] {
        let ring = generate_ring(n);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("sort", n), &ring, |b, ring| {
            b.iter(|| {
                let mut tree = GeneralizationTree::with_capacity(ring.len());
                build_sorted(VertexChain::from_ring(ring.iter().copied()), &mut tree);
                black_box(tree)
            })
        });

        group.bench_with_input(BenchmarkId::new("sample", n), &ring, |b, ring| {
            b.iter(|| {
                let mut tree = GeneralizationTree::with_capacity(ring.len());
                build_sampled(VertexChain::from_ring(ring.iter().copied()), &mut tree, 3);
                black_box(tree)
            })
        });
    }

    group.finish();
}

fn bench_decode_and_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");
    let file = generate_shapefile(&generate_ring(50_000));
    group.throughput(Throughput::Bytes(file.len() as u64));

    group.bench_function("from_bytes_50k", |b| {
        b.iter(|| black_box(ShapeCollection::from_bytes(&file, Config::default()).unwrap()))
    });

    let collection = ShapeCollection::from_bytes(&file, Config::default()).unwrap();
    group.bench_function("query_50k", |b| {
        b.iter(|| black_box(collection.query(black_box(25.0))))
    });

    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_decode_and_query);
criterion_main!(benches);
