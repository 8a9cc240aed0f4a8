//! Benchmark for full chunk generation (all three passes).
//!
//! Run with: cargo bench --package blockyard_procedural --bench generation_benchmark

use blockyard_procedural::{GenerationParams, TerrainGenerator, WorldSeed};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::IVec3;

fn benchmark_generate_chunk(c: &mut Criterion) {
    let generator = TerrainGenerator::new(WorldSeed::new(42), GenerationParams::default());

    let mut group = c.benchmark_group("generate_chunk");
    group.sample_size(20);

    for size in [16usize, 32] {
        let mut voxels = vec![0u8; size * size * size];
        group.throughput(Throughput::Elements((size * size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                black_box(generator.generate_chunk(
                    black_box(IVec3::ZERO),
                    size,
                    true,
                    &mut voxels,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_generate_chunk);
criterion_main!(benches);
