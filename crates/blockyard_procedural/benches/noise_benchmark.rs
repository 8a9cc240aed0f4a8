//! Benchmark for noise generation performance.
//!
//! Run with: cargo bench --package blockyard_procedural --bench noise_benchmark

use blockyard_procedural::noise::{SimplexNoise, WorldSeed};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn benchmark_single_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("single_noise_sample_2d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });

    c.bench_function("single_noise_sample_3d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample3(black_box(x), black_box(x * 0.7), black_box(x * 0.3)))
        });
    });
}

fn benchmark_chunk_volume(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("chunk_volume");
    group.throughput(Throughput::Elements(32 * 32 * 32));
    group.sample_size(20);

    group.bench_function("3d_samples_32_cubed", |b| {
        b.iter(|| {
            for i in 0..32 * 32 * 32 {
                let x = f64::from(i / 1024) * 0.07;
                let y = f64::from((i / 32) % 32) * 0.07;
                let z = f64::from(i % 32) * 0.07;
                black_box(noise.sample3(x, y, z));
            }
        });
    });

    group.finish();
}

fn benchmark_octaved_noise(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("octaved_noise_4_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.octaved(black_box(x), black_box(x * 0.7), 4, 0.5, 2.0))
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_sample,
    benchmark_chunk_volume,
    benchmark_octaved_noise
);
criterion_main!(benches);
