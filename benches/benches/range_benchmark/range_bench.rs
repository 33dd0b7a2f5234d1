//! Бенчмарки извлечения дальности и записи обзора.
//!
//! Запуск: cargo bench -p echosweep-benchmark

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use echosweep_core::{
    decode_intensities, encode_intensities, extract_distance, format_sweep, meters_per_sample,
    AngleOutcome, Sweep,
};
use echosweep_types::{IntensityFormat, Sample};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Период выборки для 50 м на 1200 выборок
const TICKS_50M: u32 = 2_260;

// =============================================================================
// Тестовые данные
// =============================================================================

/// Луч с шумом и стенкой в середине буфера.
fn beam(len: usize) -> Vec<u16> {
    let mut rng = StdRng::seed_from_u64(360);
    let wall = len / 2;

    (0..len)
        .map(|i| {
            let noise = rng.gen_range(0..12u16);
            if i >= wall {
                noise + (230.0 * (-((i - wall) as f64) / 15.0).exp()) as u16
            } else {
                noise
            }
        })
        .collect()
}

// =============================================================================
// Бенчмарки
// =============================================================================

fn bench_extract_distance(c: &mut Criterion) {
    let mps = meters_per_sample(TICKS_50M).expect("valid timing");
    let mut group = c.benchmark_group("extract_distance");

    for len in [600usize, 1_200, 2_400] {
        let samples: Vec<Sample> = decode_intensities(
            &encode_intensities(&beam(len), IntensityFormat::U8),
            IntensityFormat::U8,
        )
        .expect("valid payload");

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &samples, |b, s| {
            b.iter(|| extract_distance(black_box(s), black_box(mps)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let intensities = beam(1_200);
    let mut group = c.benchmark_group("decode_intensities");

    for format in [IntensityFormat::U8, IntensityFormat::U16Be] {
        let payload = encode_intensities(&intensities, format);

        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{format:?}")),
            &payload,
            |b, p| b.iter(|| decode_intensities(black_box(p), format)),
        );
    }

    group.finish();
}

fn bench_sweep_format(c: &mut Criterion) {
    let mut sweep = Sweep::new(0, 400);

    for angle in 0..400u16 {
        sweep
            .insert(angle, AngleOutcome::Distance(5.0 + angle as f64 / 37.0))
            .expect("fresh angle");
    }

    let sealed = sweep.seal().expect("complete sweep");

    c.bench_function("format_sweep_400", |b| {
        b.iter(|| format_sweep(black_box(&sealed)))
    });
}

criterion_group!(
    benches,
    bench_extract_distance,
    bench_decode,
    bench_sweep_format
);
criterion_main!(benches);
