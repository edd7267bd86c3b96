use calcitrace::{
    construct_g, convolve_g, normalize, oasis_ar1, pulse_response, pulse_train, review_units,
    spikes_from_calcium, ReviewConfig, Solver, UnitTraces, DEFAULT_PULSE_LENGTH,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Sparse spike train with varying amplitudes.
fn spike_train(length: usize) -> Vec<f64> {
    (0..length)
        .map(|t| if t % 37 == 0 { 1.0 + (t % 5) as f64 * 0.2 } else { 0.0 })
        .collect()
}

// Explicit inverse is O(T³); keep sizes small enough for it to finish
fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolve_g");
    let g = [1.5, -0.56];

    for length in [64usize, 128, 256].iter() {
        let s = spike_train(*length);
        group.throughput(Throughput::Elements(*length as u64));

        group.bench_with_input(BenchmarkId::new("inverse", length), &s, |b, s| {
            b.iter(|| black_box(convolve_g(black_box(s), black_box(&g), Solver::Inverse)));
        });
        group.bench_with_input(BenchmarkId::new("banded", length), &s, |b, s| {
            b.iter(|| black_box(convolve_g(black_box(s), black_box(&g), Solver::Banded)));
        });
    }

    group.finish();
}

fn bench_banded_long(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolve_g_banded_long");

    for order in [1usize, 2, 4].iter() {
        let g: Vec<f64> = (0..*order).map(|i| 0.5 / (i + 1) as f64).collect();
        let s = spike_train(10_000);
        group.throughput(Throughput::Elements(s.len() as u64));

        group.bench_with_input(BenchmarkId::new("ar", order), &g, |b, g| {
            b.iter(|| black_box(convolve_g(black_box(&s), black_box(g), Solver::Banded)));
        });
    }

    group.finish();
}

fn bench_construct_g(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct_g");

    for length in [128usize, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(length), length, |b, &length| {
            b.iter(|| black_box(construct_g(black_box(&[1.5, -0.56]), length)));
        });
    }

    group.finish();
}

fn bench_pulse_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("pulse_response");

    group.bench_function("ar2_default_length", |b| {
        b.iter(|| black_box(pulse_response(black_box(&[1.5, -0.56]), DEFAULT_PULSE_LENGTH)));
    });

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    let trace: Vec<f64> = (0..10_000)
        .map(|i| if i % 97 == 0 { f64::NAN } else { (i as f64 * 0.01).sin() })
        .collect();
    group.throughput(Throughput::Elements(trace.len() as u64));

    group.bench_function("10k_with_missing", |b| {
        b.iter(|| black_box(normalize(black_box(&trace))));
    });

    group.finish();
}

// OASIS deconvolution benchmarks - calcium imaging spike inference
fn bench_oasis(c: &mut Criterion) {
    let mut group = c.benchmark_group("oasis_ar1");

    for length in [1_000usize, 10_000].iter() {
        let clean = pulse_train(&[0.95], *length, 50).map(|p| p.calcium);
        let Ok(clean) = clean else { continue };
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, &c)| c + 0.05 * ((i * 7919 % 101) as f64 / 50.0 - 1.0))
            .collect();
        group.throughput(Throughput::Elements(*length as u64));

        group.bench_with_input(BenchmarkId::from_parameter(length), &noisy, |b, y| {
            b.iter(|| black_box(oasis_ar1(black_box(y), 0.95, 0.1)));
        });
    }

    group.bench_function("spikes_from_calcium_10k", |b| {
        let c: Vec<f64> = (0..10_000).map(|i| (i as f64 * 0.003).cos()).collect();
        b.iter(|| black_box(spikes_from_calcium(black_box(&c), &[0.95])));
    });

    group.finish();
}

fn bench_review(c: &mut Criterion) {
    let mut group = c.benchmark_group("review_units");

    let units: Vec<UnitTraces> = (0..32)
        .map(|id| {
            let trace: Vec<f64> = (0..2_000).map(|t| ((t + id) as f64 * 0.05).sin()).collect();
            UnitTraces {
                unit_id: id as u32,
                raw: trace.clone(),
                calcium: trace.clone(),
                spikes: trace.clone(),
                fitted: trace,
                g: vec![0.9],
            }
        })
        .collect();
    let config = ReviewConfig::default();

    group.bench_function("32_units_2000_frames", |b| {
        b.iter(|| black_box(review_units(black_box(&units), &config)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_solvers,
    bench_banded_long,
    bench_construct_g,
    bench_pulse_response,
    bench_normalize,
    bench_oasis,
    bench_review,
);
criterion_main!(benches);
