//! Microbenchmarks for the per-frame hot path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spectral_gate::gate::{compute_gain, GateTunables, NoiseProfileCalibrator};
use spectral_gate::spectrum::{AnalyzerConfig, SpectrumAnalyzer};

fn bench_compute_gain(c: &mut Criterion) {
    let mut calibrator = NoiseProfileCalibrator::new();
    calibrator.begin(100, 100).unwrap();
    calibrator.supply_spectrum(&vec![-60.0; 1024]).unwrap();
    let profile = calibrator.result().unwrap();

    let live = vec![-48.0; 1024];
    let tunables = GateTunables::default();

    c.bench_function("compute_gain_1024_bins", |b| {
        b.iter(|| compute_gain(black_box(&live), Some(&profile), &tunables))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default()).unwrap();
    let frame: Vec<f64> = (0..2048).map(|n| (0.05 * n as f64).sin()).collect();

    c.bench_function("analyze_2048_samples", |b| {
        b.iter(|| analyzer.analyze(black_box(&frame)))
    });
}

criterion_group!(benches, bench_compute_gain, bench_analyze);
criterion_main!(benches);
