// benches/benchmark.rs
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use landcover_change::grid::{Grid, ValidityMask};
use landcover_change::processing::change::change_raster;
use landcover_change::processing::classify::{classify, ThresholdContext};
use landcover_change::processing::correlation::{analyze_correlation, CorrelationInputs};
use landcover_change::processing::indices::{IndexCalculator, Observation, NDI};

const SIZE: (usize, usize) = (1024, 1024);

/// Synthetic NIR/red scene; `shift` moves part of it towards bare soil
fn synthetic_observation(shift: u16) -> Observation {
    let len = SIZE.0 * SIZE.1;
    let mut nir = vec![0u16; len];
    let mut red = vec![0u16; len];

    // Fill with some test values (simulating NIR and RED bands)
    for i in 0..len {
        let loss = if i % 7 == 0 { shift } else { 0 };
        nir[i] = 3000 + (i % 100) as u16 - loss;
        red[i] = 1000 + (i % 50) as u16;
    }

    let nir = Grid::new(SIZE, nir).unwrap();
    let red = Grid::new(SIZE, red).unwrap();
    NDI::ndvi()
        .calculate(&[&nir, &red], &ValidityMask::all_valid(SIZE))
        .unwrap()
}

/// Benchmark the core NDVI calculation logic in isolation
fn benchmark_ndvi_calculation(c: &mut Criterion) {
    let nir = Grid::filled(SIZE, 5000u16);
    let red = Grid::filled(SIZE, 2500u16);
    let mask = ValidityMask::all_valid(SIZE);
    let ndvi = NDI::ndvi();

    c.bench_function("ndvi_core_calculation", |b| {
        b.iter(|| ndvi.calculate(black_box(&[&nir, &red]), black_box(&mask)))
    });
}

fn benchmark_classification(c: &mut Criterion) {
    let obs = synthetic_observation(0);

    c.bench_function("classify_urban", |b| {
        b.iter(|| classify(black_box(&obs.index), Some(&obs.mask), ThresholdContext::Urban))
    });
}

/// Change raster and correlation over a pair of classified dates
fn benchmark_change_analysis(c: &mut Criterion) {
    let before = synthetic_observation(0);
    let after = synthetic_observation(1800);
    let before_classes = classify(&before.index, Some(&before.mask), ThresholdContext::Urban).unwrap();
    let after_classes = classify(&after.index, Some(&after.mask), ThresholdContext::Urban).unwrap();
    let masks = Some((&before.mask, &after.mask));

    c.bench_function("change_raster", |b| {
        b.iter(|| change_raster(black_box(&before_classes), black_box(&after_classes), masks))
    });

    let inputs = CorrelationInputs {
        before_index: &before.index,
        after_index: &after.index,
        before_classes: &before_classes,
        after_classes: &after_classes,
        masks,
    };
    c.bench_function("urban_gain_correlation", |b| {
        b.iter(|| analyze_correlation(black_box(&inputs)))
    });
}

criterion_group!(
    benches,
    benchmark_ndvi_calculation,
    benchmark_classification,
    benchmark_change_analysis
);
criterion_main!(benches);
