use criterion::{criterion_group, criterion_main, Criterion};
use cubepeak::{CubeView, DetectConfig, Neighborhood, PeakFinder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn make_cube(shape: [usize; 3], n_spikes: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = shape[0] * shape[1] * shape[2];
    let mut data: Vec<f32> = (0..len).map(|_| rng.random::<f32>()).collect();
    for _ in 0..n_spikes {
        let idx = rng.random_range(0..len);
        data[idx] += 50.0;
    }
    data
}

fn bench_find_peaks(c: &mut Criterion) {
    let shape = [64, 64, 64];
    let data = make_cube(shape, 200, 7);
    let view = CubeView::from_slice(&data, shape).unwrap();

    let finder = PeakFinder::new(DetectConfig {
        threshold: 10.0,
        neighborhood: Neighborhood::Box { size: 3 },
        npeaks: Some(100),
        ..DetectConfig::default()
    })
    .unwrap();

    c.bench_function("find_peaks_64_box3", |b| {
        b.iter(|| {
            let table = finder.find(black_box(view), None).unwrap();
            black_box(table.len())
        })
    });

    let finder5 = PeakFinder::new(DetectConfig {
        threshold: 10.0,
        neighborhood: Neighborhood::Box { size: 5 },
        npeaks: Some(100),
        ..DetectConfig::default()
    })
    .unwrap();

    c.bench_function("find_peaks_64_box5", |b| {
        b.iter(|| {
            let table = finder5.find(black_box(view), None).unwrap();
            black_box(table.len())
        })
    });
}

criterion_group!(benches, bench_find_peaks);
criterion_main!(benches);
