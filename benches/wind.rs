//! Run these benches with `cargo bench --bench wind -- --verbose`
use criterion::{criterion_group, criterion_main, Criterion};
use metcalc::{wind, Depth, LayerSpec};
use metfor::{Meters, MetersPSec, WindUV};

mod utils;

fn build_tester() -> Criterion {
    Criterion::default()
        .sample_size(200)
        .measurement_time(std::time::Duration::from_secs(10))
        .noise_threshold(0.03)
        .significance_level(0.01)
}

criterion_main!(wind_benches);

criterion_group!(
    name = wind_benches;
    config = build_tester();
    targets = bulk_shear_bench, sr_helicity_bench, bunkers_storm_motion_bench, corfidi_bench
);

fn bulk_shear_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_files();
    let layer = LayerSpec::with_depth(Depth::Height(Meters(6000.0)));

    c.bench_function("bulk_shear", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = wind::bulk_shear(snd, &layer).expect("oops");
            }
        });
    });
}

fn sr_helicity_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_files();

    let storm_motion: WindUV<MetersPSec> = WindUV {
        u: MetersPSec(6.0),
        v: MetersPSec(6.0),
    };

    c.bench_function("sr_helicity", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = wind::storm_relative_helicity(snd, Meters(3000.0), None, storm_motion)
                    .expect("oops");
            }
        });
    });
}

fn bunkers_storm_motion_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_files();

    c.bench_function("bunkers_storm_motion", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = wind::bunkers_storm_motion(&snd);
            }
        });
    });
}

fn corfidi_bench(c: &mut Criterion) {
    let snds = utils::load_all_test_files();

    c.bench_function("corfidi_storm_motion", |b| {
        b.iter(|| {
            for snd in &snds {
                let _x = wind::corfidi_storm_motion(&snd, None);
            }
        });
    });
}
