use camino::Utf8PathBuf;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use telecanon::raw::{FileFingerprint, RawTelemetry, SpeedUnit};
use telecanon::{canonicalize_raw, OriginOverride};

/// A 20 Hz lap around a ~300 m circle, with speed and accelerometer channels.
fn synthetic_lap(samples: usize) -> RawTelemetry {
    let dt = 0.05;
    let radius_deg = 0.0027;
    let timestamps: Vec<f64> = (0..samples).map(|i| i as f64 * dt).collect();
    let angle = |i: usize| i as f64 / samples as f64 * std::f64::consts::TAU;

    let latitude = (0..samples).map(|i| 45.0 + radius_deg * angle(i).sin()).collect();
    let longitude = (0..samples).map(|i| 7.0 + radius_deg * angle(i).cos()).collect();

    let mut raw = RawTelemetry::new(
        "bench",
        Utf8PathBuf::from("bench_lap.csv"),
        FileFingerprint::new("bench_lap.csv", 0, "0.000000000"),
        timestamps,
        latitude,
        longitude,
    );
    raw.speed = (0..samples).map(|i| 60.0 + 10.0 * angle(i).sin()).collect();
    raw.speed_unit = Some(SpeedUnit::Mph);
    raw.accel_x = Some((0..samples).map(|i| 0.4 * angle(3 * i).cos()).collect());
    raw.accel_y = Some((0..samples).map(|_| 0.9).collect());
    raw
}

fn bench_canonicalize(c: &mut Criterion) {
    for samples in [1_000usize, 20_000] {
        let raw = synthetic_lap(samples);
        c.bench_function(&format!("canonicalize_raw/{samples}"), |b| {
            b.iter_batched(
                || raw.clone(),
                |raw| black_box(canonicalize_raw(raw, &OriginOverride::auto())),
                BatchSize::LargeInput,
            )
        });
    }
}

fn bench_playback(c: &mut Criterion) {
    let run = canonicalize_raw(synthetic_lap(20_000), &OriginOverride::auto());
    let end = run.time_range().1;

    c.bench_function("playback/60Hz_full_run", |b| {
        b.iter(|| black_box(run.playback(0.0, Some(end), 60.0)))
    });
}

criterion_group!(benches, bench_canonicalize, bench_playback);
criterion_main!(benches);
