use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use telecanon::constants::{CANONICAL_VERSION, MPH_TO_MS};
use telecanon::raw::{SpeedUnit, YawRateUnit};
use telecanon::run::Provenance;
use telecanon::{parse_raw_file, parse_telemetry_file, Channel, OriginOverride};

mod common;
use common::{assert_run_invariants, fixture};

#[test]
fn test_racerender_export() {
    let path = fixture("racerender_20240601_101500.csv");
    let run = parse_telemetry_file(&path, &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);

    let meta = run.metadata();
    assert_eq!(meta.sample_count, 5);
    assert_eq!(meta.source_file, path);
    assert_eq!(meta.name, "racerender_20240601_101500");
    assert_eq!(
        meta.recorded_at,
        NaiveDate::from_ymd_opt(2024, 6, 1).and_then(|d| d.and_hms_opt(10, 15, 0))
    );
    assert_eq!(meta.version, CANONICAL_VERSION);
    assert!(meta.has_gps);
    assert!(meta.has_imu);
    assert!(meta.has_speed);
    assert_abs_diff_eq!(meta.duration_s, 0.4, epsilon = 1e-12);

    // start anchored at the first fix
    assert_abs_diff_eq!(run.x()[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(run.y()[0], 0.0, epsilon = 1e-6);
    assert!(run.x()[4] > 0.0 && run.y()[4] > 0.0);
    assert_abs_diff_eq!(run.z()[0], 0.0, epsilon = 1e-6);

    assert_abs_diff_eq!(run.speed()[1], 15.5 * MPH_TO_MS, epsilon = 1e-9);
    assert_abs_diff_eq!(run.speed()[1], 6.929, epsilon = 0.01);
    assert_eq!(run.heading()[1], 45.0);
    assert_abs_diff_eq!(run.total_g()[1], 0.1_f64.hypot(0.05), epsilon = 1e-12);
    assert_eq!(run.gps_accuracy()[0], 3.0);
    assert!(run.gps_update().iter().all(|u| *u));

    assert_eq!(run.origin().lat, 32.9857);
    assert_eq!(run.origin().lon, -89.7898);
    assert_eq!(run.origin().alt, 10.0);
    assert!(!run.origin().manual_override);

    for channel in [Channel::Speed, Channel::Heading, Channel::Ax, Channel::Ay] {
        assert_eq!(
            run.channel_info(channel).map(|i| i.provenance),
            Some(Provenance::Measured)
        );
    }
    assert_eq!(
        run.channel_info(Channel::YawRate).map(|i| i.provenance),
        Some(Provenance::Derived)
    );
    assert!(run.validity(Channel::YawRate).iter().all(|v| !v));
}

#[test]
fn test_racerender_raw_keeps_source_units() {
    let raw = parse_raw_file(&fixture("racerender_20240601_101500.csv")).unwrap();
    assert_eq!(raw.source, "trackaddict");
    assert_eq!(raw.len(), 5);
    assert_eq!(raw.speed[1], 15.5);
    assert_eq!(raw.accel_x.as_deref().map(|a| a[2]), Some(0.15));
    assert_eq!(raw.accel_y.as_deref().map(|a| a[2]), Some(0.08));
}

#[test]
fn test_racechrono_export_is_trimmed_to_launch() {
    let run = parse_telemetry_file(&fixture("racechrono_2024-06-02.csv"), &OriginOverride::auto())
        .unwrap();
    assert_run_invariants(&run);

    // the first two rows stay below the launch threshold
    assert_eq!(run.len(), 3);
    assert_abs_diff_eq!(run.timestamps()[1], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(run.timestamps()[2], 0.2, epsilon = 1e-6);
    assert_eq!(run.speed(), &[2.0, 4.0, 6.0]);
    assert_eq!(run.ax_body()[0], 0.40);
    assert_eq!(run.lap_number(), Some(&[1, 1, 1][..]));

    // anchored on the first retained fix, origin still the first fix of the file
    assert_abs_diff_eq!(run.y()[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(run.y()[2], 7.78, epsilon = 0.05);
    assert_eq!(run.origin().lat, 45.0);

    assert_eq!(
        run.metadata().recorded_at,
        NaiveDate::from_ymd_opt(2024, 6, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
}

#[test]
fn test_clock_time_strings() {
    let run = parse_telemetry_file(&fixture("clock_times.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);
    assert_eq!(run.timestamps(), &[0.0, 1.0, 90.5]);
    assert_eq!(run.metadata().recorded_at, None);
}

#[test]
fn test_gps_time_milliseconds_and_kph() {
    let run = parse_telemetry_file(&fixture("gps_time_ms.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);
    assert_eq!(run.timestamps(), &[0.0, 1.0, 2.5]);
    assert_abs_diff_eq!(run.speed()[1], 10.0, epsilon = 1e-4);
    assert_abs_diff_eq!(run.speed()[2], 20.0, epsilon = 1e-4);
}

#[test]
fn test_empty_speed_column_falls_back_to_mph() {
    let raw = parse_raw_file(&fixture("speed_fallback.csv")).unwrap();
    assert_eq!(raw.speed_unit, Some(SpeedUnit::Mph));
    assert_eq!(raw.speed, vec![0.0, 10.0, 20.0]);

    let run = parse_telemetry_file(&fixture("speed_fallback.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);
    assert_abs_diff_eq!(run.speed()[1], 4.4704, epsilon = 1e-9);
    assert_abs_diff_eq!(run.speed()[2], 8.9408, epsilon = 1e-9);
    assert_eq!(
        run.channel_info(Channel::Speed).map(|i| i.provenance),
        Some(Provenance::Measured)
    );
}

#[test]
fn test_meters_per_second_preferred_over_mph() {
    let raw = parse_raw_file(&fixture("speed_both.csv")).unwrap();
    assert_eq!(raw.speed_unit, Some(SpeedUnit::MetersPerSecond));

    let run = parse_telemetry_file(&fixture("speed_both.csv"), &OriginOverride::auto()).unwrap();
    assert_eq!(run.speed(), &[0.0, 4.0, 8.0]);
}

#[test]
fn test_radian_gyro_header() {
    let raw = parse_raw_file(&fixture("gyro_rad.csv")).unwrap();
    assert_eq!(raw.yaw_rate_unit, Some(YawRateUnit::RadPerSec));
    assert_eq!(raw.yaw_rate, Some(vec![0.0, 0.5, -1.0]));

    let run = parse_telemetry_file(&fixture("gyro_rad.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);
    assert_abs_diff_eq!(run.yaw_rate()[1], 0.5_f64.to_degrees(), epsilon = 1e-9);
    assert_abs_diff_eq!(run.yaw_rate()[2], -57.29578, epsilon = 1e-5);
    assert!(run.metadata().has_imu);
}

#[test]
fn test_missing_speed_is_derived() {
    let run = parse_telemetry_file(&fixture("no_speed.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);

    assert!(run.metadata().has_speed);
    assert!(!run.metadata().has_imu);
    assert_eq!(
        run.channel_info(Channel::Speed).map(|i| i.provenance),
        Some(Provenance::Derived)
    );
    assert_eq!(
        run.channel_info(Channel::Heading).map(|i| i.provenance),
        Some(Provenance::Derived)
    );
    assert!(run.speed()[1] > 0.0);
    assert_eq!(run.speed()[0], run.speed()[1]);
    assert!(run.z().iter().all(|z| z.abs() < 1e-3));
    assert!(run.ax_body().iter().all(|a| a.is_nan()));
}

#[test]
fn test_generic_imu_only_file() {
    let raw = parse_raw_file(&fixture("generic_imu.csv")).unwrap();
    assert_eq!(raw.source, "generic_csv");

    let run = parse_telemetry_file(&fixture("generic_imu.csv"), &OriginOverride::auto()).unwrap();
    assert_run_invariants(&run);

    let meta = run.metadata();
    assert!(!meta.has_gps);
    assert!(meta.has_imu);
    assert!(!meta.has_speed);
    assert_eq!(run.len(), 3);

    assert_eq!(run.heading()[0], 10.0);
    assert_eq!(run.heading()[1], 350.0);
    assert_eq!(run.yaw_rate(), &[1.5, 2.0, 2.5]);

    // 9 g is beyond the accelerometer ceiling
    assert!(!run.is_valid(Channel::Ax, 2));
    assert!(run.ax_body()[2].is_nan());
    assert!(!run.is_valid(Channel::TotalG, 2));
    assert!(run.is_valid(Channel::TotalG, 1));

    assert!(run.bounding_box().is_none());
    assert!(run.validity(Channel::X).iter().all(|v| !v));
}

#[test]
fn test_manual_origin_override() {
    let path = fixture("racerender_20240601_101500.csv");
    let auto = parse_telemetry_file(&path, &OriginOverride::auto()).unwrap();
    let manual =
        parse_telemetry_file(&path, &OriginOverride::new(Some(32.98575), Some(-89.78975), None))
            .unwrap();

    assert_ne!(auto.origin().lat, manual.origin().lat);
    assert!(!auto.origin().manual_override);
    assert!(manual.origin().manual_override);
    assert_eq!(manual.origin().lat, 32.98575);
    // altitude still detected from the data
    assert_eq!(manual.origin().alt, 10.0);
    assert_eq!(auto.id(), manual.id());
}

#[test]
fn test_identity_is_stable() {
    let path = fixture("racerender_20240601_101500.csv");
    let first = parse_telemetry_file(&path, &OriginOverride::auto()).unwrap();
    let second = parse_telemetry_file(&path, &OriginOverride::auto()).unwrap();
    assert_eq!(first.id(), second.id());
    assert_eq!(first.id().len(), telecanon::constants::RUN_ID_LEN);
}
