use approx::assert_abs_diff_eq;
use telecanon::constants::MPH_TO_MS;
use telecanon::{parse_telemetry_file, Channel, OriginOverride, TelemetryError, TelemetryRun};

mod common;
use common::fixture;

fn racerender() -> TelemetryRun {
    parse_telemetry_file(
        &fixture("racerender_20240601_101500.csv"),
        &OriginOverride::auto(),
    )
    .unwrap()
}

#[test]
fn test_sample_between_rows() {
    let run = racerender();
    let sample = run.sample_at_time(0.15);

    assert_eq!(sample.time, 0.15);
    assert!(sample.valid.speed);
    assert!(sample.valid.get(Channel::TotalG));
    assert_abs_diff_eq!(
        sample.speed,
        (15.5 + 25.3) / 2.0 * MPH_TO_MS,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(sample.heading, 46.5, epsilon = 1e-9);
    assert_abs_diff_eq!(sample.total_g, sample.ax.hypot(sample.ay), epsilon = 1e-12);
    // yaw rate is absent from the file
    assert!(!sample.valid.yaw_rate);
}

#[test]
fn test_sample_outside_range_is_clamped() {
    let run = racerender();
    let before = run.sample_at_time(-3.0);
    assert_eq!(before.time, 0.0);
    assert_eq!(before.speed, run.speed()[0]);

    let after = run.sample_at_time(10.0);
    assert_eq!(after.time, run.timestamps()[4]);
    assert_eq!(after.speed, run.speed()[4]);
}

#[test]
fn test_bounding_box_and_time_range() {
    let run = racerender();
    let bbox = run.bounding_box().unwrap();
    for (x, y) in run.x().iter().zip(run.y()) {
        assert!(bbox.min_x <= *x && *x <= bbox.max_x);
        assert!(bbox.min_y <= *y && *y <= bbox.max_y);
    }
    assert_eq!(bbox.min_x, 0.0);
    assert!(bbox.width() > 0.0 && bbox.height() > 0.0);

    let (start, end) = run.time_range();
    assert_eq!(start, run.timestamps()[0]);
    assert_eq!(end, run.timestamps()[4]);
}

#[test]
fn test_playback_over_whole_run() {
    let run = racerender();
    let frames = run.playback(0.0, None, 10.0).unwrap();

    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].time, 0.0);
    assert_eq!(frames[4].time, run.time_range().1);
    assert!(frames.windows(2).all(|w| w[0].time < w[1].time));
}

#[test]
fn test_playback_window_and_errors() {
    let run = racerender();

    let frames = run.playback(-1.0, Some(0.25), 20.0).unwrap();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0].time, 0.0);
    assert_abs_diff_eq!(frames[2].time, 0.1, epsilon = 1e-12);
    assert_eq!(frames[5].time, 0.25);

    assert!(matches!(
        run.playback(0.0, None, 0.5),
        Err(TelemetryError::InvalidParameter(_))
    ));
    assert!(matches!(
        run.playback(0.0, None, 150.0),
        Err(TelemetryError::InvalidParameter(_))
    ));
    assert!(matches!(
        run.playback(0.3, Some(0.1), 10.0),
        Err(TelemetryError::InvalidParameter(_))
    ));
}
