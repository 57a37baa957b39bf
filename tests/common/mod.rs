#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use telecanon::{Channel, TelemetryRun};

pub fn fixture(name: &str) -> Utf8PathBuf {
    Utf8Path::new("tests/data").join(name)
}

/// Every per-sample array and mask has `sample_count` entries, time starts at 0 and never
/// decreases, and `total_g` is valid exactly where both components are.
pub fn assert_run_invariants(run: &TelemetryRun) {
    let n = run.metadata().sample_count;
    assert_eq!(run.len(), n);
    for values in [
        run.timestamps(),
        run.x(),
        run.y(),
        run.z(),
        run.speed(),
        run.heading(),
        run.yaw_rate(),
        run.ax_body(),
        run.ay_body(),
        run.total_g(),
        run.gps_accuracy(),
    ] {
        assert_eq!(values.len(), n);
    }
    assert_eq!(run.gps_update().len(), n);
    if let Some(laps) = run.lap_number() {
        assert_eq!(laps.len(), n);
    }
    for channel in Channel::ALL {
        assert_eq!(run.validity(channel).len(), n, "mask of {channel}");
        assert!(run.channel_info(channel).is_some(), "info of {channel}");
    }

    if let Some(first) = run.timestamps().first() {
        assert_eq!(*first, 0.0);
    }
    assert!(run.timestamps().windows(2).all(|w| w[0] <= w[1]));

    for i in 0..n {
        assert_eq!(
            run.is_valid(Channel::TotalG, i),
            run.is_valid(Channel::Ax, i) && run.is_valid(Channel::Ay, i)
        );
    }
}

/// Route crate logs to the test output; `RUST_LOG=telecanon=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
