use camino::Utf8PathBuf;
use telecanon::{
    parse_raw_file, parse_telemetry_file, parse_telemetry_files, OriginOverride, TelemetryError,
};

mod common;
use common::{fixture, init_tracing};

#[test]
fn test_unknown_extension() {
    let err = parse_telemetry_file(&fixture("session.txt"), &OriginOverride::auto()).unwrap_err();
    assert!(matches!(err, TelemetryError::AdapterNotFound(_)));
}

#[test]
fn test_unrecognized_header() {
    let err = parse_raw_file(&fixture("unknown_columns.csv")).unwrap_err();
    assert_eq!(
        err,
        TelemetryError::AdapterNotFound(fixture("unknown_columns.csv").to_string())
    );
}

#[test]
fn test_missing_time_column() {
    let err = parse_raw_file(&fixture("no_time_column.csv")).unwrap_err();
    match err {
        TelemetryError::MalformedHeader(msg) => assert!(msg.contains("no_time_column.csv")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unreadable_time_cell() {
    let err = parse_raw_file(&fixture("bad_time.csv")).unwrap_err();
    assert_eq!(err, TelemetryError::UnsupportedTimeFormat("noon".into()));
}

#[test]
fn test_missing_file() {
    let err = parse_raw_file(&fixture("does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, TelemetryError::IoFailure(_)));
}

#[test]
fn test_batch_isolates_failures() {
    init_tracing();

    let paths: Vec<Utf8PathBuf> = [
        "clock_times.csv",
        "bad_time.csv",
        "session.txt",
        "racerender_20240601_101500.csv",
    ]
    .iter()
    .map(|name| fixture(name))
    .collect();

    let results = parse_telemetry_files(&paths, &OriginOverride::auto());
    assert_eq!(results.len(), 4);

    let outcomes: Vec<bool> = results.iter().map(|(_, r)| r.is_ok()).collect();
    assert_eq!(outcomes, vec![true, false, false, true]);
    for ((path, _), expected) in results.iter().zip(&paths) {
        assert_eq!(path, expected);
    }
    assert!(matches!(
        results[1].1,
        Err(TelemetryError::UnsupportedTimeFormat(_))
    ));
}
