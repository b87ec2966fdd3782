//! End-to-end runs over synthetic measurement folders.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pm10_core::{AirQualityBand, AirQualityLevel, BandColor, Error, ForecastConfig};
use pm10_pipeline::Pipeline;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn pm10_at(i: usize) -> f64 {
    20.0 + 10.0 * (i as f64 / 5.0).sin() + (i % 7) as f64
}

/// Write hourly rows `range` with the given delimiter.
fn write_file(dir: &Path, name: &str, delim: char, range: std::ops::Range<usize>) {
    write_rows(dir, name, delim, range.map(|i| (start() + Duration::hours(i as i64), pm10_at(i))));
}

fn write_rows(
    dir: &Path,
    name: &str,
    delim: char,
    rows: impl Iterator<Item = (NaiveDateTime, f64)>,
) {
    let mut text = ["Date", "Time", "PM10", "NO2"].join(&delim.to_string());
    text.push('\n');
    for (ts, pm10) in rows {
        let fields = [
            ts.format("%Y-%m-%d").to_string(),
            ts.format("%H:%M").to_string(),
            format!("{:.1}", pm10),
            format!("{:.1}", 15.0 + pm10 / 4.0),
        ];
        text.push_str(&fields.join(&delim.to_string()));
        text.push('\n');
    }
    fs::write(dir.join(name), text).unwrap();
}

fn pipeline() -> Pipeline {
    let mut config = ForecastConfig::default();
    config.model.n_trees = 12;
    Pipeline::new(config).unwrap().with_reference_time(now())
}

#[test]
fn test_overlapping_files_are_merged_sorted_and_deduplicated() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.csv", ',', 0..150);
    write_file(dir.path(), "b.csv", ';', 100..250);
    write_file(dir.path(), "c.tsv", '\t', 200..300);

    let data = pipeline().prepare(dir.path()).unwrap();
    let table = &data.table;

    assert_eq!(table.len(), 300);
    assert_eq!(data.cleaning.duplicates, 100);
    assert!(data.warnings.is_empty());
    for pair in table.readings.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
    assert_eq!(table.readings[0].timestamp, start());
    assert_eq!(data.dataset.len(), data.frame.len() - 1);
}

#[test]
fn test_saturated_value_is_removed() {
    let dir = TempDir::new().unwrap();
    let rows = (0..200).map(|i| {
        let v = if i == 120 { 1500.0 } else { pm10_at(i) };
        (start() + Duration::hours(i as i64), v)
    });
    write_rows(dir.path(), "data.csv", ',', rows);

    let data = pipeline().prepare(dir.path()).unwrap();
    assert_eq!(data.cleaning.saturated, 1);
    assert_eq!(data.table.len(), 199);
    assert!(data.table.readings.iter().all(|r| (0.0..=1000.0).contains(&r.pm10)));
}

#[test]
fn test_far_future_row_is_removed() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..200);
    let future = now() + Duration::days(5 * 365);
    write_rows(dir.path(), "later.csv", ',', std::iter::once((future, 30.0)));

    let data = pipeline().prepare(dir.path()).unwrap();
    assert_eq!(data.cleaning.future, 1);
    assert_eq!(data.table.len(), 200);
    assert!(data.table.readings.iter().all(|r| r.timestamp < now()));
}

#[test]
fn test_predict_24_hours() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..300);

    let response = pipeline().predict(dir.path(), Some(24)).unwrap();
    assert!(response.success);
    assert_eq!(response.hourly_predictions.len(), 24);
    assert_eq!(response.prediction_summary.hours_ahead, 24);
    assert!(!response.daily_predictions.is_empty());

    let last = start() + Duration::hours(299);
    assert_eq!(response.hourly_predictions[0].datetime, last + Duration::hours(1));
    for pair in response.hourly_predictions.windows(2) {
        assert_eq!(pair[1].datetime - pair[0].datetime, Duration::hours(1));
    }
    assert!(response.hourly_predictions.iter().all(|h| h.pm10_value >= 0.0));
    let summary = &response.prediction_summary;
    assert!(summary.min_pm10 <= summary.average_pm10 && summary.average_pm10 <= summary.max_pm10);
    assert_eq!(response.generated_at, now());
}

#[test]
fn test_default_horizon_is_72() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..200);

    let response = pipeline().predict(dir.path(), None).unwrap();
    assert_eq!(response.hourly_predictions.len(), 72);
    assert!(response.daily_predictions.len() >= 3);
}

#[test]
fn test_too_few_rows_is_insufficient_data() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..80);

    let err = pipeline().train(dir.path()).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
    assert_eq!(err.kind(), "insufficient_data");
}

#[test]
fn test_band_thresholds() {
    let band = AirQualityBand::classify(10.0);
    assert_eq!(band.level, AirQualityLevel::VeryGood);
    assert_eq!(band.color, BandColor::Green);
    assert_eq!(band.code, 1);

    for (value, code) in [(15.0, 1), (25.0, 2), (50.0, 3), (75.0, 4), (75.01, 5)] {
        assert_eq!(AirQualityBand::classify(value).code, code, "value {}", value);
    }
}

#[test]
fn test_runs_are_deterministic() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.csv", ',', 0..160);
    write_file(dir.path(), "b.csv", ';', 140..260);

    let p = pipeline();
    let first = p.prepare(dir.path()).unwrap();
    let second = p.prepare(dir.path()).unwrap();
    assert_eq!(first.table, second.table);

    let a = p.train(dir.path()).unwrap();
    let b = p.train(dir.path()).unwrap();
    assert_eq!(a.metrics, b.metrics);
}

#[test]
fn test_train_response_shape() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..200);

    let response = pipeline().train(dir.path()).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert!(json["metrics"]["mae"].as_f64().unwrap() >= 0.0);
    assert!(json["metrics"]["rmse"].is_number());
    assert!(json["metrics"]["r2_score"].is_number());
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "data.csv", ',', 0..200);
    fs::write(dir.path().join("broken.csv"), "just one column\nno delimiters here\n").unwrap();

    let data = pipeline().prepare(dir.path()).unwrap();
    assert_eq!(data.warnings.len(), 1);
    assert_eq!(data.table.len(), 200);
}

#[test]
fn test_missing_target_column_is_schema_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("data.csv"),
        "Date,NO2\n2024-01-01 00:00,12.0\n2024-01-01 01:00,13.0\n",
    )
    .unwrap();

    let err = pipeline().train(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
}

#[test]
fn test_empty_folder_is_ingestion_error() {
    let dir = TempDir::new().unwrap();
    let err = pipeline().train(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Ingestion(_)));
}
