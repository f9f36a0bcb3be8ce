//! Tests for feature frames and dataset sources.

use super::*;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn day(d: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap())
}

fn sample_frame() -> FeatureFrame {
    FeatureFrame::from_columns([
        (
            "ticker",
            Column::Text(vec![
                Some("AAA".into()),
                Some("BBB".into()),
                Some("AAA".into()),
                None,
                Some("CCC".into()),
            ]),
        ),
        ("date", Column::Timestamp(vec![day(1), day(10), day(20), day(25), None])),
        ("f", Column::Numeric(vec![1.0, f64::NAN, 3.0, f64::INFINITY, 5.0])),
    ])
    .unwrap()
}

#[test]
fn test_frame_rejects_length_mismatch() {
    let result = FeatureFrame::from_columns([
        ("a", Column::Numeric(vec![1.0, 2.0])),
        ("b", Column::Numeric(vec![1.0])),
    ]);
    assert!(result.is_err());
}

#[test]
fn test_finite_values_drop_nan_and_inf() {
    let frame = sample_frame();
    assert_eq!(frame.finite_values("f").unwrap(), vec![1.0, 3.0, 5.0]);
    assert!(frame.finite_values("ticker").is_none());
    assert!(frame.finite_values("missing").is_none());
}

#[test]
fn test_entity_ids_and_groups() {
    let frame = sample_frame();
    let ids: Vec<_> = frame.entity_ids("ticker").into_iter().collect();
    assert_eq!(ids, vec!["AAA", "BBB", "CCC"]);

    let groups = frame.group_rows("ticker");
    assert_eq!(groups["AAA"], vec![0, 2]);
    assert_eq!(groups["CCC"], vec![4]);
}

#[test]
fn test_numeric_entity_ids_render_as_integers() {
    let frame =
        FeatureFrame::from_columns([("id", Column::Numeric(vec![7.0, 7.0, 12.0]))]).unwrap();
    let ids: Vec<_> = frame.entity_ids("id").into_iter().collect();
    assert_eq!(ids, vec!["12", "7"]);
}

#[test]
fn test_take_preserves_columns() {
    let frame = sample_frame();
    let sub = frame.take(&[2, 0]);
    assert_eq!(sub.len(), 2);
    assert_eq!(sub.finite_values("f").unwrap(), vec![3.0, 1.0]);
    assert_eq!(sub.column_names().count(), 3);
}

#[test]
fn test_filter_recent_relative_to_dataset_max() {
    let frame = sample_frame();
    // max is day 25; a 10 day lookback keeps days 20 and 25
    let recent = frame.filter_recent("date", Duration::days(10)).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent.max_timestamp("date"), day(25));

    // rows without timestamps never survive
    let all = frame.filter_recent("date", Duration::days(365)).unwrap();
    assert_eq!(all.len(), 4);
}

#[test]
fn test_filter_recent_with_oversized_lookback_keeps_all() {
    let frame = sample_frame();
    let all = frame.filter_recent("date", Duration::days(4_000_000_000)).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.max_timestamp("date"), day(25));
}

#[test]
fn test_filter_recent_requires_timestamp_column() {
    let frame = sample_frame();
    assert!(frame.filter_recent("missing", Duration::days(1)).is_none());
}

#[test]
fn test_text_timestamps_are_parsed() {
    let frame = FeatureFrame::from_columns([(
        "date",
        Column::Text(vec![
            Some("2024-03-01".into()),
            Some("2024-03-02 12:30:00".into()),
            Some("2024-03-03T08:00:00Z".into()),
            Some("yesterday".into()),
        ]),
    )])
    .unwrap();
    let stamps = frame.timestamps("date").unwrap();
    assert_eq!(stamps[0], day(1));
    assert_eq!(stamps[1], Some(Utc.with_ymd_and_hms(2024, 3, 2, 12, 30, 0).unwrap()));
    assert_eq!(stamps[2], Some(Utc.with_ymd_and_hms(2024, 3, 3, 8, 0, 0).unwrap()));
    assert_eq!(stamps[3], None);
}

#[test]
fn test_numeric_timestamps_are_epoch_millis() {
    let frame =
        FeatureFrame::from_columns([("date", Column::Numeric(vec![86_400_000.0]))]).unwrap();
    assert_eq!(frame.timestamps("date").unwrap()[0], DateTime::from_timestamp(86_400, 0));
}

#[test]
fn test_file_dataset_absent() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileDataset::new(dir.path().join("baseline.parquet"));
    assert!(source.load().unwrap().is_none());
}

#[test]
fn test_file_dataset_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.csv");
    std::fs::write(&path, "ticker,f\nAAA,1\n").unwrap();
    let err = FileDataset::new(&path).load().unwrap_err();
    assert!(err.to_string().contains("unsupported extension"));
}

#[test]
fn test_file_dataset_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("current.json");
    std::fs::write(&path, r#"[{"ticker": "AAA", "f": 1.5}, {"ticker": "BBB", "f": 2.5}]"#)
        .unwrap();
    let frame = FileDataset::new(&path).load().unwrap().unwrap();
    assert_eq!(frame.len(), 2);
    assert!(FileDataset::new(&path).describe().ends_with("current.json"));
}

#[test]
fn test_memory_dataset() {
    assert!(MemoryDataset::absent().load().unwrap().is_none());
    let source = MemoryDataset::new(sample_frame());
    assert_eq!(source.load().unwrap().unwrap().len(), 5);
    assert!(source.describe().contains("5 rows"));
}
