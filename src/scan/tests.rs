use super::*;
use crate::data::{Column, FeatureFrame, MemoryDataset};
use crate::notify::{MemoryNotifier, NotificationKind};
use crate::retrain::{
    CircuitBreaker, CoordinatorSettings, RetrainClient, RetrainError, RetrainOutcome,
    RetrainRequest, RetrainResponse, RetrainingCoordinator,
};
use crate::storage::{
    AlertRecord, AlertStore, InMemoryStore, StorageError, StorageResult, Stores,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

type Row = (String, DateTime<Utc>, f64);

fn normal(n: usize, mean: f64, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.random_range(f64::EPSILON..1.0);
            let u2: f64 = rng.random();
            mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

fn end_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 28, 16, 0, 0).unwrap()
}

/// One row per hour, the last at `end`
fn hourly(entity: &str, values: &[f64], end: DateTime<Utc>) -> Vec<Row> {
    let n = values.len() as i64;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (entity.to_string(), end - ChronoDuration::hours(n - 1 - i as i64), *v))
        .collect()
}

fn frame(rows: &[Row]) -> FeatureFrame {
    FeatureFrame::from_columns([
        ("ticker", Column::Text(rows.iter().map(|r| Some(r.0.clone())).collect())),
        ("date", Column::Timestamp(rows.iter().map(|r| Some(r.1)).collect())),
        ("rsi_14", Column::Numeric(rows.iter().map(|r| r.2).collect())),
    ])
    .unwrap()
}

fn settings() -> ScanSettings {
    ScanSettings { features: vec!["rsi_14".to_string()], ..ScanSettings::default() }
}

/// AAPL drifts (N(0,1) vs N(1,1.2)); MSFT is unchanged.
fn drifted_pair() -> (MemoryDataset, MemoryDataset) {
    let stable = normal(500, 50.0, 5.0, 7);
    let mut baseline = hourly("AAPL", &normal(2000, 0.0, 1.0, 1), end_time());
    baseline.extend(hourly("MSFT", &stable, end_time()));
    let mut current = hourly("AAPL", &normal(500, 1.0, 1.2, 2), end_time());
    current.extend(hourly("MSFT", &stable, end_time()));
    (MemoryDataset::new(frame(&baseline)), MemoryDataset::new(frame(&current)))
}

struct FailingAlerts;

impl AlertStore for FailingAlerts {
    fn insert_alerts(&self, _: &[AlertRecord]) -> StorageResult<()> {
        Err(StorageError::Backend("disk full".into()))
    }
    fn alerts(&self, _: Option<&str>) -> StorageResult<Vec<AlertRecord>> {
        Ok(Vec::new())
    }
}

struct AcceptingClient;

impl RetrainClient for AcceptingClient {
    fn trigger(&self, request: &RetrainRequest) -> Result<RetrainResponse, RetrainError> {
        let job_id = format!("job-{}", request.entity_id);
        Ok(RetrainResponse { body: serde_json::json!({ "job_id": job_id }), job_id })
    }
}

#[test]
fn test_baseline_missing() {
    let store = Arc::new(InMemoryStore::new());
    let (_, current) = drifted_pair();
    let summary = DriftScanOrchestrator::new(settings(), store.clone())
        .scan(&MemoryDataset::absent(), &current);

    assert_eq!(summary.status, ScanStatus::BaselineMissing);
    assert_eq!(summary.alerts_created, 0);
    assert!(summary.reports.is_empty());
    assert_eq!(store.alert_count(), 0);
}

#[test]
fn test_current_missing() {
    let (baseline, _) = drifted_pair();
    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&baseline, &MemoryDataset::absent());
    assert_eq!(summary.status, ScanStatus::CurrentMissing);
}

#[test]
fn test_unreadable_dataset_treated_as_missing() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("baseline.csv");
    std::fs::write(&path, "ticker,date\n").unwrap();
    let (_, current) = drifted_pair();

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&crate::data::FileDataset::new(&path), &current);
    assert_eq!(summary.status, ScanStatus::BaselineMissing);
}

#[test]
fn test_bad_schema_without_timestamp() {
    let (baseline, _) = drifted_pair();
    let current = FeatureFrame::from_columns([
        ("ticker", Column::Text(vec![Some("AAPL".into())])),
        ("rsi_14", Column::Numeric(vec![1.0])),
    ])
    .unwrap();

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&baseline, &MemoryDataset::new(current));
    assert_eq!(summary.status, ScanStatus::BadSchema);
}

#[test]
fn test_bad_schema_without_entity() {
    let (baseline, _) = drifted_pair();
    let current = FeatureFrame::from_columns([
        ("date", Column::Timestamp(vec![Some(end_time())])),
        ("rsi_14", Column::Numeric(vec![1.0])),
    ])
    .unwrap();

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&baseline, &MemoryDataset::new(current));
    assert_eq!(summary.status, ScanStatus::BadSchema);
}

#[test]
fn test_no_common_tickers() {
    let baseline = frame(&hourly("AAPL", &normal(100, 0.0, 1.0, 1), end_time()));
    let current = frame(&hourly("TSLA", &normal(100, 0.0, 1.0, 2), end_time()));

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&MemoryDataset::new(baseline), &MemoryDataset::new(current));
    assert_eq!(summary.status, ScanStatus::NoCommonTickers);
}

#[test]
fn test_baseline_without_entity_column_has_no_common_tickers() {
    let baseline =
        FeatureFrame::from_columns([("rsi_14", Column::Numeric(normal(100, 0.0, 1.0, 1)))])
            .unwrap();
    let (_, current) = drifted_pair();

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&MemoryDataset::new(baseline), &current);
    assert_eq!(summary.status, ScanStatus::NoCommonTickers);
}

#[test]
fn test_scan_persists_one_alert_per_drifted_feature() {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let (baseline, current) = drifted_pair();

    let summary = DriftScanOrchestrator::new(settings(), store.clone())
        .with_notifier(notifier.clone())
        .scan(&baseline, &current);

    assert_eq!(summary.status, ScanStatus::Ok);
    assert_eq!(summary.tickers_evaluated, 2);
    assert_eq!(summary.tickers_with_drift, 1);
    assert_eq!(summary.alerts_created, 1);
    assert_eq!(summary.retraining_triggered, 0);
    assert!(summary.retrain_outcomes.is_empty());

    let alerts = store.alerts(None).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].entity_id, "AAPL");
    assert_eq!(alerts[0].feature, "rsi_14");
    assert_eq!(alerts[0].alpha, 0.05);
    assert!(alerts[0].p_value < 0.05);

    let msft = summary.reports.iter().find(|r| r.entity_id == "MSFT").unwrap();
    assert!(!msft.has_drift());
    assert_eq!(notifier.kinds(), vec![NotificationKind::DriftAlert]);
}

#[test]
fn test_reports_sorted_by_entity() {
    let (baseline, current) = drifted_pair();
    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&baseline, &current);
    let ids: Vec<&str> = summary.reports.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["AAPL", "MSFT"]);
}

#[test]
fn test_max_tickers_truncates_sorted() {
    let mut rows = Vec::new();
    for (i, entity) in ["NVDA", "AAPL", "MSFT"].iter().enumerate() {
        rows.extend(hourly(entity, &normal(100, 0.0, 1.0, i as u64), end_time()));
    }
    let data = frame(&rows);

    let summary = DriftScanOrchestrator::new(
        ScanSettings { max_tickers: 2, ..settings() },
        Arc::new(InMemoryStore::new()),
    )
    .scan(&MemoryDataset::new(data.clone()), &MemoryDataset::new(data));

    let ids: Vec<&str> = summary.reports.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["AAPL", "MSFT"]);
    assert_eq!(summary.tickers_with_drift, 0);
}

#[test]
fn test_lookback_relative_to_latest_row() {
    let values = normal(100, 0.0, 1.0, 3);
    let baseline = frame(&hourly("AAPL", &values, end_time()));

    // Shifted rows 90 days before the latest row fall outside a 60-day window
    let shifted: Vec<f64> = values.iter().map(|v| v + 5.0).collect();
    let mut current = hourly("AAPL", &shifted, end_time() - ChronoDuration::days(90));
    current.extend(hourly("AAPL", &values, end_time()));

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&MemoryDataset::new(baseline.clone()), &MemoryDataset::new(frame(&current)));
    assert_eq!(summary.tickers_with_drift, 0);
    assert_eq!(summary.reports[0].per_feature["rsi_14"].current_n, 100);

    let wide = DriftScanOrchestrator::new(
        ScanSettings { lookback_days: 365, ..settings() },
        Arc::new(InMemoryStore::new()),
    )
    .scan(&MemoryDataset::new(baseline), &MemoryDataset::new(frame(&current)));
    assert_eq!(wide.tickers_with_drift, 1);
}

#[test]
fn test_unbounded_lookback_keeps_every_row() {
    let values = normal(100, 0.0, 1.0, 3);
    let baseline = frame(&hourly("AAPL", &values, end_time()));
    let mut current = hourly("AAPL", &values, end_time() - ChronoDuration::days(900));
    current.extend(hourly("AAPL", &values, end_time()));

    let summary = DriftScanOrchestrator::new(
        ScanSettings { lookback_days: u32::MAX, ..settings() },
        Arc::new(InMemoryStore::new()),
    )
    .scan(&MemoryDataset::new(baseline), &MemoryDataset::new(frame(&current)));

    assert_eq!(summary.status, ScanStatus::Ok);
    assert_eq!(summary.reports[0].per_feature["rsi_14"].current_n, 200);
}

#[test]
fn test_entity_only_in_stale_rows_is_not_common() {
    let baseline = frame(&hourly("AAPL", &normal(100, 0.0, 1.0, 1), end_time()));
    let stale_end = end_time() - ChronoDuration::days(120);
    let mut current = hourly("AAPL", &normal(100, 0.0, 1.0, 2), stale_end);
    current.extend(hourly("MSFT", &normal(100, 0.0, 1.0, 3), end_time()));

    let summary = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&MemoryDataset::new(baseline), &MemoryDataset::new(frame(&current)));
    assert_eq!(summary.status, ScanStatus::NoCommonTickers);
}

#[test]
fn test_alert_persistence_failure_keeps_results() {
    let (baseline, current) = drifted_pair();
    let summary =
        DriftScanOrchestrator::new(settings(), Arc::new(FailingAlerts)).scan(&baseline, &current);

    assert_eq!(summary.status, ScanStatus::Ok);
    assert_eq!(summary.alerts_created, 0);
    assert_eq!(summary.tickers_with_drift, 1);
}

#[test]
fn test_parallel_evaluation_matches_sequential() {
    let mut baseline = Vec::new();
    let mut current = Vec::new();
    for i in 0..7u64 {
        let entity = format!("T{i:02}");
        baseline.extend(hourly(&entity, &normal(300, 0.0, 1.0, i), end_time()));
        let shift = if i % 2 == 0 { 1.0 } else { 0.0 };
        current.extend(hourly(&entity, &normal(200, shift, 1.0, 100 + i), end_time()));
    }
    let baseline = MemoryDataset::new(frame(&baseline));
    let current = MemoryDataset::new(frame(&current));

    let sequential = DriftScanOrchestrator::new(settings(), Arc::new(InMemoryStore::new()))
        .scan(&baseline, &current);
    let parallel = DriftScanOrchestrator::new(
        ScanSettings { workers: 3, ..settings() },
        Arc::new(InMemoryStore::new()),
    )
    .scan(&baseline, &current);

    assert_eq!(sequential.reports, parallel.reports);
    assert_eq!(sequential.alerts_created, parallel.alerts_created);
    assert_eq!(parallel.tickers_evaluated, 7);
}

#[test]
fn test_drifted_entities_forwarded_to_coordinator() {
    let store = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let coordinator = Arc::new(RetrainingCoordinator::new(
        Arc::new(AcceptingClient),
        &Stores::from_backend(store.clone()),
        Arc::new(CircuitBreaker::new(5, Duration::from_secs(300))),
        notifier.clone(),
        CoordinatorSettings::default(),
    ));
    let (baseline, current) = drifted_pair();

    let orchestrator = DriftScanOrchestrator::new(settings(), store.clone())
        .with_notifier(notifier.clone())
        .with_coordinator(coordinator);
    let summary = orchestrator.scan(&baseline, &current);

    assert_eq!(summary.retraining_triggered, 1);
    assert_eq!(
        summary.retrain_outcomes.get("AAPL"),
        Some(&RetrainOutcome::Triggered { job_id: "job-AAPL".into() })
    );
    assert!(!summary.retrain_outcomes.contains_key("MSFT"));
    assert_eq!(store.job_count(), 1);
    assert_eq!(
        notifier.kinds(),
        vec![NotificationKind::DriftAlert, NotificationKind::RetrainingConfirmation]
    );

    // Same data again: the pending job rate-limits the second attempt
    let again = orchestrator.scan(&baseline, &current);
    assert!(matches!(
        again.retrain_outcomes.get("AAPL"),
        Some(RetrainOutcome::SkippedRateLimit { .. })
    ));
    assert_eq!(again.retraining_triggered, 0);
    assert_eq!(store.job_count(), 1);
}

#[test]
fn test_summary_serializes_status() {
    let summary = ScanSummary::empty(ScanStatus::NoCommonTickers, 0.5);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["status"], "no_common_tickers");
    assert_eq!(json["alerts_created"], 0);
    assert_eq!(ScanStatus::BaselineMissing.to_string(), "baseline_missing");
}

#[test]
fn test_runtime_from_memory_config() {
    let mut config = crate::config::VigilarConfig::default();
    config.storage.backend = crate::config::StorageBackend::Memory;
    config.retraining.base_url = None;

    let runtime = Runtime::from_config(&config, true).unwrap();
    assert!(runtime.orchestrator.coordinator().is_some());
    assert_eq!(runtime.orchestrator.settings().max_tickers, 50);

    let no_retrain = Runtime::from_config(&config, false).unwrap();
    assert!(no_retrain.orchestrator.coordinator().is_none());
}

#[test]
fn test_runtime_opens_sqlite_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = crate::config::VigilarConfig::default();
    config.storage.path = dir.path().join("nested").join("vigilar.db");

    let runtime = Runtime::from_config(&config, false).unwrap();
    assert!(runtime.stores.alerts.alerts(None).unwrap().is_empty());
    assert!(config.storage.path.exists());
}
