//! Single-pass drift scan.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use super::types::{ScanSettings, ScanStatus, ScanSummary};
use crate::data::{DatasetSource, FeatureFrame};
use crate::eval::drift::EntityDriftReport;
use crate::notify::{Notification, Notifier, NullNotifier};
use crate::retrain::RetrainingCoordinator;
use crate::storage::{AlertRecord, AlertStore};

/// Rows of one entity in the baseline and current windows
type RowIndex = BTreeMap<String, Vec<usize>>;

/// Compares the baseline window against recent data for every tracked
/// entity, persists alerts and hands drifted entities to the coordinator.
///
/// Holds no state between passes beyond what it writes to the alert store.
pub struct DriftScanOrchestrator {
    settings: ScanSettings,
    alerts: Arc<dyn AlertStore>,
    coordinator: Option<Arc<RetrainingCoordinator>>,
    notifier: Arc<dyn Notifier>,
}

impl DriftScanOrchestrator {
    pub fn new(settings: ScanSettings, alerts: Arc<dyn AlertStore>) -> Self {
        Self { settings, alerts, coordinator: None, notifier: Arc::new(NullNotifier) }
    }

    /// Forward drifted entities to a retraining coordinator
    pub fn with_coordinator(mut self, coordinator: Arc<RetrainingCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Send one drift alert per drifted entity
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn coordinator(&self) -> Option<&RetrainingCoordinator> {
        self.coordinator.as_deref()
    }

    /// Run one pass. Never fails: missing inputs come back as a status.
    pub fn scan(&self, baseline: &dyn DatasetSource, current: &dyn DatasetSource) -> ScanSummary {
        let started = Instant::now();
        let elapsed = || started.elapsed().as_secs_f64();

        let Some(baseline_frame) = load(baseline, "baseline") else {
            return ScanSummary::empty(ScanStatus::BaselineMissing, elapsed());
        };
        let Some(current_frame) = load(current, "current") else {
            return ScanSummary::empty(ScanStatus::CurrentMissing, elapsed());
        };

        let entity_col = self.settings.entity_column.as_str();
        let ts_col = self.settings.timestamp_column.as_str();
        if !current_frame.has_column(entity_col) || !current_frame.has_column(ts_col) {
            warn!(
                source = %current.describe(),
                entity_column = %entity_col,
                timestamp_column = %ts_col,
                "current dataset missing identity columns, skipping drift scan"
            );
            return ScanSummary::empty(ScanStatus::BadSchema, elapsed());
        }

        let lookback = Duration::days(i64::from(self.settings.lookback_days));
        let Some(recent) = current_frame.filter_recent(ts_col, lookback) else {
            warn!(
                source = %current.describe(),
                timestamp_column = %ts_col,
                "timestamp column is not date-like, skipping drift scan"
            );
            return ScanSummary::empty(ScanStatus::BadSchema, elapsed());
        };
        debug!(rows = recent.len(), total = current_frame.len(), "restricted current window");

        let entities = self.common_entities(&baseline_frame, &recent);
        if entities.is_empty() {
            info!("no common entities between baseline and current data");
            return ScanSummary::empty(ScanStatus::NoCommonTickers, elapsed());
        }

        let baseline_rows = baseline_frame.group_rows(entity_col);
        let current_rows = recent.group_rows(entity_col);
        let reports =
            self.evaluate_all(&entities, &baseline_frame, &baseline_rows, &recent, &current_rows);

        let alerts_created = self.persist_alerts(&reports);

        let mut retrain_outcomes = BTreeMap::new();
        for report in reports.iter().filter(|r| r.has_drift()) {
            self.notifier.send(&Notification::drift_alert(report, Utc::now()));
            if let Some(coordinator) = &self.coordinator {
                retrain_outcomes.insert(report.entity_id.clone(), coordinator.handle(report));
            }
        }

        let summary = ScanSummary {
            status: ScanStatus::Ok,
            alerts_created,
            retraining_triggered: retrain_outcomes.values().filter(|o| o.is_triggered()).count(),
            tickers_evaluated: reports.len(),
            tickers_with_drift: reports.iter().filter(|r| r.has_drift()).count(),
            reports,
            retrain_outcomes,
            duration_seconds: elapsed(),
        };
        info!(
            duration_seconds = summary.duration_seconds,
            alerts_created = summary.alerts_created,
            tickers_evaluated = summary.tickers_evaluated,
            tickers_with_drift = summary.tickers_with_drift,
            retraining_triggered = summary.retraining_triggered,
            "drift scan finished"
        );
        summary
    }

    /// Sorted intersection of entity ids, truncated to `max_tickers`.
    fn common_entities(&self, baseline: &FeatureFrame, current: &FeatureFrame) -> Vec<String> {
        let col = self.settings.entity_column.as_str();
        let current_ids = current.entity_ids(col);
        let common: Vec<String> = baseline
            .entity_ids(col)
            .intersection(&current_ids)
            .cloned()
            .collect();

        if common.len() > self.settings.max_tickers {
            info!(
                common = common.len(),
                max_tickers = self.settings.max_tickers,
                "truncating entity list"
            );
        }
        common.into_iter().take(self.settings.max_tickers).collect()
    }

    /// Evaluate every entity, in parallel when `workers > 1`.
    ///
    /// Output is sorted by entity id regardless of worker count.
    fn evaluate_all(
        &self,
        entities: &[String],
        baseline: &FeatureFrame,
        baseline_rows: &RowIndex,
        current: &FeatureFrame,
        current_rows: &RowIndex,
    ) -> Vec<EntityDriftReport> {
        let settings = &self.settings;
        let evaluate = |entity: &String| -> Option<EntityDriftReport> {
            let base = baseline_rows.get(entity).filter(|rows| !rows.is_empty())?;
            let curr = current_rows.get(entity).filter(|rows| !rows.is_empty())?;
            Some(settings.evaluator.evaluate_entity(
                entity,
                &settings.features,
                &baseline.take(base),
                &current.take(curr),
            ))
        };

        let workers = settings.workers.clamp(1, entities.len().max(1));
        if workers == 1 {
            return entities.iter().filter_map(&evaluate).collect();
        }

        let mut reports: Vec<EntityDriftReport> = thread::scope(|scope| {
            let evaluate = &evaluate;
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        entities
                            .iter()
                            .skip(worker)
                            .step_by(workers)
                            .filter_map(evaluate)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        error!("drift evaluation worker panicked, its entities are skipped");
                        Vec::new()
                    })
                })
                .collect()
        });
        reports.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        reports
    }

    /// One batch insert for the whole pass. A failure is logged and the
    /// alerts are lost for this scan.
    fn persist_alerts(&self, reports: &[EntityDriftReport]) -> usize {
        let alpha = self.settings.evaluator.policy().alpha;
        let detected_at = Utc::now();
        let alerts: Vec<AlertRecord> = reports
            .iter()
            .flat_map(|report| {
                report.per_feature.iter().filter(|(_, m)| m.drifted()).map(|(feature, m)| {
                    AlertRecord::from_measurement(&report.entity_id, feature, m, alpha, detected_at)
                })
            })
            .collect();

        if alerts.is_empty() {
            return 0;
        }
        info!(count = alerts.len(), "inserting drift alerts");
        match self.alerts.insert_alerts(&alerts) {
            Ok(()) => alerts.len(),
            Err(e) => {
                error!(count = alerts.len(), error = %e, "failed to persist drift alerts");
                0
            }
        }
    }
}

/// Load a dataset, treating an unreadable one as absent.
fn load(source: &dyn DatasetSource, window: &str) -> Option<FeatureFrame> {
    match source.load() {
        Ok(Some(frame)) => {
            debug!(window, source = %source.describe(), rows = frame.len(), "loaded dataset");
            Some(frame)
        }
        Ok(None) => {
            warn!(window, source = %source.describe(), "dataset not found, skipping drift scan");
            None
        }
        Err(e) => {
            error!(window, source = %source.describe(), error = %e, "failed to read dataset");
            None
        }
    }
}
