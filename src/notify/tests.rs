//! Tests for notifications

use super::*;
use crate::eval::drift::{DriftMeasurement, EntityDriftReport, Severity};
use crate::test_support::serve;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

fn measurement(p: f64) -> DriftMeasurement {
    DriftMeasurement {
        statistic: 0.4,
        p_value: p,
        psi: 0.5,
        drift_score: 0.9,
        severity_contributing: true,
        severity: Severity::Critical,
        baseline_n: 2000,
        current_n: 500,
    }
}

fn report(n_features: usize) -> EntityDriftReport {
    let per_feature: BTreeMap<String, DriftMeasurement> =
        (0..n_features).map(|i| (format!("f{i}"), measurement(0.001))).collect();
    EntityDriftReport {
        entity_id: "AAPL".into(),
        drifted_features: per_feature.keys().cloned().collect::<BTreeSet<_>>(),
        avg_drift_score: 0.9,
        severity: Severity::Critical,
        per_feature,
    }
}

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

#[test]
fn test_drift_alert_lists_at_most_five_features() {
    let n = Notification::drift_alert(&report(7), at());
    assert_eq!(n.kind, NotificationKind::DriftAlert);
    assert_eq!(n.severity, Some(Severity::Critical));
    let listed = &n.fields[0].value;
    assert_eq!(listed.lines().count(), 6);
    assert!(listed.contains("...and 2 more features"));
    assert!(listed.contains("p-value=0.0010"));
    assert!(n.text.contains("*Affected Features:* 7"));
}

#[test]
fn test_drift_alert_short_list() {
    let n = Notification::drift_alert(&report(2), at());
    assert_eq!(n.fields[0].value.lines().count(), 2);
    assert!(!n.fields[0].value.contains("more features"));
}

#[test]
fn test_approval_request_has_mention_and_action() {
    let n = Notification::approval_request("TSLA", Severity::High, &["a".into(), "b".into()], at());
    assert_eq!(n.preamble.as_deref(), Some("@ml-team Approval Required"));
    assert!(n.fields.iter().any(|f| f.value.contains("vigilar retrain TSLA")));

    let payload = slack_payload(&n);
    assert_eq!(payload["text"], "@ml-team Approval Required");
    assert_eq!(payload["attachments"][0]["color"], "#ff9900");
}

#[test]
fn test_rate_limit_notice_cooldown_remaining() {
    let last = at() - chrono::Duration::hours(2);
    let n = Notification::rate_limit_notice("MSFT", Some(last), 6.0, at());
    assert_eq!(n.fields[1].value, "4.0 hours");
    assert_eq!(n.fields[0].value, "2024-06-01 07:30 UTC");
}

#[test]
fn test_error_alert_context() {
    let n = Notification::error_alert("MSFT", "RETRAIN_FAILED", "boom", &[], at());
    assert_eq!(n.fields[0].value, "No additional context");

    let ctx = vec![("severity".to_string(), "HIGH".to_string())];
    let n = Notification::error_alert("MSFT", "RETRAIN_FAILED", "boom", &ctx, at());
    assert_eq!(n.fields[0].value, "• severity: HIGH");
    assert!(n.text.contains("RETRAIN_FAILED"));
}

#[test]
fn test_slack_payload_shape() {
    let n = Notification::retraining_confirmation(
        "AAPL",
        "job-9",
        Severity::High,
        "auto_drift_system",
        at(),
    );
    let payload = slack_payload(&n);
    let attachment = &payload["attachments"][0];
    assert_eq!(attachment["color"], "#2eb886");
    assert_eq!(attachment["footer"], "Auto-Retraining System");
    assert_eq!(attachment["ts"], at().timestamp());
    assert_eq!(attachment["fields"][0]["value"], "`job-9`");
    assert!(payload.get("text").is_none());
}

#[test]
fn test_drift_colors_follow_severity() {
    let mut r = report(1);
    r.severity = Severity::Low;
    assert_eq!(color(&Notification::drift_alert(&r, at())), "#36a64f");
    r.severity = Severity::High;
    assert_eq!(color(&Notification::drift_alert(&r, at())), "#ff6600");
}

#[test]
fn test_kind_serializes_kebab_case() {
    let json = serde_json::to_string(&NotificationKind::RateLimitNotice).unwrap();
    assert_eq!(json, "\"rate-limit-notice\"");
}

#[test]
fn test_slack_notifier_disabled_without_url() {
    let notifier = SlackNotifier::new(None, true, Duration::from_secs(1)).unwrap();
    assert!(!notifier.is_enabled());
    assert!(!notifier.send(&Notification::drift_alert(&report(1), at())));

    let notifier =
        SlackNotifier::new(Some("http://127.0.0.1:9".into()), false, Duration::from_secs(1))
            .unwrap();
    assert!(!notifier.is_enabled());
}

#[test]
fn test_slack_notifier_posts_payload() {
    let (url, server) = serve(vec![(200, "ok".to_string())]);
    let notifier = SlackNotifier::new(Some(url), true, Duration::from_secs(5)).unwrap();
    assert!(notifier.send(&Notification::drift_alert(&report(1), at())));

    let requests = server.join().unwrap();
    assert!(requests[0].head.starts_with("POST / "));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["attachments"][0]["title"], "Data Drift Detected: AAPL");
}

#[test]
fn test_slack_notifier_reports_http_failure() {
    let (url, server) = serve(vec![(500, "{}".to_string())]);
    let notifier = SlackNotifier::new(Some(url), true, Duration::from_secs(5)).unwrap();
    assert!(!notifier.send(&Notification::drift_alert(&report(1), at())));
    server.join().unwrap();
}

#[test]
fn test_memory_and_null_notifiers() {
    let memory = MemoryNotifier::new();
    assert!(memory.send(&Notification::drift_alert(&report(1), at())));
    assert_eq!(memory.kinds(), vec![NotificationKind::DriftAlert]);
    assert!(!NullNotifier.send(&Notification::drift_alert(&report(1), at())));
}
