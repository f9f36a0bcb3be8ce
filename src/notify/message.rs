//! Structured notification messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eval::drift::{EntityDriftReport, Severity};

/// Drift alerts list at most this many features
pub const MAX_LISTED_FEATURES: usize = 5;

/// The five message kinds the control loop emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    DriftAlert,
    RetrainingConfirmation,
    ApprovalRequest,
    RateLimitNotice,
    ErrorAlert,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::DriftAlert => "drift-alert",
            NotificationKind::RetrainingConfirmation => "retraining-confirmation",
            NotificationKind::ApprovalRequest => "approval-request",
            NotificationKind::RateLimitNotice => "rate-limit-notice",
            NotificationKind::ErrorAlert => "error-alert",
        }
    }

    /// Footer naming the subsystem that sent the message
    pub fn footer(&self) -> &'static str {
        match self {
            NotificationKind::DriftAlert => "Drift Detection System",
            NotificationKind::RetrainingConfirmation => "Auto-Retraining System",
            NotificationKind::ApprovalRequest => "Approval System",
            NotificationKind::RateLimitNotice => "Rate Limiting System",
            NotificationKind::ErrorAlert => "Error Monitoring System",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A titled value shown under the message text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    /// Rendered side by side with the neighbouring short field
    pub short: bool,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self { title: title.into(), value: value.into(), short }
    }
}

/// Channel-agnostic message. Formatting for a specific channel happens in
/// the notifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub entity_id: String,
    pub title: String,
    pub text: String,
    pub severity: Option<Severity>,
    pub fields: Vec<Field>,
    /// Top-level text shown outside the attachment (e.g. a team mention)
    pub preamble: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn utc_label(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

impl Notification {
    /// Drift detected on one entity.
    pub fn drift_alert(report: &EntityDriftReport, at: DateTime<Utc>) -> Self {
        let features = report.drifted_feature_names();
        let mut lines: Vec<String> = features
            .iter()
            .take(MAX_LISTED_FEATURES)
            .map(|name| match report.per_feature.get(name) {
                Some(m) => format!("• *{name}*: p-value={:.4}, psi={:.3}", m.p_value, m.psi),
                None => format!("• *{name}*"),
            })
            .collect();
        if features.len() > MAX_LISTED_FEATURES {
            let hidden = features.len() - MAX_LISTED_FEATURES;
            lines.push(format!("• _...and {hidden} more features_"));
        }

        Self {
            kind: NotificationKind::DriftAlert,
            entity_id: report.entity_id.clone(),
            title: format!("Data Drift Detected: {}", report.entity_id),
            text: format!(
                "*Severity:* {}\n*Affected Features:* {}",
                report.severity,
                features.len()
            ),
            severity: Some(report.severity),
            fields: vec![
                Field::new("Drifted Features", lines.join("\n"), false),
                Field::new("Drift Score", format!("{:.3}", report.avg_drift_score), true),
                Field::new("Detection Time", utc_label(&at), true),
            ],
            preamble: None,
            timestamp: at,
        }
    }

    /// Retraining job accepted by the service.
    pub fn retraining_confirmation(
        entity_id: &str,
        job_id: &str,
        severity: Severity,
        triggered_by: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: NotificationKind::RetrainingConfirmation,
            entity_id: entity_id.to_string(),
            title: format!("Retraining Initiated: {entity_id}"),
            text: format!("Model retraining has been triggered due to {severity} drift."),
            severity: Some(severity),
            fields: vec![
                Field::new("Job ID", format!("`{job_id}`"), true),
                Field::new("Triggered By", triggered_by, true),
                Field::new("Timestamp", utc_label(&at), false),
            ],
            preamble: None,
            timestamp: at,
        }
    }

    /// Entity requires a human to approve retraining.
    pub fn approval_request(
        entity_id: &str,
        severity: Severity,
        features: &[String],
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: NotificationKind::ApprovalRequest,
            entity_id: entity_id.to_string(),
            title: format!("Approval Required: {entity_id}"),
            text: "Drift detected on an entity that requires approval. \
                   Manual approval required for retraining."
                .to_string(),
            severity: Some(severity),
            fields: vec![
                Field::new("Severity", severity.as_str(), true),
                Field::new("Affected Features", features.len().to_string(), true),
                Field::new(
                    "Action Required",
                    format!(
                        "Review drift metrics and trigger retraining manually:\n\
                         `vigilar retrain {entity_id}`"
                    ),
                    false,
                ),
            ],
            preamble: Some("@ml-team Approval Required".to_string()),
            timestamp: at,
        }
    }

    /// Retraining skipped because the entity is still cooling down.
    pub fn rate_limit_notice(
        entity_id: &str,
        last_trigger: Option<DateTime<Utc>>,
        cooldown_hours: f64,
        at: DateTime<Utc>,
    ) -> Self {
        let (last, remaining) = match last_trigger {
            Some(t) => {
                let elapsed = (at - t).num_milliseconds() as f64 / 3_600_000.0;
                (
                    t.format("%Y-%m-%d %H:%M UTC").to_string(),
                    format!("{:.1} hours", (cooldown_hours - elapsed).max(0.0)),
                )
            }
            None => ("unknown".to_string(), "unknown".to_string()),
        };

        Self {
            kind: NotificationKind::RateLimitNotice,
            entity_id: entity_id.to_string(),
            title: format!("Retraining Skipped: {entity_id}"),
            text: "Drift detected, but retraining skipped due to rate limiting.".to_string(),
            severity: None,
            fields: vec![
                Field::new("Last Retrain", last, true),
                Field::new("Cooldown Remaining", remaining, true),
            ],
            preamble: None,
            timestamp: at,
        }
    }

    /// Something failed and an operator should look.
    pub fn error_alert(
        entity_id: &str,
        error_type: &str,
        message: &str,
        context: &[(String, String)],
        at: DateTime<Utc>,
    ) -> Self {
        let context = if context.is_empty() {
            "No additional context".to_string()
        } else {
            context.iter().map(|(k, v)| format!("• {k}: {v}")).collect::<Vec<_>>().join("\n")
        };

        Self {
            kind: NotificationKind::ErrorAlert,
            entity_id: entity_id.to_string(),
            title: format!("Error: {entity_id}"),
            text: format!("*Error Type:* {error_type}\n*Message:* {message}"),
            severity: None,
            fields: vec![
                Field::new("Context", context, false),
                Field::new("Timestamp", utc_label(&at), true),
            ],
            preamble: None,
            timestamp: at,
        }
    }
}
