//! Slack-compatible webhook notifier.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::message::{Notification, NotificationKind};
use super::Notifier;
use crate::eval::drift::Severity;

/// Attachment colour for a message.
pub fn color(notification: &Notification) -> &'static str {
    match notification.kind {
        NotificationKind::DriftAlert => match notification.severity {
            Some(Severity::Low) => "#36a64f",
            Some(Severity::Medium) => "#ff9900",
            Some(Severity::High) => "#ff6600",
            Some(Severity::Critical) => "#ff0000",
            None => "#808080",
        },
        NotificationKind::RetrainingConfirmation => "#2eb886",
        NotificationKind::ApprovalRequest => "#ff9900",
        NotificationKind::RateLimitNotice => "#808080",
        NotificationKind::ErrorAlert => "#ff0000",
    }
}

/// Render a notification as a Slack attachment payload.
pub fn slack_payload(notification: &Notification) -> Value {
    let fields: Vec<Value> = notification
        .fields
        .iter()
        .map(|f| json!({"title": f.title, "value": f.value, "short": f.short}))
        .collect();

    let mut payload = json!({
        "attachments": [{
            "color": color(notification),
            "title": notification.title,
            "text": notification.text,
            "fields": fields,
            "footer": notification.kind.footer(),
            "ts": notification.timestamp.timestamp(),
        }]
    });
    if let (Some(preamble), Some(obj)) = (&notification.preamble, payload.as_object_mut()) {
        obj.insert("text".to_string(), Value::String(preamble.clone()));
    }
    payload
}

/// Posts notifications to an incoming-webhook URL.
///
/// Disabled (every send returns `false`) when no URL is configured.
pub struct SlackNotifier {
    webhook_url: Option<String>,
    client: reqwest::blocking::Client,
}

impl SlackNotifier {
    pub fn new(
        webhook_url: Option<String>,
        enabled: bool,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("vigilar/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let webhook_url = webhook_url.filter(|u| enabled && !u.is_empty());
        if webhook_url.is_none() {
            warn!("webhook notifications disabled (no webhook URL configured)");
        }
        Ok(Self { webhook_url, client })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl Notifier for SlackNotifier {
    fn send(&self, notification: &Notification) -> bool {
        let Some(url) = &self.webhook_url else {
            debug!(kind = %notification.kind, "notifications disabled, skipping");
            return false;
        };

        let result = self
            .client
            .post(url)
            .json(&slack_payload(notification))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status);

        match result {
            Ok(_) => {
                info!(
                    kind = %notification.kind,
                    entity = %notification.entity_id,
                    "notification sent"
                );
                true
            }
            Err(e) => {
                error!(
                    kind = %notification.kind,
                    entity = %notification.entity_id,
                    error = %e,
                    "failed to send notification"
                );
                false
            }
        }
    }
}
