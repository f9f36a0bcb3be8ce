//! Operator notifications.
//!
//! Messages are built as [`Notification`] values and handed to a
//! [`Notifier`]. Delivery failures are logged by the notifier and reported
//! as `false`; they never propagate.

mod message;
mod slack;

#[cfg(test)]
mod tests;

use std::sync::{Mutex, PoisonError};

pub use message::{Field, Notification, NotificationKind, MAX_LISTED_FEATURES};
pub use slack::{color, slack_payload, SlackNotifier};

/// A notification channel
pub trait Notifier: Send + Sync {
    /// Deliver one message; `true` on success
    fn send(&self, notification: &Notification) -> bool;
}

/// Drops every message (no channel configured)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, _notification: &Notification) -> bool {
        false
    }
}

/// Keeps every message in memory; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent().iter().map(|n| n.kind).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: &Notification) -> bool {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(notification.clone());
        true
    }
}
