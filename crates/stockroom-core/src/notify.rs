//! User-facing notifications and the sink they are delivered to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Success,
  Failure,
}

/// A message meant for the person at the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub level:   Level,
  pub message: String,
}

impl Notification {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: Level::Success, message: message.into() }
  }

  pub fn failure(message: impl Into<String>) -> Self {
    Self { level: Level::Failure, message: message.into() }
  }
}

/// Destination for user-facing notifications (toasts, status bars, logs).
pub trait NotificationSink: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// Sink that only writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
  fn notify(&self, notification: Notification) {
    match notification.level {
      Level::Success => tracing::info!(message = %notification.message, "notification"),
      Level::Failure => tracing::warn!(message = %notification.message, "notification"),
    }
  }
}
