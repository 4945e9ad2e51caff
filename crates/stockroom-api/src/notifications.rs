//! [`NotificationLog`]: a bounded in-memory notification sink, and the
//! `GET /notifications` handler that reads it.

use std::collections::VecDeque;

use axum::{Json, extract::State};
use parking_lot::Mutex;
use stockroom_core::{
  notify::{Notification, NotificationSink, TracingSink},
  provider::IdentityProvider,
  store::{OwnershipStore, ProfileStore},
};

use crate::ApiState;

/// Keeps the most recent notifications for the front end to display, and
/// logs every one of them.
pub struct NotificationLog {
  entries:  Mutex<VecDeque<Notification>>,
  capacity: usize,
}

impl NotificationLog {
  pub fn new(capacity: usize) -> Self {
    Self { entries: Mutex::new(VecDeque::with_capacity(capacity)), capacity: capacity.max(1) }
  }

  /// Most recent first.
  pub fn recent(&self) -> Vec<Notification> { self.entries.lock().iter().rev().cloned().collect() }

  pub fn len(&self) -> usize { self.entries.lock().len() }

  pub fn is_empty(&self) -> bool { self.entries.lock().is_empty() }
}

impl NotificationSink for NotificationLog {
  fn notify(&self, notification: Notification) {
    TracingSink.notify(notification.clone());
    let mut entries = self.entries.lock();
    if entries.len() == self.capacity {
      entries.pop_front();
    }
    entries.push_back(notification);
  }
}

/// `GET /notifications`
pub async fn recent<P, S>(State(state): State<ApiState<P, S>>) -> Json<Vec<Notification>>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  Json(state.notifications.recent())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn drops_oldest_beyond_capacity() {
    let log = NotificationLog::new(2);
    log.notify(Notification::success("one"));
    log.notify(Notification::failure("two"));
    log.notify(Notification::success("three"));

    let messages: Vec<_> = log.recent().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, ["three", "two"]);
  }

  #[test]
  fn zero_capacity_still_keeps_the_latest() {
    let log = NotificationLog::new(0);
    log.notify(Notification::success("a"));
    log.notify(Notification::success("b"));
    assert_eq!(log.len(), 1);
    assert_eq!(log.recent()[0].message, "b");
  }
}
