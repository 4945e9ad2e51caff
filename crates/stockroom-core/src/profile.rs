//! Profile: the role and display metadata attached to a subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{role::Role, subject::SubjectId};

/// Display name used when a profile could not be resolved.
pub const UNKNOWN_DISPLAY_NAME: &str = "unknown";

/// One profile per subject. Created lazily on the first lookup that finds
/// none; mutated only through explicit profile-edit operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub subject_id:   SubjectId,
  pub display_name: String,
  pub role:         Role,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Profile {
  /// The profile created for a subject seen for the first time: lowest role,
  /// display name derived from the subject id.
  pub fn initial(subject_id: SubjectId) -> Self {
    let now = Utc::now();
    Self {
      display_name: subject_id.to_string(),
      subject_id,
      role: Role::Intruso,
      created_at: now,
      updated_at: now,
    }
  }

  /// Placeholder surfaced when the lookup failed. Never cached or persisted.
  pub fn degraded(subject_id: SubjectId) -> Self {
    Self {
      display_name: UNKNOWN_DISPLAY_NAME.to_owned(),
      ..Self::initial(subject_id)
    }
  }

  /// Apply a partial update in place, bumping `updated_at`.
  pub fn merge(&mut self, update: &ProfileUpdate) {
    if let Some(name) = &update.display_name {
      self.display_name.clone_from(name);
    }
    if let Some(role) = update.role {
      self.role = role;
    }
    self.updated_at = Utc::now();
  }
}

/// Partial profile accepted by [`crate::store::ProfileStore::update_profile`].
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  pub display_name: Option<String>,
  pub role:         Option<Role>,
}

impl ProfileUpdate {
  pub fn is_empty(&self) -> bool { self.display_name.is_none() && self.role.is_none() }
}
