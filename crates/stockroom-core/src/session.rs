//! Session states, provider events and the snapshot observed by dependents.

use serde::{Deserialize, Serialize};

use crate::{profile::Profile, role::Role, subject::SubjectId};

// ─── Session state ───────────────────────────────────────────────────────────

/// States of the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "subject_id", rename_all = "snake_case")]
pub enum SessionState {
  /// Torn down, or never started.
  Uninitialized,
  /// Waiting for the identity provider to report the existing session.
  Loading,
  Anonymous,
  Authenticated(SubjectId),
}

impl SessionState {
  pub fn subject(&self) -> Option<&SubjectId> {
    match self {
      Self::Authenticated(id) => Some(id),
      _ => None,
    }
  }

  /// `true` while the session has not resolved to a definite answer.
  pub fn is_pending(&self) -> bool { matches!(self, Self::Uninitialized | Self::Loading) }
}

// ─── Provider events ─────────────────────────────────────────────────────────

/// Kind of session-change notification emitted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
  SignedIn,
  SignedOut,
  TokenRefreshed,
  UserUpdated,
}

/// A session-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
  pub kind:       AuthEventKind,
  pub subject_id: Option<SubjectId>,
}

impl AuthEvent {
  pub fn signed_in(subject_id: impl Into<SubjectId>) -> Self {
    Self { kind: AuthEventKind::SignedIn, subject_id: Some(subject_id.into()) }
  }

  pub fn signed_out() -> Self { Self { kind: AuthEventKind::SignedOut, subject_id: None } }

  pub fn token_refreshed(subject_id: impl Into<SubjectId>) -> Self {
    Self { kind: AuthEventKind::TokenRefreshed, subject_id: Some(subject_id.into()) }
  }

  pub fn user_updated(subject_id: impl Into<SubjectId>) -> Self {
    Self { kind: AuthEventKind::UserUpdated, subject_id: Some(subject_id.into()) }
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// What route guards and the UI observe: the session state together with the
/// profile resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
  pub state:           SessionState,
  pub profile:         Option<Profile>,
  /// `true` between authentication and the first profile resolution.
  pub profile_pending: bool,
}

impl SessionSnapshot {
  pub fn loading() -> Self {
    Self { state: SessionState::Loading, profile: None, profile_pending: false }
  }

  pub fn uninitialized() -> Self {
    Self { state: SessionState::Uninitialized, profile: None, profile_pending: false }
  }

  pub fn anonymous() -> Self {
    Self { state: SessionState::Anonymous, profile: None, profile_pending: false }
  }

  /// Freshly authenticated; the profile is still being resolved.
  pub fn authenticating(subject_id: SubjectId) -> Self {
    Self {
      state:           SessionState::Authenticated(subject_id),
      profile:         None,
      profile_pending: true,
    }
  }

  pub fn subject(&self) -> Option<&SubjectId> { self.state.subject() }

  /// The role in force for admission decisions. Anything unresolved counts as
  /// the most restrictive role.
  pub fn role(&self) -> Role {
    match (&self.state, &self.profile) {
      (SessionState::Authenticated(_), Some(p)) => p.role,
      _ => Role::Intruso,
    }
  }
}
