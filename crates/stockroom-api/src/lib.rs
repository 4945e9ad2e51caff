//! JSON HTTP surface for the Stockroom session.
//!
//! Exposes an axum [`Router`] over a shared [`SessionContext`]. The process
//! holds exactly one session, so there is no per-request authentication: the
//! routes drive and observe that session on behalf of the local front end.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/session` | Current snapshot |
//! | `POST`  | `/session/refresh` | Re-resolve the profile |
//! | `PATCH` | `/profile` | Body: `{"display_name":"…","role":"membro"}` |
//! | `PUT`   | `/profiles/{subject_id}/role` | Body: `{"role":"gerente"}` |
//! | `GET`   | `/guard/{policy}?path=` | `policy` is `member` or `manager` |
//! | `GET`   | `/records/{kind}/orphaned` | Adoptable records |
//! | `POST`  | `/records/{kind}/{id}/adopt` | 409 if already owned |
//! | `POST`  | `/auth/sign-in`, `/auth/sign-up` | Body: `{"email":…,"password":…}` |
//! | `POST`  | `/auth/sign-out` | |
//! | `POST`  | `/auth/reset-password` | Body: `{"email":…}` |
//! | `GET`   | `/notifications` | Most recent first |

pub mod auth;
pub mod error;
pub mod guard;
pub mod notifications;
pub mod profile;
pub mod provider;
pub mod records;
pub mod session;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use serde::Deserialize;
use stockroom_core::{
  provider::IdentityProvider,
  store::{OwnershipStore, ProfileStore},
};
use stockroom_session::{GuardRoutes, SessionConfig, SessionContext};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use notifications::NotificationLog;
pub use provider::HttpIdentityProvider;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STOCKROOM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Base URL of the identity provider's REST API.
  pub auth_url:              String,
  pub auth_api_key:          String,
  #[serde(default = "default_profile_ttl_secs")]
  pub profile_ttl_secs:      u64,
  #[serde(default = "default_notification_capacity")]
  pub notification_capacity: usize,
  #[serde(default)]
  pub routes:                GuardRoutes,
}

fn default_profile_ttl_secs() -> u64 { 300 }

fn default_notification_capacity() -> usize { 50 }

impl ServerConfig {
  pub fn session_config(&self) -> SessionConfig {
    SessionConfig {
      profile_ttl: Duration::from_secs(self.profile_ttl_secs),
      routes:      self.routes.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct ApiState<P, S> {
  pub ctx:           Arc<SessionContext<P, S>>,
  pub notifications: Arc<NotificationLog>,
}

impl<P, S> Clone for ApiState<P, S> {
  fn clone(&self) -> Self {
    Self { ctx: self.ctx.clone(), notifications: self.notifications.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn api_router<P, S>(state: ApiState<P, S>) -> Router<()>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  Router::new()
    // Session
    .route("/session", get(session::snapshot::<P, S>))
    .route("/session/refresh", post(session::refresh::<P, S>))
    // Profiles
    .route("/profile", patch(profile::update::<P, S>))
    .route("/profiles/{subject_id}/role", put(profile::assign_role::<P, S>))
    // Guards
    .route("/guard/{policy}", get(guard::evaluate::<P, S>))
    // Records
    .route("/records/{kind}/orphaned", get(records::orphaned::<P, S>))
    .route("/records/{kind}/{id}/adopt", post(records::adopt::<P, S>))
    // Provider passthrough
    .route("/auth/sign-in", post(auth::sign_in::<P, S>))
    .route("/auth/sign-up", post(auth::sign_up::<P, S>))
    .route("/auth/sign-out", post(auth::sign_out::<P, S>))
    .route("/auth/reset-password", post(auth::reset_password::<P, S>))
    // Notifications
    .route("/notifications", get(notifications::recent::<P, S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
