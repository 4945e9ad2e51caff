//! Handlers for `/session` endpoints.

use axum::{Json, extract::State};
use stockroom_core::{
  Error,
  provider::IdentityProvider,
  session::SessionSnapshot,
  store::{OwnershipStore, ProfileStore},
};

use crate::{ApiState, error::ApiError};

/// `GET /session`
pub async fn snapshot<P, S>(State(state): State<ApiState<P, S>>) -> Json<SessionSnapshot>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  Json(state.ctx.session.snapshot())
}

/// `POST /session/refresh`: re-resolve the profile (served from the cache
/// while it is fresh) and return the resulting snapshot. A failed lookup shows
/// up as the degraded profile rather than as an error.
pub async fn refresh<P, S>(
  State(state): State<ApiState<P, S>>,
) -> Result<Json<SessionSnapshot>, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  let session = &state.ctx.session;
  session.current_subject().ok_or(Error::Unauthenticated)?;
  session.refresh_profile().await;
  Ok(Json(session.snapshot()))
}
