//! Provider passthrough: `/auth/*`.
//!
//! Sign-in and sign-up answer `202 Accepted`; the session transition itself
//! arrives through the provider's event stream, so clients poll `/session`.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use stockroom_core::{
  provider::{Credential, IdentityProvider},
  session::SessionSnapshot,
  store::{OwnershipStore, ProfileStore},
};

use crate::{ApiState, error::ApiError};

/// `POST /auth/sign-in`
pub async fn sign_in<P, S>(
  State(state): State<ApiState<P, S>>,
  Json(credential): Json<Credential>,
) -> Result<StatusCode, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  state.ctx.session.sign_in(&credential).await?;
  Ok(StatusCode::ACCEPTED)
}

/// `POST /auth/sign-up`
pub async fn sign_up<P, S>(
  State(state): State<ApiState<P, S>>,
  Json(credential): Json<Credential>,
) -> Result<StatusCode, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  state.ctx.session.sign_up(&credential).await?;
  Ok(StatusCode::ACCEPTED)
}

/// `POST /auth/sign-out`: the local session is cleared even when the
/// provider call fails, so the snapshot is anonymous in both cases.
pub async fn sign_out<P, S>(
  State(state): State<ApiState<P, S>>,
) -> Result<Json<SessionSnapshot>, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  state.ctx.session.sign_out().await?;
  Ok(Json(state.ctx.session.snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
  pub email: String,
}

/// `POST /auth/reset-password`
pub async fn reset_password<P, S>(
  State(state): State<ApiState<P, S>>,
  Json(body): Json<ResetBody>,
) -> Result<StatusCode, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  if body.email.trim().is_empty() {
    return Err(ApiError::BadRequest("email is required".into()));
  }
  state.ctx.session.reset_password(body.email.trim()).await?;
  Ok(StatusCode::ACCEPTED)
}
