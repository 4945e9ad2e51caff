//! Handlers for profile mutation.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;
use stockroom_core::{
  profile::{Profile, ProfileUpdate},
  provider::IdentityProvider,
  role::Role,
  store::{OwnershipStore, ProfileStore},
  subject::SubjectId,
};

use crate::{ApiState, error::ApiError};

/// `PATCH /profile`: update the signed-in subject's own profile.
pub async fn update<P, S>(
  State(state): State<ApiState<P, S>>,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  if update.is_empty() {
    return Err(ApiError::BadRequest("nothing to update".into()));
  }
  let profile = state.ctx.session.update_profile(update).await?;
  Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleBody {
  pub role: Role,
}

/// `PUT /profiles/{subject_id}/role`: managers only.
pub async fn assign_role<P, S>(
  State(state): State<ApiState<P, S>>,
  Path(subject_id): Path<SubjectId>,
  Json(body): Json<AssignRoleBody>,
) -> Result<StatusCode, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  state.ctx.session.assign_role(&subject_id, body.role).await?;
  Ok(StatusCode::NO_CONTENT)
}
