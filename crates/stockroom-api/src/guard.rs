//! Handler for `GET /guard/{policy}?path=`.
//!
//! Evaluates a route guard against the live snapshot so a front end can ask
//! whether to render, wait, or navigate before it draws a protected screen.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use stockroom_core::{
  provider::IdentityProvider,
  store::{OwnershipStore, ProfileStore},
};
use stockroom_session::{GuardOutcome, GuardPolicy};

use crate::ApiState;

#[derive(Debug, Deserialize)]
pub struct GuardParams {
  pub path: String,
}

#[derive(Debug, Serialize)]
pub struct GuardResponse {
  #[serde(flatten)]
  pub outcome:  GuardOutcome,
  /// Ready-to-use redirect URL when the decision is a redirect.
  pub location: Option<String>,
}

/// `GET /guard/{policy}?path=<location>`
pub async fn evaluate<P, S>(
  State(state): State<ApiState<P, S>>,
  Path(policy): Path<GuardPolicy>,
  Query(params): Query<GuardParams>,
) -> Json<GuardResponse>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  let snapshot = state.ctx.session.snapshot();
  let outcome = state.ctx.guard(policy).evaluate(&snapshot, &params.path);
  let location = outcome.redirect_target().map(|r| r.location());
  Json(GuardResponse { outcome, location })
}
