//! Handlers for `/records/{kind}` endpoints.
//!
//! `kind` is one of `asset`, `category`, `supplier`, `location`, `customer`.

use axum::{
  Json,
  extract::{Path, State},
};
use stockroom_core::{
  provider::IdentityProvider,
  record::{RecordKind, RecordOwnership},
  store::{OwnershipStore, ProfileStore},
};

use crate::{ApiState, error::ApiError};

/// `GET /records/{kind}/orphaned`
pub async fn orphaned<P, S>(
  State(state): State<ApiState<P, S>>,
  Path(kind): Path<RecordKind>,
) -> Result<Json<Vec<RecordOwnership>>, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  let records = state.ctx.adoption.orphaned(kind).await?;
  Ok(Json(records))
}

/// `POST /records/{kind}/{id}/adopt`
pub async fn adopt<P, S>(
  State(state): State<ApiState<P, S>>,
  Path((kind, id)): Path<(RecordKind, String)>,
) -> Result<Json<RecordOwnership>, ApiError>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  let record = state.ctx.adoption.adopt(kind, &id).await?;
  Ok(Json(record))
}
