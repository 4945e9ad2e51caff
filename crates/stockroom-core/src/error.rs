//! Error types for `stockroom-core`.

use thiserror::Error;

use crate::{provider::ProviderError, record::RecordKind, role::Role};

#[derive(Debug, Error)]
pub enum Error {
  #[error("not signed in")]
  Unauthenticated,

  #[error("role {held} does not satisfy required role {required}")]
  Forbidden { held: Role, required: Role },

  #[error("profile lookup failed: {0}")]
  LookupFailed(String),

  #[error("{kind} {record_id} already has an owner")]
  AdoptionConflict { kind: RecordKind, record_id: String },

  #[error("{kind} {record_id} not found")]
  RecordNotFound { kind: RecordKind, record_id: String },

  #[error(transparent)]
  Provider(#[from] ProviderError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
