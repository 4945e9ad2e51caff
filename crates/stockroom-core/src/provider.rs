//! The `IdentityProvider` trait: the narrow interface to the external
//! authentication service.
//!
//! The provider issues and validates credentials and tells Stockroom who is
//! signed in. Stockroom never stores credentials; it only forwards them.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::{session::AuthEvent, subject::SubjectId};

/// Credentials forwarded verbatim to the provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
  pub email:    String,
  pub password: String,
}

impl std::fmt::Debug for Credential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credential")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// A provider failure carrying the provider's human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
  pub message: String,
}

impl ProviderError {
  pub fn new(message: impl Into<String>) -> Self { Self { message: message.into() } }
}

/// Abstraction over the external identity provider.
///
/// All methods return `Send` futures so the session listener can run on a
/// multi-threaded runtime.
pub trait IdentityProvider: Send + Sync {
  /// The subject of the session that already exists at startup, if any.
  fn current_session(
    &self,
  ) -> impl Future<Output = Result<Option<SubjectId>, ProviderError>> + Send + '_;

  /// Session-change notifications for as long as the receiver is held.
  fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

  fn sign_in<'a>(
    &'a self,
    credential: &'a Credential,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + 'a;

  fn sign_up<'a>(
    &'a self,
    credential: &'a Credential,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + 'a;

  fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send + '_;

  /// Ask the provider to start its password-reset flow for `identifier`.
  fn reset_password<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + 'a;
}
