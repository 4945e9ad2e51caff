//! Subject: the opaque identifier of an authenticated principal.
//!
//! The identifier is minted by the external identity provider. Stockroom never
//! inspects its contents; it only compares and stores it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SubjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for SubjectId {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for SubjectId {
  fn from(s: String) -> Self { Self(s) }
}
