//! Library-level configuration for the session subsystem.

use std::time::Duration;

use crate::{cache::DEFAULT_TTL, guard::GuardRoutes};

#[derive(Debug, Clone)]
pub struct SessionConfig {
  /// How long a resolved profile is served from the cache.
  pub profile_ttl: Duration,
  pub routes:      GuardRoutes,
}

impl Default for SessionConfig {
  fn default() -> Self { Self { profile_ttl: DEFAULT_TTL, routes: GuardRoutes::default() } }
}
