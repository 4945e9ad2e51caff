//! [`SessionContext`]: the process-wide session object.
//!
//! Built once at startup and handed to every consumer by `Arc`. There is no
//! ambient global; [`SessionContext::shutdown`] is the matching teardown.

use std::sync::Arc;

use stockroom_core::{
  notify::NotificationSink,
  provider::IdentityProvider,
  store::{OwnershipStore, ProfileStore},
};

use crate::{
  adoption::OwnershipAdoption,
  config::SessionConfig,
  guard::{GuardPolicy, RouteGuard},
  manager::SessionManager,
};

pub struct SessionContext<P, S> {
  pub session:       Arc<SessionManager<P, S>>,
  pub adoption:      OwnershipAdoption<P, S>,
  pub member_guard:  RouteGuard,
  pub manager_guard: RouteGuard,
}

impl<P, S> SessionContext<P, S>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  /// Wire the components together without starting the session.
  pub fn new(
    provider: Arc<P>,
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    config: SessionConfig,
  ) -> Self {
    let session = SessionManager::new(provider, store.clone(), sink.clone(), &config);
    Self {
      adoption: OwnershipAdoption::new(session.clone(), store, sink),
      member_guard: RouteGuard::member(config.routes.clone()),
      manager_guard: RouteGuard::manager(config.routes),
      session,
    }
  }

  /// Build the context and resolve the existing session.
  pub async fn start(
    provider: Arc<P>,
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    config: SessionConfig,
  ) -> Arc<Self> {
    let ctx = Self::new(provider, store, sink, config);
    ctx.session.start().await;
    Arc::new(ctx)
  }

  pub fn guard(&self, policy: GuardPolicy) -> &RouteGuard {
    match policy {
      GuardPolicy::Member => &self.member_guard,
      GuardPolicy::Manager => &self.manager_guard,
    }
  }

  pub fn shutdown(&self) { self.session.shutdown(); }
}
