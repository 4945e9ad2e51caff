//! [`SessionManager`]: owner of the session state machine.
//!
//! The manager is the only writer of the session snapshot. It reacts to the
//! identity provider's events, resolves the profile of the signed-in subject
//! through the [`ProfileCache`], and publishes every transition on a `watch`
//! channel so dependents observe the latest state without polling.
//!
//! ```text
//! loading ──bootstrap──► anonymous ◄──signed_out── authenticated(s)
//!    │                       │                          ▲
//!    └───────bootstrap───────┴──────event(s)────────────┘
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use stockroom_core::{
  Error, Result,
  notify::{Notification, NotificationSink},
  profile::{Profile, ProfileUpdate},
  provider::{Credential, IdentityProvider, ProviderError},
  role::Role,
  session::{AuthEvent, AuthEventKind, SessionSnapshot, SessionState},
  store::ProfileStore,
  subject::SubjectId,
};
use tokio::{
  sync::{broadcast, watch},
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{cache::ProfileCache, config::SessionConfig};

pub struct SessionManager<P, S> {
  provider: Arc<P>,
  store:    Arc<S>,
  sink:     Arc<dyn NotificationSink>,
  cache:    ProfileCache,
  snapshot: watch::Sender<SessionSnapshot>,
  listener: Mutex<Option<JoinHandle<()>>>,
  /// Profile resolution started by the listener, if still running.
  resolver: Mutex<Option<JoinHandle<()>>>,
}

impl<P, S> SessionManager<P, S>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + 'static,
{
  /// Build a manager in the `loading` state. Nothing happens until
  /// [`start`](Self::start) is called.
  pub fn new(
    provider: Arc<P>,
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
    config: &SessionConfig,
  ) -> Arc<Self> {
    let (snapshot, _) = watch::channel(SessionSnapshot::loading());
    Arc::new(Self {
      provider,
      store,
      sink,
      cache: ProfileCache::new(config.profile_ttl),
      snapshot,
      listener: Mutex::new(None),
      resolver: Mutex::new(None),
    })
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// Resolve the existing session and start applying provider events.
  ///
  /// The subscription is taken before the bootstrap query so no event that
  /// races with it is lost.
  pub async fn start(self: &Arc<Self>) {
    let events = self.provider.subscribe();
    self.publish(SessionSnapshot::loading());
    self.bootstrap().await;

    let handle = tokio::spawn(listen(Arc::downgrade(self), events));
    if let Some(previous) = self.listener.lock().replace(handle) {
      previous.abort();
    }
  }

  /// Stop listening, drop every cached profile and return to `uninitialized`.
  pub fn shutdown(&self) {
    if let Some(handle) = self.listener.lock().take() {
      handle.abort();
    }
    if let Some(handle) = self.resolver.lock().take() {
      handle.abort();
    }
    self.cache.clear();
    self.publish(SessionSnapshot::uninitialized());
    info!("session manager stopped");
  }

  async fn bootstrap(&self) {
    match self.provider.current_session().await {
      Ok(Some(subject)) => {
        if self.enter(subject) {
          self.refresh_profile().await;
        }
      }
      Ok(None) => {
        debug!("no existing session");
        self.publish(SessionSnapshot::anonymous());
      }
      Err(e) => {
        warn!(error = %e, "could not query existing session; treating as anonymous");
        self.publish(SessionSnapshot::anonymous());
      }
    }
  }

  // ── Observation ───────────────────────────────────────────────────────────

  pub fn snapshot(&self) -> SessionSnapshot { self.snapshot.borrow().clone() }

  /// Receiver that always yields the latest snapshot.
  pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> { self.snapshot.subscribe() }

  pub fn current_subject(&self) -> Option<SubjectId> { self.snapshot.borrow().subject().cloned() }

  pub fn cache(&self) -> &ProfileCache { &self.cache }

  fn is_current(&self, subject: &SubjectId) -> bool {
    self.snapshot.borrow().subject() == Some(subject)
  }

  fn publish(&self, next: SessionSnapshot) {
    self.snapshot.send_if_modified(|snap| {
      if *snap == next {
        return false;
      }
      *snap = next;
      true
    });
  }

  /// Attach `profile` to the snapshot, but only while `subject` is still the
  /// signed-in subject.
  fn publish_profile(&self, subject: &SubjectId, profile: Profile) {
    self.snapshot.send_if_modified(|snap| {
      if snap.subject() != Some(subject) {
        return false;
      }
      let changed = snap.profile_pending || snap.profile.as_ref() != Some(&profile);
      snap.profile = Some(profile);
      snap.profile_pending = false;
      changed
    });
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// Apply one provider notification, resolving the profile before
  /// returning when the transition calls for it.
  pub async fn handle_event(&self, event: AuthEvent) {
    if self.apply_event(event) {
      self.refresh_profile().await;
    }
  }

  /// Apply the state transition for `event` without touching the store.
  /// Returns `true` when the signed-in subject's profile must be resolved.
  fn apply_event(&self, event: AuthEvent) -> bool {
    debug!(kind = ?event.kind, subject = ?event.subject_id, "session event");

    let purged = self.cache.purge_expired();
    if purged > 0 {
      debug!(purged, "expired profiles dropped");
    }

    let subject = match (event.kind, event.subject_id) {
      (AuthEventKind::SignedOut, _) | (_, None) => {
        self.sign_out_locally();
        return false;
      }
      (_, Some(subject)) => subject,
    };

    if !self.is_current(&subject) {
      self.enter(subject)
    } else if event.kind == AuthEventKind::UserUpdated {
      self.cache.invalidate(&subject);
      true
    } else {
      false
    }
  }

  /// Publish `authenticated(subject)`, dropping the outgoing subject's cache
  /// entry. Returns `true` when no live entry could fill in the profile.
  fn enter(&self, subject: SubjectId) -> bool {
    info!(subject = %subject, "session authenticated");
    if let Some(previous) = self.current_subject().filter(|p| *p != subject) {
      self.cache.invalidate(&previous);
    }
    match self.cache.get(&subject) {
      Some(profile) => {
        self.publish(SessionSnapshot {
          state:           SessionState::Authenticated(subject),
          profile:         Some(profile),
          profile_pending: false,
        });
        false
      }
      None => {
        self.publish(SessionSnapshot::authenticating(subject));
        true
      }
    }
  }

  /// Resolve the profile on its own task so the listener keeps applying
  /// events while the store answers. A newer resolution replaces an older one.
  fn resolve_in_background(self: &Arc<Self>) {
    let manager = Arc::clone(self);
    let handle = tokio::spawn(async move {
      manager.refresh_profile().await;
    });
    if let Some(previous) = self.resolver.lock().replace(handle) {
      previous.abort();
    }
  }

  fn sign_out_locally(&self) {
    self.cache.clear();
    if self.snapshot.borrow().state != SessionState::Anonymous {
      info!("session signed out");
    }
    self.publish(SessionSnapshot::anonymous());
  }

  // ── Profile ───────────────────────────────────────────────────────────────

  /// Resolve the signed-in subject's profile, cache first.
  ///
  /// Returns `None` when nobody is signed in, when the lookup failed (the
  /// snapshot then carries [`Profile::degraded`]), or when the session moved
  /// to another subject while the lookup was in flight. A result read before
  /// an invalidation is neither cached nor published; the snapshot's profile
  /// is returned instead.
  pub async fn refresh_profile(&self) -> Option<Profile> {
    let subject = self.current_subject()?;

    if let Some(profile) = self.cache.get(&subject) {
      debug!(subject = %subject, "profile cache hit");
      self.publish_profile(&subject, profile.clone());
      return Some(profile);
    }

    debug!(subject = %subject, "profile cache miss");
    let generation = self.cache.generation(&subject);
    let looked_up = self.lookup(&subject).await;

    if !self.is_current(&subject) {
      debug!(subject = %subject, "discarding profile of a stale session");
      return None;
    }

    match looked_up {
      Ok(profile) => {
        if !self.cache.insert_at(subject.clone(), profile.clone(), generation) {
          debug!(subject = %subject, "discarding profile read before invalidation");
          let current = self.snapshot.borrow().profile.clone();
          return current;
        }
        self.publish_profile(&subject, profile.clone());
        Some(profile)
      }
      Err(e) => {
        warn!(subject = %subject, error = %e, "profile lookup failed");
        if self.cache.generation(&subject) == generation {
          self.publish_profile(&subject, Profile::degraded(subject.clone()));
        }
        None
      }
    }
  }

  /// The role in force for the signed-in subject, or `None` when anonymous.
  /// A profile that cannot be resolved counts as `intruso`.
  pub async fn resolved_role(&self) -> Option<Role> {
    self.current_subject()?;
    Some(self.refresh_profile().await.map_or(Role::Intruso, |p| p.role))
  }

  async fn lookup(&self, subject: &SubjectId) -> Result<Profile> {
    let found = self
      .store
      .fetch_profile(subject)
      .await
      .map_err(|e| Error::LookupFailed(e.to_string()))?;

    match found {
      Some(profile) => Ok(profile),
      None => {
        info!(subject = %subject, "creating profile on first lookup");
        self
          .store
          .create_profile(Profile::initial(subject.clone()))
          .await
          .map_err(|e| Error::LookupFailed(e.to_string()))
      }
    }
  }

  /// Edit the signed-in subject's own profile.
  ///
  /// Changing the role requires `gerente`. The update is written through to
  /// the store, merged into the snapshot and the cache entry is invalidated.
  pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
    let subject = self.current_subject().ok_or(Error::Unauthenticated)?;
    if update.role.is_some() {
      self.require(Role::Gerente).await?;
    }

    self.store.update_profile(&subject, &update).await.map_err(Error::store)?;
    self.cache.invalidate(&subject);
    info!(subject = %subject, "profile updated");

    match self.merge_into_snapshot(&subject, &update) {
      Some(merged) => Ok(merged),
      None => self
        .refresh_profile()
        .await
        .ok_or_else(|| Error::LookupFailed(format!("profile of {subject} unavailable after update"))),
    }
  }

  /// Assign `role` to another subject's profile. Requires `gerente`.
  pub async fn assign_role(&self, target: &SubjectId, role: Role) -> Result<()> {
    self.require(Role::Gerente).await?;

    let update = ProfileUpdate { display_name: None, role: Some(role) };
    self.store.update_profile(target, &update).await.map_err(Error::store)?;
    self.cache.invalidate(target);
    self.merge_into_snapshot(target, &update);
    info!(subject = %target, %role, "role assigned");
    Ok(())
  }

  fn merge_into_snapshot(&self, subject: &SubjectId, update: &ProfileUpdate) -> Option<Profile> {
    let mut merged = None;
    self.snapshot.send_if_modified(|snap| {
      if snap.subject() != Some(subject) {
        return false;
      }
      match snap.profile.as_mut() {
        Some(profile) => {
          profile.merge(update);
          merged = Some(profile.clone());
          true
        }
        None => false,
      }
    });
    merged
  }

  async fn require(&self, required: Role) -> Result<()> {
    let held = self.resolved_role().await.ok_or(Error::Unauthenticated)?;
    if held.satisfies(required) {
      Ok(())
    } else {
      Err(Error::Forbidden { held, required })
    }
  }

  // ── Provider passthrough ──────────────────────────────────────────────────

  /// The resulting transition arrives as a provider event.
  pub async fn sign_in(&self, credential: &Credential) -> Result<()> {
    self.provider.sign_in(credential).await.map_err(|e| self.provider_failure(e))
  }

  pub async fn sign_up(&self, credential: &Credential) -> Result<()> {
    self.provider.sign_up(credential).await.map_err(|e| self.provider_failure(e))
  }

  /// Sign out with the provider. The local session is cleared even if the
  /// provider call fails.
  pub async fn sign_out(&self) -> Result<()> {
    let result = self.provider.sign_out().await;
    self.sign_out_locally();
    result.map_err(|e| self.provider_failure(e))
  }

  pub async fn reset_password(&self, identifier: &str) -> Result<()> {
    self
      .provider
      .reset_password(identifier)
      .await
      .map_err(|e| self.provider_failure(e))?;
    self.sink.notify(Notification::success("Password reset instructions sent"));
    Ok(())
  }

  fn provider_failure(&self, e: ProviderError) -> Error {
    warn!(error = %e, "identity provider rejected request");
    self.sink.notify(Notification::failure(e.message.clone()));
    Error::Provider(e)
  }
}

/// Listener loop: applies provider events until the channel closes or the
/// manager is dropped. Transitions are applied as events arrive; profile
/// lookups run beside the loop and never hold it up.
async fn listen<P, S>(manager: Weak<SessionManager<P, S>>, mut events: broadcast::Receiver<AuthEvent>)
where
  P: IdentityProvider + 'static,
  S: ProfileStore + 'static,
{
  loop {
    let received = events.recv().await;
    let Some(manager) = manager.upgrade() else { break };
    let resolve = match received {
      Ok(event) => manager.apply_event(event),
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        warn!(skipped, "session events dropped; re-reading current session");
        manager.resync().await
      }
      Err(broadcast::error::RecvError::Closed) => break,
    };
    if resolve {
      manager.resolve_in_background();
    }
  }
  debug!("session listener finished");
}

impl<P, S> SessionManager<P, S>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + 'static,
{
  /// Re-read the provider's current session after missed events. Returns
  /// `true` when the profile must be resolved.
  async fn resync(&self) -> bool {
    match self.provider.current_session().await {
      Ok(Some(subject)) => !self.is_current(&subject) && self.enter(subject),
      Ok(None) => {
        self.sign_out_locally();
        false
      }
      Err(e) => {
        warn!(error = %e, "resync failed; keeping current session");
        false
      }
    }
  }
}
