//! Behavioural tests for the session subsystem against in-memory doubles.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
  time::Duration,
};

use parking_lot::Mutex;
use stockroom_core::{
  Error,
  notify::{Level, Notification, NotificationSink},
  profile::{Profile, ProfileUpdate, UNKNOWN_DISPLAY_NAME},
  provider::{Credential, IdentityProvider, ProviderError},
  record::{AdoptOutcome, RecordKind, RecordOwnership},
  role::Role,
  session::{AuthEvent, SessionState},
  store::{OwnershipStore, ProfileStore},
  subject::SubjectId,
};
use tokio::sync::{Notify, broadcast};

use crate::{SessionConfig, SessionContext, SessionManager, guard::GuardState};

// ─── Doubles ─────────────────────────────────────────────────────────────────

struct FakeProvider {
  events:          broadcast::Sender<AuthEvent>,
  current:         Mutex<Option<SubjectId>>,
  fail_bootstrap:  AtomicBool,
  reject_with:     Mutex<Option<String>>,
  session_queries: AtomicUsize,
}

impl FakeProvider {
  fn new(current: Option<&str>) -> Arc<Self> { Self::with_capacity(current, 16) }

  fn with_capacity(current: Option<&str>, capacity: usize) -> Arc<Self> {
    let (events, _) = broadcast::channel(capacity);
    Arc::new(Self {
      events,
      current: Mutex::new(current.map(SubjectId::new)),
      fail_bootstrap: AtomicBool::new(false),
      reject_with: Mutex::new(None),
      session_queries: AtomicUsize::new(0),
    })
  }

  fn emit(&self, event: AuthEvent) { let _ = self.events.send(event); }

  fn rejection(&self) -> Result<(), ProviderError> {
    match self.reject_with.lock().clone() {
      Some(message) => Err(ProviderError::new(message)),
      None => Ok(()),
    }
  }
}

impl IdentityProvider for FakeProvider {
  async fn current_session(&self) -> Result<Option<SubjectId>, ProviderError> {
    self.session_queries.fetch_add(1, Ordering::SeqCst);
    if self.fail_bootstrap.load(Ordering::SeqCst) {
      return Err(ProviderError::new("provider unreachable"));
    }
    Ok(self.current.lock().clone())
  }

  fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

  async fn sign_in(&self, credential: &Credential) -> Result<(), ProviderError> {
    self.rejection()?;
    let subject = SubjectId::new(credential.email.clone());
    *self.current.lock() = Some(subject.clone());
    self.emit(AuthEvent::signed_in(subject));
    Ok(())
  }

  async fn sign_up(&self, credential: &Credential) -> Result<(), ProviderError> {
    self.sign_in(credential).await
  }

  async fn sign_out(&self) -> Result<(), ProviderError> {
    self.rejection()?;
    *self.current.lock() = None;
    self.emit(AuthEvent::signed_out());
    Ok(())
  }

  async fn reset_password(&self, _identifier: &str) -> Result<(), ProviderError> { self.rejection() }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeStoreError(String);

#[derive(Default)]
struct MemoryStore {
  profiles:   Mutex<HashMap<SubjectId, Profile>>,
  records:    Mutex<HashMap<(RecordKind, String), RecordOwnership>>,
  fetches:    AtomicUsize,
  fail_fetch: AtomicBool,
  gates:      Mutex<HashMap<SubjectId, Arc<Notify>>>,
}

impl MemoryStore {
  fn with_profile(self, id: &str, role: Role) -> Self {
    let profile = Profile { role, ..Profile::initial(SubjectId::new(id)) };
    self.profiles.lock().insert(profile.subject_id.clone(), profile);
    self
  }

  fn with_record(self, kind: RecordKind, id: &str, owner: Option<&str>) -> Self {
    let record = RecordOwnership {
      kind,
      record_id: id.to_owned(),
      name: format!("{kind} {id}"),
      owner_id: owner.map(SubjectId::new),
    };
    self.records.lock().insert((kind, id.to_owned()), record);
    self
  }

  /// Hold the next fetch for `id` after it has read the row, until the
  /// returned gate is notified.
  fn block(&self, id: &str) -> Arc<Notify> {
    let gate = Arc::new(Notify::new());
    self.gates.lock().insert(SubjectId::new(id), gate.clone());
    gate
  }

  fn owner(&self, kind: RecordKind, id: &str) -> Option<SubjectId> {
    self.records.lock().get(&(kind, id.to_owned())).and_then(|r| r.owner_id.clone())
  }

  fn fetches(&self) -> usize { self.fetches.load(Ordering::SeqCst) }
}

impl ProfileStore for MemoryStore {
  type Error = FakeStoreError;

  async fn fetch_profile(&self, subject_id: &SubjectId) -> Result<Option<Profile>, FakeStoreError> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    if self.fail_fetch.load(Ordering::SeqCst) {
      return Err(FakeStoreError("connection reset".into()));
    }
    let row = self.profiles.lock().get(subject_id).cloned();
    let gate = self.gates.lock().remove(subject_id);
    if let Some(gate) = gate {
      gate.notified().await;
    }
    Ok(row)
  }

  async fn create_profile(&self, profile: Profile) -> Result<Profile, FakeStoreError> {
    let mut profiles = self.profiles.lock();
    Ok(profiles.entry(profile.subject_id.clone()).or_insert(profile).clone())
  }

  async fn update_profile(
    &self,
    subject_id: &SubjectId,
    update: &ProfileUpdate,
  ) -> Result<(), FakeStoreError> {
    let mut profiles = self.profiles.lock();
    let profile = profiles
      .get_mut(subject_id)
      .ok_or_else(|| FakeStoreError(format!("no profile for {subject_id}")))?;
    profile.merge(update);
    Ok(())
  }
}

impl OwnershipStore for MemoryStore {
  type Error = FakeStoreError;

  async fn conditional_adopt(
    &self,
    kind: RecordKind,
    record_id: &str,
    subject_id: &SubjectId,
  ) -> Result<AdoptOutcome, FakeStoreError> {
    let mut records = self.records.lock();
    let Some(record) = records.get_mut(&(kind, record_id.to_owned())) else {
      return Ok(AdoptOutcome::NotFound);
    };
    if let Some(owner_id) = &record.owner_id {
      return Ok(AdoptOutcome::AlreadyOwned { owner_id: owner_id.clone() });
    }
    record.owner_id = Some(subject_id.clone());
    Ok(AdoptOutcome::Adopted(record.clone()))
  }

  async fn get_record(
    &self,
    kind: RecordKind,
    record_id: &str,
  ) -> Result<Option<RecordOwnership>, FakeStoreError> {
    Ok(self.records.lock().get(&(kind, record_id.to_owned())).cloned())
  }

  async fn list_orphaned(&self, kind: RecordKind) -> Result<Vec<RecordOwnership>, FakeStoreError> {
    Ok(
      self
        .records
        .lock()
        .values()
        .filter(|r| r.kind == kind && r.is_orphaned())
        .cloned()
        .collect(),
    )
  }
}

#[derive(Default)]
struct CollectingSink(Mutex<Vec<Notification>>);

impl CollectingSink {
  fn last(&self) -> Option<Notification> { self.0.lock().last().cloned() }
}

impl NotificationSink for CollectingSink {
  fn notify(&self, notification: Notification) { self.0.lock().push(notification); }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

type Manager = SessionManager<FakeProvider, MemoryStore>;

struct Harness {
  provider: Arc<FakeProvider>,
  store:    Arc<MemoryStore>,
  sink:     Arc<CollectingSink>,
  ctx:      Arc<SessionContext<FakeProvider, MemoryStore>>,
}

impl Harness {
  async fn start(current: Option<&str>, store: MemoryStore) -> Self {
    Self::start_with(FakeProvider::new(current), store).await
  }

  async fn start_with(provider: Arc<FakeProvider>, store: MemoryStore) -> Self {
    let store = Arc::new(store);
    let sink = Arc::new(CollectingSink::default());
    let ctx = SessionContext::start(
      provider.clone(),
      store.clone(),
      sink.clone(),
      SessionConfig::default(),
    )
    .await;
    Self { provider, store, sink, ctx }
  }

  fn session(&self) -> &Arc<Manager> { &self.ctx.session }

  async fn wait_for_state(&self, state: SessionState) {
    let mut rx = self.session().subscribe();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| s.state == state))
      .await
      .expect("state change within timeout")
      .expect("session channel open");
  }
}

fn credential(email: &str) -> Credential {
  Credential { email: email.into(), password: "hunter2".into() }
}

// ─── Session lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn starts_loading_until_started() {
  let provider = FakeProvider::new(None);
  let manager = SessionManager::new(
    provider,
    Arc::new(MemoryStore::default()),
    Arc::new(CollectingSink::default()),
    &SessionConfig::default(),
  );
  assert_eq!(manager.snapshot().state, SessionState::Loading);
}

#[tokio::test]
async fn existing_session_resolves_profile() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  let snap = h.session().snapshot();
  assert_eq!(snap.state, SessionState::Authenticated("U1".into()));
  assert_eq!(snap.profile.map(|p| p.role), Some(Role::Membro));
  assert!(!snap.profile_pending);
  assert_eq!(h.store.fetches(), 1);
}

#[tokio::test]
async fn no_session_resolves_anonymous() {
  let h = Harness::start(None, MemoryStore::default()).await;
  assert_eq!(h.session().snapshot().state, SessionState::Anonymous);
  assert_eq!(h.store.fetches(), 0);
}

#[tokio::test]
async fn provider_failure_at_startup_is_anonymous() {
  let provider = FakeProvider::new(Some("U1"));
  provider.fail_bootstrap.store(true, Ordering::SeqCst);
  let ctx = SessionContext::start(
    provider,
    Arc::new(MemoryStore::default()),
    Arc::new(CollectingSink::default()),
    SessionConfig::default(),
  )
  .await;
  assert_eq!(ctx.session.snapshot().state, SessionState::Anonymous);
}

#[tokio::test]
async fn first_lookup_creates_profile() {
  let h = Harness::start(Some("new-user"), MemoryStore::default()).await;
  let profile = h.session().snapshot().profile.unwrap();
  assert_eq!(profile.role, Role::Intruso);
  assert!(h.store.profiles.lock().contains_key(&SubjectId::new("new-user")));
}

#[tokio::test]
async fn refresh_is_served_from_cache() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  let profile = h.session().refresh_profile().await.unwrap();
  assert_eq!(profile.role, Role::Membro);
  assert_eq!(h.store.fetches(), 1, "second resolution must not hit the store");
}

#[tokio::test(start_paused = true)]
async fn expired_entry_triggers_fresh_lookup() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  tokio::time::advance(crate::cache::DEFAULT_TTL + Duration::from_secs(1)).await;
  h.session().refresh_profile().await.unwrap();
  assert_eq!(h.store.fetches(), 2);
}

#[tokio::test]
async fn signed_out_event_clears_cache() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  assert_eq!(h.session().cache().len(), 1);

  h.provider.emit(AuthEvent::signed_out());
  h.wait_for_state(SessionState::Anonymous).await;

  assert!(h.session().cache().is_empty());
  assert!(h.session().snapshot().profile.is_none());
}

#[tokio::test]
async fn sign_in_event_switches_subject() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Membro)
    .with_profile("U2", Role::Gerente);
  let h = Harness::start(Some("U1"), store).await;

  h.provider.emit(AuthEvent::signed_in("U2"));
  h.wait_for_state(SessionState::Authenticated("U2".into())).await;

  let mut rx = h.session().subscribe();
  tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| !s.profile_pending))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(h.session().snapshot().role(), Role::Gerente);
}

#[tokio::test]
async fn token_refresh_for_same_subject_is_quiet() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  h.session().handle_event(AuthEvent::token_refreshed("U1")).await;
  assert_eq!(h.store.fetches(), 1);
  assert_eq!(h.session().snapshot().state, SessionState::Authenticated("U1".into()));
}

#[tokio::test]
async fn user_updated_rereads_profile() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Intruso)).await;
  h.store
    .profiles
    .lock()
    .get_mut(&SubjectId::new("U1"))
    .unwrap()
    .role = Role::Membro;

  h.session().handle_event(AuthEvent::user_updated("U1")).await;
  assert_eq!(h.store.fetches(), 2);
  assert_eq!(h.session().snapshot().role(), Role::Membro);
}

#[tokio::test]
async fn lookup_failure_degrades_without_caching() {
  let store = MemoryStore::default().with_profile("U1", Role::Gerente);
  store.fail_fetch.store(true, Ordering::SeqCst);
  let h = Harness::start(Some("U1"), store).await;

  let snap = h.session().snapshot();
  let profile = snap.profile.clone().unwrap();
  assert_eq!(profile.display_name, UNKNOWN_DISPLAY_NAME);
  assert_eq!(snap.role(), Role::Intruso);
  assert!(h.session().cache().is_empty());

  assert!(h.session().refresh_profile().await.is_none());
}

#[tokio::test]
async fn stale_lookup_result_is_discarded() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Membro)
    .with_profile("U2", Role::Gerente);
  let h = Harness::start(Some("U1"), store).await;
  h.session().cache().invalidate(&"U1".into());

  let gate = h.store.block("U1");
  let session = h.session().clone();
  let in_flight = tokio::spawn(async move { session.refresh_profile().await });
  while h.store.fetches() < 2 {
    tokio::task::yield_now().await;
  }

  h.session().handle_event(AuthEvent::signed_in("U2")).await;
  gate.notify_one();

  assert!(in_flight.await.unwrap().is_none());
  let snap = h.session().snapshot();
  assert_eq!(snap.subject(), Some(&SubjectId::new("U2")));
  assert_eq!(snap.role(), Role::Gerente);
  assert!(h.session().cache().get(&"U1".into()).is_none());
}

#[tokio::test]
async fn sign_out_applies_while_lookup_is_in_flight() {
  let store = MemoryStore::default().with_profile("U1", Role::Membro);
  let gate = store.block("U1");
  let h = Harness::start(None, store).await;

  h.provider.emit(AuthEvent::signed_in("U1"));
  h.wait_for_state(SessionState::Authenticated("U1".into())).await;
  assert!(h.session().snapshot().profile_pending);

  h.provider.emit(AuthEvent::signed_out());
  h.wait_for_state(SessionState::Anonymous).await;
  let denied = h.ctx.member_guard.evaluate(&h.session().snapshot(), "/assets");
  assert_eq!(denied.state, GuardState::DeniedUnauthenticated);

  gate.notify_one();
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(h.session().snapshot().state, SessionState::Anonymous);
  assert!(h.session().cache().is_empty());
}

#[tokio::test]
async fn lagged_listener_resyncs_from_provider() {
  let provider = FakeProvider::with_capacity(None, 1);
  let h = Harness::start_with(provider, MemoryStore::default().with_profile("U2", Role::Membro)).await;
  assert_eq!(h.provider.session_queries.load(Ordering::SeqCst), 1);

  *h.provider.current.lock() = Some("U2".into());
  for _ in 0..3 {
    h.provider.emit(AuthEvent::signed_in("U2"));
  }

  h.wait_for_state(SessionState::Authenticated("U2".into())).await;
  assert_eq!(h.provider.session_queries.load(Ordering::SeqCst), 2, "lag triggers a resync");
}

#[tokio::test]
async fn switching_subject_drops_outgoing_entry() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Membro)
    .with_profile("U2", Role::Membro);
  let h = Harness::start(Some("U1"), store).await;
  assert!(h.session().cache().get(&"U1".into()).is_some());

  h.session().handle_event(AuthEvent::signed_in("U2")).await;
  assert!(h.session().cache().get(&"U1".into()).is_none());
  assert_eq!(h.session().cache().len(), 1);
}

// ─── Profile mutation ────────────────────────────────────────────────────────

#[tokio::test]
async fn update_profile_writes_through_and_invalidates() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;

  let update = ProfileUpdate { display_name: Some("Ana Souza".into()), role: None };
  let merged = h.session().update_profile(update).await.unwrap();

  assert_eq!(merged.display_name, "Ana Souza");
  assert_eq!(h.session().snapshot().profile.unwrap().display_name, "Ana Souza");
  assert!(h.session().cache().get(&"U1".into()).is_none());
  assert_eq!(h.store.profiles.lock()[&SubjectId::new("U1")].display_name, "Ana Souza");
}

#[tokio::test(start_paused = true)]
async fn events_purge_expired_entries() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  let stray = Profile::initial(SubjectId::new("U9"));
  h.session().cache().put("U9".into(), stray, Duration::from_secs(1));
  assert_eq!(h.session().cache().len(), 2);

  tokio::time::advance(Duration::from_secs(2)).await;
  h.session().handle_event(AuthEvent::token_refreshed("U1")).await;
  assert_eq!(h.session().cache().len(), 1);
  assert!(h.session().cache().get(&"U1".into()).is_some());
}

#[tokio::test]
async fn update_during_lookup_is_not_overwritten() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  h.session().cache().invalidate(&"U1".into());

  let gate = h.store.block("U1");
  let session = h.session().clone();
  let in_flight = tokio::spawn(async move { session.refresh_profile().await });
  while h.store.fetches() < 2 {
    tokio::task::yield_now().await;
  }

  let update = ProfileUpdate { display_name: Some("Ana".into()), role: None };
  h.session().update_profile(update).await.unwrap();
  gate.notify_one();
  in_flight.await.unwrap();

  assert!(h.session().cache().get(&"U1".into()).is_none());
  assert_eq!(h.session().snapshot().profile.unwrap().display_name, "Ana");

  let fresh = h.session().refresh_profile().await.unwrap();
  assert_eq!(fresh.display_name, "Ana");
  assert_eq!(h.session().cache().get(&"U1".into()).unwrap().display_name, "Ana");
}

#[tokio::test]
async fn member_cannot_promote_self() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  let update = ProfileUpdate { display_name: None, role: Some(Role::Gerente) };
  let err = h.session().update_profile(update).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden { held: Role::Membro, required: Role::Gerente }));
  assert_eq!(h.store.profiles.lock()[&SubjectId::new("U1")].role, Role::Membro);
}

#[tokio::test]
async fn manager_assigns_roles() {
  let store = MemoryStore::default()
    .with_profile("boss", Role::Gerente)
    .with_profile("U9", Role::Intruso);
  let h = Harness::start(Some("boss"), store).await;

  h.session().assign_role(&"U9".into(), Role::Membro).await.unwrap();
  assert_eq!(h.store.profiles.lock()[&SubjectId::new("U9")].role, Role::Membro);
}

#[tokio::test]
async fn update_requires_session() {
  let h = Harness::start(None, MemoryStore::default()).await;
  let err = h.session().update_profile(ProfileUpdate::default()).await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
}

// ─── Provider passthrough ────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_through_provider_authenticates() {
  let h = Harness::start(None, MemoryStore::default().with_profile("ana@example.com", Role::Membro))
    .await;
  h.session().sign_in(&credential("ana@example.com")).await.unwrap();
  h.wait_for_state(SessionState::Authenticated("ana@example.com".into())).await;
}

#[tokio::test]
async fn provider_message_reaches_sink_verbatim() {
  let h = Harness::start(None, MemoryStore::default()).await;
  *h.provider.reject_with.lock() = Some("Invalid login credentials".into());

  let err = h.session().sign_in(&credential("ana@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::Provider(ref e) if e.message == "Invalid login credentials"));
  assert_eq!(h.sink.last(), Some(Notification::failure("Invalid login credentials")));
}

#[tokio::test]
async fn sign_out_is_local_even_if_provider_fails() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  *h.provider.reject_with.lock() = Some("network down".into());

  assert!(h.session().sign_out().await.is_err());
  assert_eq!(h.session().snapshot().state, SessionState::Anonymous);
  assert!(h.session().cache().is_empty());
}

#[tokio::test]
async fn shutdown_returns_to_uninitialized() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;
  h.ctx.shutdown();
  assert_eq!(h.session().snapshot().state, SessionState::Uninitialized);
  assert!(h.session().cache().is_empty());
}

// ─── Adoption ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn adoption_scenario_first_wins() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Membro)
    .with_profile("U2", Role::Membro)
    .with_record(RecordKind::Asset, "rec-42", None);
  let h = Harness::start(Some("U1"), store).await;

  let adopted = h.ctx.adoption.adopt(RecordKind::Asset, "rec-42").await.unwrap();
  assert_eq!(adopted.owner_id, Some("U1".into()));
  assert_eq!(h.store.owner(RecordKind::Asset, "rec-42"), Some("U1".into()));
  assert_eq!(h.sink.last().unwrap().level, Level::Success);

  h.session().handle_event(AuthEvent::signed_in("U2")).await;
  let err = h.ctx.adoption.adopt(RecordKind::Asset, "rec-42").await.unwrap_err();
  assert!(matches!(err, Error::AdoptionConflict { kind: RecordKind::Asset, .. }));
  assert_eq!(h.store.owner(RecordKind::Asset, "rec-42"), Some("U1".into()));
  assert_eq!(h.sink.last().unwrap().level, Level::Failure);
}

#[tokio::test]
async fn intruso_cannot_adopt() {
  let store = MemoryStore::default()
    .with_profile("U3", Role::Intruso)
    .with_record(RecordKind::Supplier, "sup-1", None);
  let h = Harness::start(Some("U3"), store).await;

  let err = h.ctx.adoption.adopt(RecordKind::Supplier, "sup-1").await.unwrap_err();
  assert!(matches!(err, Error::Forbidden { held: Role::Intruso, required: Role::Membro }));
  assert_eq!(h.store.owner(RecordKind::Supplier, "sup-1"), None);
}

#[tokio::test]
async fn anonymous_cannot_adopt() {
  let store = MemoryStore::default().with_record(RecordKind::Category, "cat-1", None);
  let h = Harness::start(None, store).await;

  let err = h.ctx.adoption.adopt(RecordKind::Category, "cat-1").await.unwrap_err();
  assert!(matches!(err, Error::Unauthenticated));
  assert_eq!(h.sink.last(), Some(Notification::failure("Sign in to adopt records")));
}

#[tokio::test]
async fn adopting_missing_record_fails() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Gerente)).await;
  let err = h.ctx.adoption.adopt(RecordKind::Location, "nowhere").await.unwrap_err();
  assert!(matches!(err, Error::RecordNotFound { kind: RecordKind::Location, .. }));
}

#[tokio::test]
async fn degraded_profile_cannot_adopt() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Gerente)
    .with_record(RecordKind::Customer, "c-1", None);
  store.fail_fetch.store(true, Ordering::SeqCst);
  let h = Harness::start(Some("U1"), store).await;

  let err = h.ctx.adoption.adopt(RecordKind::Customer, "c-1").await.unwrap_err();
  assert!(matches!(err, Error::Forbidden { .. }));
  assert_eq!(h.store.owner(RecordKind::Customer, "c-1"), None);
}

#[tokio::test]
async fn orphaned_lists_only_ownerless_records() {
  let store = MemoryStore::default()
    .with_profile("U1", Role::Membro)
    .with_record(RecordKind::Asset, "a-1", None)
    .with_record(RecordKind::Asset, "a-2", Some("U7"))
    .with_record(RecordKind::Category, "c-1", None);
  let h = Harness::start(Some("U1"), store).await;

  let orphans = h.ctx.adoption.orphaned(RecordKind::Asset).await.unwrap();
  assert_eq!(orphans.len(), 1);
  assert_eq!(orphans[0].record_id, "a-1");
}

// ─── Guards over live session ────────────────────────────────────────────────

#[tokio::test]
async fn guards_follow_session_changes() {
  let h = Harness::start(Some("U1"), MemoryStore::default().with_profile("U1", Role::Membro)).await;

  let admitted = h.ctx.member_guard.evaluate(&h.session().snapshot(), "/assets");
  assert_eq!(admitted.state, GuardState::Admitted);

  h.session().handle_event(AuthEvent::signed_out()).await;
  let denied = h.ctx.manager_guard.evaluate(&h.session().snapshot(), "/admin");
  assert_eq!(denied.state, GuardState::DeniedUnauthenticated);
  let redirect = denied.redirect_target().unwrap();
  assert_eq!(redirect.to, "/auth/login");
  assert_eq!(redirect.return_to.as_deref(), Some("/admin"));
}
