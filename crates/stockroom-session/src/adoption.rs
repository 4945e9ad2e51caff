//! [`OwnershipAdoption`]: claiming orphaned records for the signed-in subject.
//!
//! One implementation serves every [`RecordKind`]; the per-kind difference is
//! entirely inside the store's conditional write.

use std::sync::Arc;

use stockroom_core::{
  Error, Result,
  notify::{Notification, NotificationSink},
  provider::IdentityProvider,
  record::{AdoptOutcome, RecordKind, RecordOwnership},
  role::{DEFAULT_REQUIRED, Role},
  store::{OwnershipStore, ProfileStore},
};
use tracing::{debug, info, warn};

use crate::manager::SessionManager;

pub struct OwnershipAdoption<P, S> {
  session: Arc<SessionManager<P, S>>,
  store:   Arc<S>,
  sink:    Arc<dyn NotificationSink>,
}

impl<P, S> OwnershipAdoption<P, S>
where
  P: IdentityProvider + 'static,
  S: ProfileStore + OwnershipStore + 'static,
{
  pub fn new(
    session: Arc<SessionManager<P, S>>,
    store: Arc<S>,
    sink: Arc<dyn NotificationSink>,
  ) -> Self {
    Self { session, store, sink }
  }

  /// Make the signed-in subject the owner of an orphaned record.
  ///
  /// Fails with `Unauthenticated`, `Forbidden`, `AdoptionConflict` or
  /// `RecordNotFound`; in every failure case the owner is left unchanged.
  /// Each outcome is reported to the notification sink. Refreshing any
  /// listing that showed the record is up to the caller.
  pub async fn adopt(&self, kind: RecordKind, record_id: &str) -> Result<RecordOwnership> {
    let result = self.try_adopt(kind, record_id).await;
    match &result {
      Ok(record) => {
        info!(%kind, record_id, owner = ?record.owner_id, "record adopted");
        self
          .sink
          .notify(Notification::success(format!("{kind} \"{}\" is now yours", record.name)));
      }
      Err(e) => {
        warn!(%kind, record_id, error = %e, "adoption rejected");
        self.sink.notify(Notification::failure(failure_message(kind, e)));
      }
    }
    result
  }

  async fn try_adopt(&self, kind: RecordKind, record_id: &str) -> Result<RecordOwnership> {
    let subject = self.session.current_subject().ok_or(Error::Unauthenticated)?;
    let held = self.session.resolved_role().await.unwrap_or(Role::Intruso);
    if !held.satisfies(DEFAULT_REQUIRED) {
      return Err(Error::Forbidden { held, required: DEFAULT_REQUIRED });
    }

    let outcome = self
      .store
      .conditional_adopt(kind, record_id, &subject)
      .await
      .map_err(Error::store)?;

    match outcome {
      AdoptOutcome::Adopted(record) => Ok(record),
      AdoptOutcome::AlreadyOwned { owner_id } => {
        debug!(%kind, record_id, owner = %owner_id, "record already owned");
        Err(Error::AdoptionConflict { kind, record_id: record_id.to_owned() })
      }
      AdoptOutcome::NotFound => Err(Error::RecordNotFound { kind, record_id: record_id.to_owned() }),
    }
  }

  /// Records of `kind` that can be offered for adoption.
  pub async fn orphaned(&self, kind: RecordKind) -> Result<Vec<RecordOwnership>> {
    self.session.current_subject().ok_or(Error::Unauthenticated)?;
    self.store.list_orphaned(kind).await.map_err(Error::store)
  }
}

fn failure_message(kind: RecordKind, e: &Error) -> String {
  match e {
    Error::Unauthenticated => "Sign in to adopt records".to_owned(),
    Error::Forbidden { .. } => "Your role does not allow adopting records".to_owned(),
    Error::AdoptionConflict { .. } => format!("This {kind} already belongs to someone else"),
    Error::RecordNotFound { .. } => format!("This {kind} no longer exists"),
    other => format!("Could not adopt {kind}: {other}"),
  }
}
