//! Store traits: the narrow interfaces to the remote data store.
//!
//! Implemented by storage backends (e.g. `stockroom-store-sqlite`). The
//! session layer depends on these abstractions, not on any concrete backend.

use std::future::Future;

use crate::{
  profile::{Profile, ProfileUpdate},
  record::{AdoptOutcome, RecordKind, RecordOwnership},
  subject::SubjectId,
};

/// Persistence of subject profiles.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve the profile for `subject_id`. Returns `None` if not found.
  fn fetch_profile<'a>(
    &'a self,
    subject_id: &'a SubjectId,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Persist a freshly created profile. Returns the stored profile; if one
  /// appeared concurrently for the same subject, that one is returned.
  fn create_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns an error if the profile does not exist.
  fn update_profile<'a>(
    &'a self,
    subject_id: &'a SubjectId,
    update: &'a ProfileUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Ownership of inventory records.
pub trait OwnershipStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Set `owner_id = subject_id` on the record only if it currently has no
  /// owner. Must be a single conditional write.
  fn conditional_adopt<'a>(
    &'a self,
    kind: RecordKind,
    record_id: &'a str,
    subject_id: &'a SubjectId,
  ) -> impl Future<Output = Result<AdoptOutcome, Self::Error>> + Send + 'a;

  /// Retrieve one record's ownership. Returns `None` if not found.
  fn get_record<'a>(
    &'a self,
    kind: RecordKind,
    record_id: &'a str,
  ) -> impl Future<Output = Result<Option<RecordOwnership>, Self::Error>> + Send + 'a;

  /// All records of `kind` with no owner.
  fn list_orphaned(
    &self,
    kind: RecordKind,
  ) -> impl Future<Output = Result<Vec<RecordOwnership>, Self::Error>> + Send + '_;
}
