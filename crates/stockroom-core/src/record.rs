//! Ownable records and the outcome of an ownership claim.
//!
//! Every record kind of the inventory carries an `owner_id` that is either a
//! subject or nothing. A record without an owner is *orphaned* and may be
//! adopted; adoption only ever moves `owner_id` from `None` to a subject.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::subject::SubjectId;

/// The ownable record kinds of the inventory application.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
  Asset,
  Category,
  Supplier,
  Location,
  Customer,
}

/// The ownership projection of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOwnership {
  pub kind:      RecordKind,
  pub record_id: String,
  pub name:      String,
  pub owner_id:  Option<SubjectId>,
}

impl RecordOwnership {
  pub fn is_orphaned(&self) -> bool { self.owner_id.is_none() }
}

/// Result of the store's conditional `owner_id IS NULL` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdoptOutcome {
  /// The write matched; the record now belongs to the adopting subject.
  Adopted(RecordOwnership),
  /// The record already had an owner at write time; nothing was changed.
  AlreadyOwned { owner_id: SubjectId },
  NotFound,
}
