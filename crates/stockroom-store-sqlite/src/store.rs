//! [`SqliteStore`]: the SQLite implementation of [`ProfileStore`] and
//! [`OwnershipStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use stockroom_core::{
  profile::{Profile, ProfileUpdate},
  record::{AdoptOutcome, RecordKind, RecordOwnership},
  store::{OwnershipStore, ProfileStore},
  subject::SubjectId,
};

use crate::{
  Error, Result,
  encode::{RawProfile, RawRecord, encode_dt, encode_role, record_table},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Profiles and ownable records backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and every
/// call is serialised onto its thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a record of `kind`, optionally already owned. Used for seeding;
  /// records are otherwise created by the rest of the inventory system.
  pub async fn create_record(
    &self,
    kind: RecordKind,
    record_id: &str,
    name: &str,
    owner_id: Option<&SubjectId>,
  ) -> Result<RecordOwnership> {
    let table = record_table(kind);
    let now = encode_dt(Utc::now());
    let id = record_id.to_owned();
    let name = name.to_owned();
    let owner = owner_id.map(|o| o.as_str().to_owned());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO {table} (id, name, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)"
          ),
          rusqlite::params![id, name, owner, now],
        )?;
        Ok(RawRecord { id, name, owner_id: owner })
      })
      .await?;

    Ok(raw.into_record(kind))
  }
}

// ─── ProfileStore ────────────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn fetch_profile(&self, subject_id: &SubjectId) -> Result<Option<Profile>> {
    let id = subject_id.as_str().to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {} FROM profiles WHERE subject_id = ?1", RawProfile::COLUMNS),
            rusqlite::params![id],
            RawProfile::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn create_profile(&self, profile: Profile) -> Result<Profile> {
    let id = profile.subject_id.as_str().to_owned();
    let display_name = profile.display_name;
    let role = encode_role(profile.role);
    let created_at = encode_dt(profile.created_at);
    let updated_at = encode_dt(profile.updated_at);

    // A concurrent creator for the same subject wins; the stored row is
    // returned either way.
    let raw: RawProfile = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (subject_id, display_name, role, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(subject_id) DO NOTHING",
          rusqlite::params![id, display_name, role, created_at, updated_at],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {} FROM profiles WHERE subject_id = ?1", RawProfile::COLUMNS),
          rusqlite::params![id],
          RawProfile::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_profile()
  }

  async fn update_profile(&self, subject_id: &SubjectId, update: &ProfileUpdate) -> Result<()> {
    let id = subject_id.as_str().to_owned();
    let display_name = update.display_name.clone();
    let role = update.role.map(encode_role);
    let now = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE profiles
              SET display_name = COALESCE(?1, display_name),
                  role         = COALESCE(?2, role),
                  updated_at   = ?3
            WHERE subject_id = ?4",
          rusqlite::params![display_name, role, now, id],
        )?;
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ProfileNotFound(subject_id.clone()));
    }
    Ok(())
  }
}

// ─── OwnershipStore ──────────────────────────────────────────────────────────

/// What the adoption transaction observed, before decoding.
enum RawAdopt {
  Adopted(RawRecord),
  Owned(String),
  Missing,
}

impl OwnershipStore for SqliteStore {
  type Error = Error;

  async fn conditional_adopt(
    &self,
    kind: RecordKind,
    record_id: &str,
    subject_id: &SubjectId,
  ) -> Result<AdoptOutcome> {
    let table = record_table(kind);
    let id = record_id.to_owned();
    let subject = subject_id.as_str().to_owned();
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        // The ownership check and the write are one statement.
        let changed = conn.execute(
          &format!(
            "UPDATE {table} SET owner_id = ?1, updated_at = ?2
              WHERE id = ?3 AND owner_id IS NULL"
          ),
          rusqlite::params![subject, now, id],
        )?;

        let row = conn
          .query_row(
            &format!("SELECT {} FROM {table} WHERE id = ?1", RawRecord::COLUMNS),
            rusqlite::params![id],
            RawRecord::from_row,
          )
          .optional()?;

        Ok(match (changed, row) {
          (_, None) => RawAdopt::Missing,
          (0, Some(RawRecord { owner_id: Some(owner), .. })) => RawAdopt::Owned(owner),
          // Not reachable while calls are serialised on one connection.
          (0, Some(_)) => RawAdopt::Missing,
          (_, Some(record)) => RawAdopt::Adopted(record),
        })
      })
      .await?;

    Ok(match raw {
      RawAdopt::Adopted(record) => AdoptOutcome::Adopted(record.into_record(kind)),
      RawAdopt::Owned(owner) => AdoptOutcome::AlreadyOwned { owner_id: SubjectId::new(owner) },
      RawAdopt::Missing => AdoptOutcome::NotFound,
    })
  }

  async fn get_record(&self, kind: RecordKind, record_id: &str) -> Result<Option<RecordOwnership>> {
    let table = record_table(kind);
    let id = record_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {} FROM {table} WHERE id = ?1", RawRecord::COLUMNS),
            rusqlite::params![id],
            RawRecord::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    Ok(raw.map(|r| r.into_record(kind)))
  }

  async fn list_orphaned(&self, kind: RecordKind) -> Result<Vec<RecordOwnership>> {
    let table = record_table(kind);

    let rows: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM {table} WHERE owner_id IS NULL ORDER BY name, id",
          RawRecord::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|r| r.into_record(kind)).collect())
  }
}
