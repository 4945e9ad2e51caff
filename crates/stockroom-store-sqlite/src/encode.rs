//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; roles are their lowercase tags.

use chrono::{DateTime, Utc};
use stockroom_core::{
  profile::Profile,
  record::{RecordKind, RecordOwnership},
  role::Role,
  subject::SubjectId,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Intruso => "intruso",
    Role::Membro => "membro",
    Role::Gerente => "gerente",
  }
}

/// Strict: a tag written by something other than this store is an error
/// rather than a silent demotion.
pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::UnknownValue { column: "role", value: s.to_owned() })
}

// ─── RecordKind ──────────────────────────────────────────────────────────────

/// Table holding records of `kind`. Only these constants are ever
/// interpolated into SQL.
pub fn record_table(kind: RecordKind) -> &'static str {
  match kind {
    RecordKind::Asset => "assets",
    RecordKind::Category => "categories",
    RecordKind::Supplier => "suppliers",
    RecordKind::Location => "locations",
    RecordKind::Customer => "customers",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub subject_id:   String,
  pub display_name: String,
  pub role:         String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawProfile {
  pub const COLUMNS: &'static str = "subject_id, display_name, role, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(0)?,
      display_name: row.get(1)?,
      role:         row.get(2)?,
      created_at:   row.get(3)?,
      updated_at:   row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      subject_id:   SubjectId::new(self.subject_id),
      display_name: self.display_name,
      role:         decode_role(&self.role)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from any ownable record table.
pub struct RawRecord {
  pub id:       String,
  pub name:     String,
  pub owner_id: Option<String>,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "id, name, owner_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, name: row.get(1)?, owner_id: row.get(2)? })
  }

  pub fn into_record(self, kind: RecordKind) -> RecordOwnership {
    RecordOwnership {
      kind,
      record_id: self.id,
      name: self.name,
      owner_id: self.owner_id.map(SubjectId::new),
    }
  }
}
