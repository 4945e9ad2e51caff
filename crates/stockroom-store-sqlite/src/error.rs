//! Error type for `stockroom-store-sqlite`.

use stockroom_core::subject::SubjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("profile not found: {0}")]
  ProfileNotFound(SubjectId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
