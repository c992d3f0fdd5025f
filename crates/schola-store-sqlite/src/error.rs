//! Error type for `schola-store-sqlite`.

use schola_core::store::{FaultKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be turned back into a domain value.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("email {0:?} is already registered")]
  DuplicateEmail(String),

  #[error("exam code {0:?} already exists")]
  DuplicateExamCode(String),

  #[error("subject {0:?} already exists")]
  DuplicateSubject(String),

  #[error("unknown student {0:?}")]
  UnknownStudent(String),
}

impl StoreError for Error {
  fn kind(&self) -> FaultKind {
    match self {
      Self::DuplicateEmail(_)
      | Self::DuplicateExamCode(_)
      | Self::DuplicateSubject(_) => FaultKind::Conflict,
      Self::UnknownStudent(_) => FaultKind::Rejected,
      Self::Database(_) | Self::Json(_) | Self::Uuid(_) | Self::Decode(_) => {
        FaultKind::Fault
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
