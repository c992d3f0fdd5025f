//! Error taxonomy shared by every Schola service.

use thiserror::Error;

use crate::store::{FaultKind, StoreError};

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or out-of-range input. Nothing was written.
  #[error("validation failed: {0}")]
  Validation(String),

  /// A uniqueness rule would be violated. Nothing was written.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Unknown login, wrong or expired code, or a bad session token.
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("not found: {0}")]
  NotFound(String),

  /// A collaborator the operation cannot complete without (mail for login
  /// codes, the image store for photos) failed.
  #[error("{service} unavailable: {message}")]
  Delivery {
    service: &'static str,
    message: String,
  },

  /// A local failure unrelated to storage or collaborators.
  #[error("internal error: {0}")]
  Internal(String),

  /// Unexpected persistence failure; the transaction was rolled back.
  #[error("storage fault: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  /// Classify a backend error through [`StoreError::kind`].
  ///
  /// Faults are logged here with full detail; callers only ever surface an
  /// opaque message for them.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.kind() {
      FaultKind::Conflict => Self::Conflict(err.to_string()),
      FaultKind::Rejected => Self::Validation(err.to_string()),
      FaultKind::Fault => {
        tracing::error!(error = %err, "storage fault");
        Self::Storage(Box::new(err))
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
