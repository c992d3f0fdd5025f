//! Interfaces for the collaborators Schola consumes but does not implement:
//! mail delivery, session credentials and image hosting.
//!
//! Implementations live in `schola-server`; tests substitute in-memory fakes.

use async_trait::async_trait;

// ─── Mail ────────────────────────────────────────────────────────────────────

/// An inline attachment referenced from the HTML body by `cid:`.
#[derive(Debug, Clone)]
pub struct Attachment {
  pub content_id:   String,
  pub content_type: String,
  pub bytes:        Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
  pub to:         String,
  pub subject:    String,
  pub html_body:  String,
  pub attachment: Option<Attachment>,
}

/// Failure reported by a collaborator; the message is safe to log.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
  pub fn new(message: impl std::fmt::Display) -> Self { Self(message.to_string()) }
}

#[async_trait]
pub trait MailSender: Send + Sync {
  async fn send(&self, mail: OutgoingMail) -> Result<(), CollaboratorError>;
}

// ─── Session credentials ─────────────────────────────────────────────────────

pub trait CredentialIssuer: Send + Sync {
  /// Mint an opaque session token for `subject_id`.
  fn issue(&self, subject_id: &str) -> Result<String, CollaboratorError>;

  /// Return the subject a token was issued for, or `None` if the token is
  /// malformed, forged or expired.
  fn verify(&self, token: &str) -> Option<String>;
}

// ─── Images ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Photo {
  pub file_name:    String,
  pub content_type: String,
  pub bytes:        Vec<u8>,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
  /// Upload the photo and return its public URL.
  async fn upload(&self, photo: Photo) -> Result<String, CollaboratorError>;
}
