//! Emailed one-time login codes.
//!
//! ```text
//! Unissued ──start_login──▶ CodeSent ──verify_login(match)──▶ Verified
//!                              │
//!                              └──expiry / wrong code──▶ Expired
//! ```
//!
//! The pending record is taken out of the store before the code is compared,
//! so every verification attempt is final: a second attempt with the same
//! token always fails, whatever the first outcome was.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  Error, Result, mail,
  ports::{CredentialIssuer, MailSender},
  store::SchoolStore,
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A code waiting to be verified. Only a hash of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
  pub pending_token: Uuid,
  pub user_id:       String,
  pub email:         String,
  /// Hex SHA-256 of the token bytes followed by the code.
  pub code_hash:     String,
  pub expires_at:    DateTime<Utc>,
}

impl PendingLogin {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }

  pub fn matches(&self, code: &str) -> bool {
    hash_code(self.pending_token, code) == self.code_hash
  }
}

/// Returned by [`LoginVerifier::start_login`].
#[derive(Debug, Clone, Serialize)]
pub struct LoginTicket {
  pub pending_token: Uuid,
  pub expires_at:    DateTime<Utc>,
}

/// Returned by [`LoginVerifier::verify_login`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionGrant {
  pub session_token: String,
  pub user_id:       String,
}

// ─── Codes ───────────────────────────────────────────────────────────────────

/// A uniformly distributed 4-digit code, zero-padded.
pub fn generate_code(rng: &mut impl RngCore) -> String {
  // Largest multiple of 10_000 that fits in a u32; rejecting above it keeps
  // every code equally likely.
  const LIMIT: u32 = u32::MAX - (u32::MAX % 10_000);
  loop {
    let n = rng.next_u32();
    if n < LIMIT {
      return format!("{:04}", n % 10_000);
    }
  }
}

pub fn hash_code(pending_token: Uuid, code: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(pending_token.as_bytes());
  hasher.update(code.as_bytes());
  hex::encode(hasher.finalize())
}

// ─── Verifier ────────────────────────────────────────────────────────────────

pub struct LoginVerifier<S> {
  store:    Arc<S>,
  mailer:   Arc<dyn MailSender>,
  issuer:   Arc<dyn CredentialIssuer>,
  code_ttl: Duration,
}

impl<S> Clone for LoginVerifier<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      mailer:   Arc::clone(&self.mailer),
      issuer:   Arc::clone(&self.issuer),
      code_ttl: self.code_ttl,
    }
  }
}

impl<S: SchoolStore> LoginVerifier<S> {
  pub fn new(
    store: Arc<S>,
    mailer: Arc<dyn MailSender>,
    issuer: Arc<dyn CredentialIssuer>,
    code_ttl: Duration,
  ) -> Self {
    Self { store, mailer, issuer, code_ttl }
  }

  /// Issue a code for a known teacher and mail it.
  ///
  /// Unlike welcome mail, delivery is required: if it fails the pending code
  /// is withdrawn and the call fails.
  pub async fn start_login(&self, email: &str) -> Result<LoginTicket> {
    let email = email.trim();
    let teacher = self
      .store
      .find_teacher_by_email(email)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::InvalidCredentials)?;

    let now = Utc::now();
    let purged = self
      .store
      .purge_expired_logins(now)
      .await
      .map_err(Error::from_store)?;
    if purged > 0 {
      tracing::debug!(purged, "dropped expired login codes");
    }

    let code = generate_code(&mut OsRng);
    let pending_token = Uuid::new_v4();
    let pending = PendingLogin {
      pending_token,
      user_id: teacher.user_id.clone(),
      email: teacher.teacher_email.clone(),
      code_hash: hash_code(pending_token, &code),
      expires_at: now + self.code_ttl,
    };
    let ticket = LoginTicket {
      pending_token: pending.pending_token,
      expires_at:    pending.expires_at,
    };

    self
      .store
      .insert_pending_login(pending)
      .await
      .map_err(Error::from_store)?;

    let mail = mail::login_code(
      &teacher.teacher_email,
      &teacher.teacher_name,
      &code,
      self.code_ttl.num_minutes(),
    );
    if let Err(e) = self.mailer.send(mail).await {
      tracing::error!(error = %e, user_id = %teacher.user_id, "login code delivery failed");
      self
        .store
        .take_pending_login(ticket.pending_token)
        .await
        .map_err(Error::from_store)?;
      return Err(Error::Delivery { service: "mail", message: e.to_string() });
    }

    tracing::info!(user_id = %teacher.user_id, "login code sent");
    Ok(ticket)
  }

  /// Exchange a pending token and its code for a session credential.
  pub async fn verify_login(&self, pending_token: &str, code: &str) -> Result<SessionGrant> {
    let token =
      Uuid::parse_str(pending_token.trim()).map_err(|_| Error::InvalidCredentials)?;

    let pending = self
      .store
      .take_pending_login(token)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::InvalidCredentials)?;

    if pending.is_expired(Utc::now()) {
      tracing::info!(user_id = %pending.user_id, "login code expired");
      return Err(Error::InvalidCredentials);
    }
    if !pending.matches(code.trim()) {
      tracing::warn!(user_id = %pending.user_id, "login code mismatch");
      return Err(Error::InvalidCredentials);
    }

    let session_token = self
      .issuer
      .issue(&pending.user_id)
      .map_err(|e| Error::Delivery { service: "credential issuer", message: e.to_string() })?;

    tracing::info!(user_id = %pending.user_id, "login verified");
    Ok(SessionGrant { session_token, user_id: pending.user_id })
  }

  /// The teacher id behind a session token.
  pub fn session_subject(&self, session_token: &str) -> Result<String> {
    self
      .issuer
      .verify(session_token)
      .ok_or(Error::InvalidCredentials)
  }
}
