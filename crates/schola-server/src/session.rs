//! HS256 session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use schola_core::ports::{CollaboratorError, CredentialIssuer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: String,
  iat: i64,
  exp: i64,
}

pub struct JwtIssuer {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation:   Validation,
  ttl:          Duration,
}

impl JwtIssuer {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    Self {
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      decoding_key: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      ttl,
    }
  }
}

impl CredentialIssuer for JwtIssuer {
  fn issue(&self, subject_id: &str) -> Result<String, CollaboratorError> {
    let now = Utc::now();
    let claims = Claims {
      sub: subject_id.to_owned(),
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
      .map_err(CollaboratorError::new)
  }

  fn verify(&self, token: &str) -> Option<String> {
    match decode::<Claims>(token, &self.decoding_key, &self.validation) {
      Ok(data) => Some(data.claims.sub),
      Err(e) => {
        tracing::debug!(error = %e, "rejected session token");
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn issued_token_verifies_to_subject() {
    let issuer = JwtIssuer::new("s3cret", Duration::minutes(10));
    let token = issuer.issue("t1").unwrap();
    assert_eq!(issuer.verify(&token).as_deref(), Some("t1"));
  }

  #[test]
  fn other_secret_is_rejected() {
    let token = JwtIssuer::new("s3cret", Duration::minutes(10)).issue("t1").unwrap();
    assert!(JwtIssuer::new("other", Duration::minutes(10)).verify(&token).is_none());
  }

  #[test]
  fn expired_token_is_rejected() {
    let issuer = JwtIssuer::new("s3cret", Duration::minutes(-5));
    let token = issuer.issue("t1").unwrap();
    assert!(issuer.verify(&token).is_none());
  }

  #[test]
  fn garbage_is_rejected() {
    let issuer = JwtIssuer::new("s3cret", Duration::minutes(10));
    assert!(issuer.verify("not.a.jwt").is_none());
    assert!(issuer.verify("").is_none());
  }
}
