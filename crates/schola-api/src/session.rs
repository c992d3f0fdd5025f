//! Session-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use schola_core::{Error, store::SchoolStore};

use crate::{AppState, error::ApiError};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// The authenticated teacher. Present in a handler means the request carried
/// a valid session token.
#[derive(Debug, Clone)]
pub struct TeacherSession {
  pub user_id: String,
}

/// Pull the session token from `Authorization: Bearer …`, falling back to the
/// session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value)
    .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value installing a session token.
pub fn set_cookie(token: &str) -> String {
  format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value removing the session token.
pub fn clear_cookie() -> String {
  format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

impl<S> FromRequestParts<AppState<S>> for TeacherSession
where
  S: SchoolStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = session_token(&parts.headers).ok_or(Error::InvalidCredentials)?;
    let user_id = state.login.session_subject(token)?;
    Ok(TeacherSession { user_id })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn bearer_wins_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
    assert_eq!(session_token(&headers), Some("abc"));
  }

  #[test]
  fn cookie_is_found_among_others() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; access_token=xyz; lang=en"),
    );
    assert_eq!(session_token(&headers), Some("xyz"));
  }

  #[test]
  fn missing_or_empty_token_is_none() {
    let mut headers = HeaderMap::new();
    assert_eq!(session_token(&headers), None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
    headers.insert(header::COOKIE, HeaderValue::from_static("access_token="));
    assert_eq!(session_token(&headers), None);
  }
}
