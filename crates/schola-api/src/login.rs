//! Handlers for the teacher login flow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/teacher/login/send_code` | Body: `{"email":"…"}` |
//! | `POST` | `/teacher/login/verify_code` | Body: `{"pending_token":"…","code":"1234"}`; sets the session cookie |
//! | `POST` | `/teacher/logout` | Clears the session cookie |

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use schola_core::store::SchoolStore;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, session};

#[derive(Debug, Deserialize)]
pub struct SendCodeBody {
  pub email: String,
}

/// `POST /teacher/login/send_code`
pub async fn send_code<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SendCodeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let ticket = state.login.start_login(&body.email).await?;
  Ok(Json(json!({
    "success":       true,
    "message":       "login code sent",
    "pending_token": ticket.pending_token,
    "expires_at":    ticket.expires_at,
  })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeBody {
  pub pending_token: String,
  pub code:          String,
}

/// `POST /teacher/login/verify_code`
pub async fn verify_code<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<VerifyCodeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let grant = state
    .login
    .verify_login(&body.pending_token, &body.code)
    .await?;
  Ok((
    [(header::SET_COOKIE, session::set_cookie(&grant.session_token))],
    Json(json!({
      "success":       true,
      "session_token": grant.session_token,
      "user_id":       grant.user_id,
    })),
  ))
}

/// `POST /teacher/logout`
pub async fn logout() -> impl IntoResponse {
  (
    [(header::SET_COOKIE, session::clear_cookie())],
    Json(json!({ "success": true, "message": "logged out" })),
  )
}
