//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use schola_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Service(#[from] Error),

  /// The request could not be read (bad multipart, missing part).
  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Service(e) => match e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Delivery { .. } => StatusCode::BAD_GATEWAY,
        Error::Internal(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      // Already logged in full by `Error::from_store`.
      ApiError::Service(Error::Storage(_)) => "internal storage error".to_owned(),
      ApiError::Service(Error::Internal(_)) => "internal error".to_owned(),
      ApiError::Service(Error::Delivery { service, .. }) => {
        format!("{service} is unavailable, try again later")
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "success": false, "error": message }))).into_response()
  }
}
