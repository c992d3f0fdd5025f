//! Handlers for teacher profiles.

use axum::{
  Json,
  extract::{Path, State},
};
use schola_core::{
  Error,
  people::{Teacher, TeacherProfileUpdate},
  store::SchoolStore,
};

use crate::{AppState, error::ApiError, session::TeacherSession};

/// `GET /teacher/me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  session: TeacherSession,
) -> Result<Json<Teacher>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.teachers.get(&session.user_id).await?))
}

/// `GET /teachers/{user_id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(user_id): Path<String>,
) -> Result<Json<Teacher>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.teachers.get(&user_id).await?))
}

/// `PATCH /teachers/{user_id}` with a partial profile body. A teacher may
/// only change their own profile.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  session: TeacherSession,
  Path(user_id): Path<String>,
  Json(body): Json<TeacherProfileUpdate>,
) -> Result<Json<Teacher>, ApiError>
where
  S: SchoolStore + 'static,
{
  if session.user_id != user_id {
    tracing::warn!(
      session = %session.user_id,
      target = %user_id,
      "profile update for another teacher refused"
    );
    return Err(Error::InvalidCredentials.into());
  }
  Ok(Json(state.teachers.update(&user_id, body).await?))
}
