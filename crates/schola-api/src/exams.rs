//! Handlers for exam schedules and the subject catalogue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`   | `/exams` | 201 with `{"success":true,"exam_code":…}` |
//! | `GET`    | `/exams` | Optional `?class_name=` |
//! | `GET`    | `/exams/{exam_code}` | Header plus schedules |
//! | `DELETE` | `/exams/{exam_code}` | Removes the schedules too |
//! | `GET`    | `/subjects` | |
//! | `POST`   | `/subjects` | Body: `{"subject_name":"…"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use schola_core::{
  exam::{Exam, ExamHeader, PublishExamRequest},
  store::SchoolStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, session::TeacherSession};

// ─── Exams ───────────────────────────────────────────────────────────────────

/// `POST /exams`
pub async fn publish<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Json(body): Json<PublishExamRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let exam_code = state.exams.publish(body).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success":   true,
      "message":   "exam published",
      "exam_code": exam_code,
    })),
  ))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub class_name: Option<String>,
}

/// `GET /exams[?class_name=<class>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ExamHeader>>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.exams.list(params.class_name.as_deref()).await?))
}

/// `GET /exams/{exam_code}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(exam_code): Path<String>,
) -> Result<Json<Exam>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.exams.get(&exam_code).await?))
}

/// `DELETE /exams/{exam_code}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(exam_code): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  state.exams.delete(&exam_code).await?;
  Ok(Json(json!({ "success": true, "message": "exam deleted" })))
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list_subjects<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.exams.subjects().await?))
}

#[derive(Debug, Deserialize)]
pub struct SubjectBody {
  pub subject_name: String,
}

/// `POST /subjects`
pub async fn add_subject<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Json(body): Json<SubjectBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  state.exams.add_subject(&body.subject_name).await?;
  Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}
