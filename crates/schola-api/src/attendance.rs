//! Handlers for attendance endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance` | Body: `{"date":"2024-03-01","attendance":[{"student_id","student_name","status"}]}` |
//! | `POST` | `/attendance/modify` | Body: `{"date":"…","attendance":[{"student_id","status"}]}` |
//! | `GET`  | `/attendance/{student_id}/{date}` | 404 if no record |
//! | `GET`  | `/classes/{class_name}/attendance` | Optional `?date=YYYY-MM-DD`, default today |

use axum::{
  Json,
  extract::{Path, Query, State},
  response::IntoResponse,
};
use schola_core::{
  Error,
  attendance::{
    AttendanceRecord, ClassAttendanceRow, RawAttendanceEntry, RawStatusChange,
    parse_date,
  },
  store::SchoolStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, session::TeacherSession};

// ─── Submit / modify ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub date:       String,
  pub attendance: Vec<RawAttendanceEntry>,
}

/// `POST /attendance`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let outcome = state.attendance.submit(&body.date, body.attendance).await?;
  Ok(Json(json!({
    "success":  true,
    "message":  "attendance submitted",
    "inserted": outcome.inserted,
    "updated":  outcome.updated,
  })))
}

#[derive(Debug, Deserialize)]
pub struct ModifyBody {
  pub date:       String,
  pub attendance: Vec<RawStatusChange>,
}

/// `POST /attendance/modify`
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Json(body): Json<ModifyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let outcome = state.attendance.modify(&body.date, body.attendance).await?;
  Ok(Json(json!({
    "success": true,
    "message": "attendance updated",
    "updated": outcome.updated,
    "skipped": outcome.skipped,
  })))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /attendance/{student_id}/{date}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path((student_id, date)): Path<(String, String)>,
) -> Result<Json<AttendanceRecord>, ApiError>
where
  S: SchoolStore + 'static,
{
  let record = state
    .attendance
    .get(&student_id, &date)
    .await?
    .ok_or_else(|| Error::NotFound(format!("attendance for {student_id} on {date}")))?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ClassParams {
  pub date: Option<String>,
}

/// `GET /classes/{class_name}/attendance[?date=YYYY-MM-DD]`
pub async fn for_class<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(class_name): Path<String>,
  Query(params): Query<ClassParams>,
) -> Result<Json<Vec<ClassAttendanceRow>>, ApiError>
where
  S: SchoolStore + 'static,
{
  let date = match params.date.as_deref() {
    Some(d) => parse_date(d)?,
    None => chrono::Local::now().date_naive(),
  };
  Ok(Json(state.attendance.class_attendance(&class_name, date).await?))
}
