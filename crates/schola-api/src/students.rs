//! Handlers for student enrollment and class rosters.
//!
//! `POST /students` takes `multipart/form-data` with a `student` part holding
//! the JSON details and an optional `photo` file part.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use schola_core::{
  people::{Student, StudentDetails, StudentName},
  ports::Photo,
  store::SchoolStore,
};
use serde_json::json;

use crate::{AppState, error::ApiError, session::TeacherSession};

fn bad_multipart(e: impl std::fmt::Display) -> ApiError {
  ApiError::BadRequest(format!("malformed multipart body: {e}"))
}

/// `POST /students`
pub async fn enroll<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
  S: SchoolStore + 'static,
{
  let mut details: Option<StudentDetails> = None;
  let mut photo: Option<Photo> = None;

  while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("student") => {
        let text = field.text().await.map_err(bad_multipart)?;
        let parsed = serde_json::from_str(&text)
          .map_err(|e| ApiError::BadRequest(format!("invalid student details: {e}")))?;
        details = Some(parsed);
      }
      Some("photo") => {
        let file_name = field.file_name().unwrap_or("photo").to_owned();
        let content_type = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_owned();
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        if !bytes.is_empty() {
          photo = Some(Photo { file_name, content_type, bytes: bytes.to_vec() });
        }
      }
      other => tracing::debug!(part = ?other, "ignoring multipart part"),
    }
  }

  let details =
    details.ok_or_else(|| ApiError::BadRequest("missing `student` part".into()))?;
  let student = state.students.enroll(details, photo).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "student enrolled",
      "student": student,
    })),
  ))
}

/// `GET /students/{user_id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(user_id): Path<String>,
) -> Result<Json<Student>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.students.get(&user_id).await?))
}

/// `GET /classes/{class_name}/students`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(class_name): Path<String>,
) -> Result<Json<Vec<Student>>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.students.list(&class_name).await?))
}

/// `GET /classes/{class_name}/students/names`
pub async fn names<S>(
  State(state): State<AppState<S>>,
  _session: TeacherSession,
  Path(class_name): Path<String>,
) -> Result<Json<Vec<StudentName>>, ApiError>
where
  S: SchoolStore + 'static,
{
  Ok(Json(state.students.names(&class_name).await?))
}
