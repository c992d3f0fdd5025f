//! Router tests over an in-memory SQLite store with fake collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use schola_core::{
  people::{StudentDetails, Teacher, User, UserRole},
  ports::{CollaboratorError, CredentialIssuer, ImageStore, MailSender, OutgoingMail, Photo},
  store::SchoolStore,
};
use schola_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, Collaborators, api_router};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingMailer {
  sent: Mutex<Vec<OutgoingMail>>,
  fail: bool,
}

impl RecordingMailer {
  fn sent(&self) -> Vec<OutgoingMail> { self.sent.lock().unwrap().clone() }
}

#[async_trait]
impl MailSender for RecordingMailer {
  async fn send(&self, mail: OutgoingMail) -> Result<(), CollaboratorError> {
    if self.fail {
      return Err(CollaboratorError::new("smtp relay refused connection"));
    }
    self.sent.lock().unwrap().push(mail);
    Ok(())
  }
}

struct FakeIssuer;

impl CredentialIssuer for FakeIssuer {
  fn issue(&self, subject_id: &str) -> Result<String, CollaboratorError> {
    Ok(format!("session-{subject_id}"))
  }

  fn verify(&self, token: &str) -> Option<String> {
    token.strip_prefix("session-").map(str::to_owned)
  }
}

struct FakeImages {
  fail: bool,
}

#[async_trait]
impl ImageStore for FakeImages {
  async fn upload(&self, photo: Photo) -> Result<String, CollaboratorError> {
    if self.fail {
      return Err(CollaboratorError::new("upload rejected"));
    }
    Ok(format!("https://img.test/{}", photo.file_name))
  }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

struct Harness {
  app:    Router,
  store:  Arc<SqliteStore>,
  mailer: Arc<RecordingMailer>,
}

const TEACHER_EMAIL: &str = "ada@school.test";
const SESSION: &str = "session-t1";

async fn harness_with(
  mailer: RecordingMailer,
  images_fail: bool,
  login_code_ttl: chrono::Duration,
) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  store
    .add_teacher(
      User {
        user_id:       "t1".into(),
        user_name:     "Ada".into(),
        user_email:    TEACHER_EMAIL.into(),
        password_hash: "$argon2id$test".into(),
        user_role:     UserRole::Teacher,
      },
      Teacher::new("t1", "Ada", TEACHER_EMAIL),
    )
    .await
    .unwrap();

  let mailer = Arc::new(mailer);
  let state = AppState::new(Arc::clone(&store), Collaborators {
    mailer:         mailer.clone(),
    issuer:         Arc::new(FakeIssuer),
    images:         Arc::new(FakeImages { fail: images_fail }),
    login_code_ttl,
  });
  Harness { app: api_router(state), store, mailer }
}

async fn harness() -> Harness {
  harness_with(RecordingMailer::default(), false, chrono::Duration::minutes(5)).await
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  read(resp).await
}

async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

fn code_from(mail: &OutgoingMail) -> String {
  mail
    .html_body
    .split("<strong>")
    .nth(1)
    .and_then(|rest| rest.split("</strong>").next())
    .unwrap()
    .to_owned()
}

async fn enroll(store: &SqliteStore, id: &str, name: &str) {
  let user = User {
    user_id:       id.into(),
    user_name:     name.into(),
    user_email:    format!("{id}@school.test"),
    password_hash: "$argon2id$test".into(),
    user_role:     UserRole::Student,
  };
  let details = StudentDetails {
    student_name: name.into(),
    student_email: format!("{id}@school.test"),
    class_name: "10A".into(),
    ..Default::default()
  };
  store.add_student(user, details.into_student(id.into(), None)).await.unwrap();
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_code_is_mailed_once_and_usable_once() {
  let h = harness().await;

  let (status, body) = call(
    &h.app,
    "POST",
    "/teacher/login/send_code",
    None,
    Some(json!({ "email": TEACHER_EMAIL })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let pending_token = body["pending_token"].as_str().unwrap().to_owned();

  let sent = h.mailer.sent();
  assert_eq!(sent.len(), 1);
  assert_eq!(sent[0].to, TEACHER_EMAIL);
  let code = code_from(&sent[0]);
  assert_eq!(code.len(), 4);
  assert!(code.bytes().all(|b| b.is_ascii_digit()));

  let verify = json!({ "pending_token": pending_token, "code": code });
  let req = Request::builder()
    .method("POST")
    .uri("/teacher/login/verify_code")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(verify.to_string()))
    .unwrap();
  let resp = h.app.clone().oneshot(req).await.unwrap();
  let cookie = resp
    .headers()
    .get(header::SET_COOKIE)
    .unwrap()
    .to_str()
    .unwrap()
    .to_owned();
  assert!(cookie.starts_with("access_token=session-t1"));
  let (status, body) = read(resp).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["session_token"], SESSION);

  let (status, body) =
    call(&h.app, "POST", "/teacher/login/verify_code", None, Some(verify)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn wrong_code_burns_the_pending_token() {
  let h = harness().await;
  let (_, body) = call(
    &h.app,
    "POST",
    "/teacher/login/send_code",
    None,
    Some(json!({ "email": TEACHER_EMAIL })),
  )
  .await;
  let pending_token = body["pending_token"].as_str().unwrap().to_owned();
  let code = code_from(&h.mailer.sent()[0]);
  let wrong = if code == "0000" { "0001" } else { "0000" };

  let (status, _) = call(
    &h.app,
    "POST",
    "/teacher/login/verify_code",
    None,
    Some(json!({ "pending_token": pending_token, "code": wrong })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = call(
    &h.app,
    "POST",
    "/teacher/login/verify_code",
    None,
    Some(json!({ "pending_token": pending_token, "code": code })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_code_is_rejected() {
  let h = harness_with(RecordingMailer::default(), false, chrono::Duration::zero()).await;
  let (_, body) = call(
    &h.app,
    "POST",
    "/teacher/login/send_code",
    None,
    Some(json!({ "email": TEACHER_EMAIL })),
  )
  .await;
  let code = code_from(&h.mailer.sent()[0]);

  let (status, _) = call(
    &h.app,
    "POST",
    "/teacher/login/verify_code",
    None,
    Some(json!({ "pending_token": body["pending_token"], "code": code })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_email_sends_nothing() {
  let h = harness().await;
  let (status, _) = call(
    &h.app,
    "POST",
    "/teacher/login/send_code",
    None,
    Some(json!({ "email": "stranger@school.test" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn mail_failure_fails_login_start() {
  let mailer = RecordingMailer { fail: true, ..Default::default() };
  let h = harness_with(mailer, false, chrono::Duration::minutes(5)).await;
  let (status, body) = call(
    &h.app,
    "POST",
    "/teacher/login/send_code",
    None,
    Some(json!({ "email": TEACHER_EMAIL })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
  let h = harness().await;
  assert_eq!(call(&h.app, "GET", "/exams", None, None).await.0, StatusCode::UNAUTHORIZED);
  assert_eq!(
    call(&h.app, "GET", "/exams", Some("forged"), None).await.0,
    StatusCode::UNAUTHORIZED
  );

  let req = Request::builder()
    .uri("/teacher/me")
    .header(header::COOKIE, format!("access_token={SESSION}"))
    .body(Body::empty())
    .unwrap();
  let (status, body) = read(h.app.clone().oneshot(req).await.unwrap()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["teacher_email"], TEACHER_EMAIL);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
  let h = harness().await;
  let req = Request::builder()
    .method("POST")
    .uri("/teacher/logout")
    .body(Body::empty())
    .unwrap();
  let resp = h.app.clone().oneshot(req).await.unwrap();
  let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
  assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn teacher_profile_can_be_patched() {
  let h = harness().await;
  let (status, body) = call(
    &h.app,
    "PATCH",
    "/teachers/t1",
    Some(SESSION),
    Some(json!({ "qualification": "MSc", "age": 38 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["qualification"], "MSc");

  let (status, _) = call(
    &h.app,
    "PATCH",
    "/teachers/t1",
    Some(SESSION),
    Some(json!({ "age": -1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    call(&h.app, "GET", "/teachers/nobody", Some(SESSION), None).await.0,
    StatusCode::NOT_FOUND
  );
}

#[tokio::test]
async fn teachers_cannot_patch_each_other() {
  let h = harness().await;
  h.store
    .add_teacher(
      User {
        user_id:       "t2".into(),
        user_name:     "Grace".into(),
        user_email:    "grace@school.test".into(),
        password_hash: "$argon2id$test".into(),
        user_role:     UserRole::Teacher,
      },
      Teacher::new("t2", "Grace", "grace@school.test"),
    )
    .await
    .unwrap();

  let (status, body) = call(
    &h.app,
    "PATCH",
    "/teachers/t2",
    Some(SESSION),
    Some(json!({ "bank_account_id": "ACCT-T1" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);

  let (status, body) = call(&h.app, "GET", "/teachers/t2", Some("session-t2"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["bank_account_id"], Value::Null);

  let (status, body) = call(
    &h.app,
    "PATCH",
    "/teachers/t2",
    Some("session-t2"),
    Some(json!({ "bank_account_id": "ACCT-T2" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["bank_account_id"], "ACCT-T2");
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_entry_rejects_the_whole_batch() {
  let h = harness().await;
  for (id, name) in [("s1", "A"), ("s2", "B"), ("s3", "C"), ("s4", "D"), ("s5", "E")] {
    enroll(&h.store, id, name).await;
  }
  let mut entries: Vec<Value> = ["s1", "s2", "s3", "s4", "s5"]
    .iter()
    .map(|id| json!({ "student_id": id, "student_name": id, "status": "Present" }))
    .collect();
  entries[2]["status"] = json!("Late");

  let (status, body) = call(
    &h.app,
    "POST",
    "/attendance",
    Some(SESSION),
    Some(json!({ "date": "2024-03-01", "attendance": entries })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("entry 3"));

  let (_, rows) =
    call(&h.app, "GET", "/classes/10A/attendance?date=2024-03-01", Some(SESSION), None).await;
  let rows = rows.as_array().unwrap();
  assert_eq!(rows.len(), 5);
  assert!(rows.iter().all(|r| r["status"].is_null()));
}

#[tokio::test]
async fn submit_then_modify() {
  let h = harness().await;
  enroll(&h.store, "s1", "Alice").await;
  enroll(&h.store, "s2", "Bob").await;

  let (status, body) = call(
    &h.app,
    "POST",
    "/attendance",
    Some(SESSION),
    Some(json!({
      "date": "2024-03-01",
      "attendance": [{ "student_id": "s1", "student_name": "Alice", "status": "Absent" }],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["inserted"], 1);

  let (status, body) = call(
    &h.app,
    "POST",
    "/attendance/modify",
    Some(SESSION),
    Some(json!({
      "date": "2024-03-01",
      "attendance": [
        { "student_id": "s1", "status": "Present" },
        { "student_id": "s2", "status": "Present" },
      ],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["updated"], 1);
  assert_eq!(body["skipped"], json!(["s2"]));

  let (status, record) =
    call(&h.app, "GET", "/attendance/s1/2024-03-01", Some(SESSION), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(record["status"], "Present");
  assert_eq!(
    call(&h.app, "GET", "/attendance/s2/2024-03-01", Some(SESSION), None).await.0,
    StatusCode::NOT_FOUND
  );
}

// ─── Exams ───────────────────────────────────────────────────────────────────

fn exam_body(code: &str) -> Value {
  json!({
    "exam_name": "Midterm",
    "exam_code": code,
    "class_name": "10A",
    "subjects": [
      { "subject_name": "Maths", "exam_date": "2024-03-11",
        "start_time": "09:00", "end_time": "11:00", "marks": 100 },
    ],
  })
}

#[tokio::test]
async fn exam_lifecycle() {
  let h = harness().await;

  let (status, body) = call(&h.app, "POST", "/exams", Some(SESSION), Some(exam_body("MID"))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["exam_code"], "MID");

  let (status, _) = call(&h.app, "POST", "/exams", Some(SESSION), Some(exam_body("MID"))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, exam) = call(&h.app, "GET", "/exams/MID", Some(SESSION), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(exam["exam_name"], "Midterm");
  assert_eq!(exam["subjects"].as_array().unwrap().len(), 1);

  let (status, _) = call(&h.app, "DELETE", "/exams/MID", Some(SESSION), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    call(&h.app, "GET", "/exams/MID", Some(SESSION), None).await.0,
    StatusCode::NOT_FOUND
  );
}

#[tokio::test]
async fn inverted_times_are_a_validation_error() {
  let h = harness().await;
  let mut body = exam_body("BAD");
  body["subjects"][0]["start_time"] = json!("12:00");
  let (status, _) = call(&h.app, "POST", "/exams", Some(SESSION), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (_, list) = call(&h.app, "GET", "/exams", Some(SESSION), None).await;
  assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn subject_catalogue() {
  let h = harness().await;
  let add = || Some(json!({ "subject_name": "Physics" }));
  assert_eq!(call(&h.app, "POST", "/subjects", Some(SESSION), add()).await.0, StatusCode::CREATED);
  assert_eq!(call(&h.app, "POST", "/subjects", Some(SESSION), add()).await.0, StatusCode::CONFLICT);
  let (_, list) = call(&h.app, "GET", "/subjects", Some(SESSION), None).await;
  assert_eq!(list, json!(["Physics"]));
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

fn multipart(student: &Value, photo: Option<&[u8]>) -> Request<Body> {
  const BOUNDARY: &str = "schola-test-boundary";
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"student\"\r\n\r\n{student}\r\n"
    )
    .as_bytes(),
  );
  if let Some(bytes) = photo {
    body.extend_from_slice(
      format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; \
         filename=\"alice.png\"\r\nContent-Type: image/png\r\n\r\n"
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

  Request::builder()
    .method("POST")
    .uri("/students")
    .header(header::AUTHORIZATION, format!("Bearer {SESSION}"))
    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
    .body(Body::from(body))
    .unwrap()
}

fn alice() -> Value {
  json!({
    "student_name": "Alice",
    "student_email": "alice@school.test",
    "class_name": "10A",
    "roll_no": 7,
    "gender": "Female",
    "date_of_birth": "2010-05-04",
  })
}

#[tokio::test]
async fn enrollment_uploads_photo_and_mails_welcome() {
  let h = harness().await;
  let resp = h.app.clone().oneshot(multipart(&alice(), Some(b"\x89PNG"))).await.unwrap();
  let (status, body) = read(resp).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["student"]["image_url"], "https://img.test/alice.png");

  let welcome = h.mailer.sent();
  assert_eq!(welcome.len(), 1);
  assert_eq!(welcome[0].to, "alice@school.test");

  let (_, names) = call(&h.app, "GET", "/classes/10A/students/names", Some(SESSION), None).await;
  assert_eq!(names[0]["student_name"], "Alice");
}

#[tokio::test]
async fn failed_photo_upload_writes_nothing() {
  let h = harness_with(RecordingMailer::default(), true, chrono::Duration::minutes(5)).await;
  let resp = h.app.clone().oneshot(multipart(&alice(), Some(b"\x89PNG"))).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

  let (_, students) = call(&h.app, "GET", "/classes/10A/students", Some(SESSION), None).await;
  assert!(students.as_array().unwrap().is_empty());
  assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn duplicate_student_email_is_a_conflict() {
  let h = harness().await;
  let first = h.app.clone().oneshot(multipart(&alice(), None)).await.unwrap();
  assert_eq!(first.status(), StatusCode::CREATED);
  let second = h.app.clone().oneshot(multipart(&alice(), None)).await.unwrap();
  assert_eq!(second.status(), StatusCode::CONFLICT);
}
