//! JSON REST API for Schola.
//!
//! Exposes an axum [`Router`] backed by any [`SchoolStore`]. TLS and
//! transport concerns are the caller's responsibility; sessions are checked
//! by the [`session::TeacherSession`] extractor.

pub mod attendance;
pub mod error;
pub mod exams;
pub mod login;
pub mod session;
pub mod students;
pub mod teachers;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use schola_core::{
  attendance::AttendanceReconciler,
  exam::ExamPublisher,
  login::LoginVerifier,
  ports::{CredentialIssuer, ImageStore, MailSender},
  store::SchoolStore,
  students::StudentRegistry,
  teachers::TeacherProfiles,
};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// External services the handlers need besides the store.
#[derive(Clone)]
pub struct Collaborators {
  pub mailer:         Arc<dyn MailSender>,
  pub issuer:         Arc<dyn CredentialIssuer>,
  pub images:         Arc<dyn ImageStore>,
  pub login_code_ttl: chrono::Duration,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub attendance: AttendanceReconciler<S>,
  pub exams:      ExamPublisher<S>,
  pub login:      LoginVerifier<S>,
  pub students:   StudentRegistry<S>,
  pub teachers:   TeacherProfiles<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      attendance: self.attendance.clone(),
      exams:      self.exams.clone(),
      login:      self.login.clone(),
      students:   self.students.clone(),
      teachers:   self.teachers.clone(),
    }
  }
}

impl<S: SchoolStore> AppState<S> {
  pub fn new(store: Arc<S>, with: Collaborators) -> Self {
    Self {
      attendance: AttendanceReconciler::new(Arc::clone(&store)),
      exams:      ExamPublisher::new(Arc::clone(&store)),
      login:      LoginVerifier::new(
        Arc::clone(&store),
        Arc::clone(&with.mailer),
        with.issuer,
        with.login_code_ttl,
      ),
      students:   StudentRegistry::new(
        Arc::clone(&store),
        with.images,
        Arc::clone(&with.mailer),
      ),
      teachers:   TeacherProfiles::new(store, with.mailer),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SchoolStore + 'static,
{
  Router::new()
    // Login and session
    .route("/teacher/login/send_code", post(login::send_code::<S>))
    .route("/teacher/login/verify_code", post(login::verify_code::<S>))
    .route("/teacher/logout", post(login::logout))
    .route("/teacher/me", get(teachers::me::<S>))
    .route(
      "/teachers/{user_id}",
      get(teachers::get_one::<S>).patch(teachers::update::<S>),
    )
    // Attendance
    .route("/attendance", post(attendance::submit::<S>))
    .route("/attendance/modify", post(attendance::modify::<S>))
    .route("/attendance/{student_id}/{date}", get(attendance::get_one::<S>))
    .route("/classes/{class_name}/attendance", get(attendance::for_class::<S>))
    // Students
    .route("/classes/{class_name}/students", get(students::list::<S>))
    .route("/classes/{class_name}/students/names", get(students::names::<S>))
    .route("/students", post(students::enroll::<S>))
    .route("/students/{user_id}", get(students::get_one::<S>))
    // Exams and subjects
    .route("/exams", get(exams::list::<S>).post(exams::publish::<S>))
    .route(
      "/exams/{exam_code}",
      get(exams::get_one::<S>).delete(exams::delete_one::<S>),
    )
    .route(
      "/subjects",
      get(exams::list_subjects::<S>).post(exams::add_subject::<S>),
    )
    .with_state(state)
}
