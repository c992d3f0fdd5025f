//! The `SchoolStore` trait: the persistence gateway.
//!
//! Backends (e.g. `schola-store-sqlite`) implement it; the services in this
//! crate and the HTTP layer depend only on the abstraction. Every method that
//! writes more than one row runs inside a single backend transaction and
//! leaves no partial effect when it fails.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  attendance::{
    AttendanceEntry, AttendanceRecord, ClassAttendanceRow, ReconcileOutcome,
    StatusChange,
  },
  exam::{Exam, ExamHeader, NewExam},
  login::PendingLogin,
  people::{Student, StudentName, Teacher, TeacherProfileUpdate, User},
};

// ─── Error classification ────────────────────────────────────────────────────

/// How a backend failure maps onto the service error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
  /// A uniqueness rule was hit (duplicate exam code, email, subject).
  Conflict,
  /// The data referenced something that does not exist (e.g. an unknown
  /// student in an attendance batch).
  Rejected,
  /// Anything else: I/O, corruption, decode failures.
  Fault,
}

/// Implemented by every backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> FaultKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait SchoolStore: Send + Sync {
  type Error: StoreError;

  // ── People ────────────────────────────────────────────────────────────

  /// Insert a user and its teacher extension row in one transaction.
  fn add_teacher(
    &self,
    user: User,
    teacher: Teacher,
  ) -> impl Future<Output = Result<Teacher, Self::Error>> + Send + '_;

  /// Look a teacher up by login email. Only users with the teacher role match.
  fn find_teacher_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + 'a;

  fn get_teacher<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + 'a;

  /// Apply a partial update. Returns `None` when the teacher does not exist.
  fn update_teacher_profile(
    &self,
    user_id: String,
    update: TeacherProfileUpdate,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + '_;

  /// Insert a user and its student extension row in one transaction.
  fn add_student(
    &self,
    user: User,
    student: Student,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  fn get_student<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  /// All students of a class, ordered by roll number then name.
  fn list_students<'a>(
    &'a self,
    class_name: &'a str,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + 'a;

  fn student_names<'a>(
    &'a self,
    class_name: &'a str,
  ) -> impl Future<Output = Result<Vec<StudentName>, Self::Error>> + Send + 'a;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Insert-or-update every entry for `date` in one transaction.
  ///
  /// Existing records keep their stored name; only the status changes.
  fn submit_attendance(
    &self,
    date: NaiveDate,
    entries: Vec<AttendanceEntry>,
  ) -> impl Future<Output = Result<ReconcileOutcome, Self::Error>> + Send + '_;

  /// Update only records that already exist for `date`; the rest are
  /// reported in [`ReconcileOutcome::skipped`].
  fn modify_attendance(
    &self,
    date: NaiveDate,
    changes: Vec<StatusChange>,
  ) -> impl Future<Output = Result<ReconcileOutcome, Self::Error>> + Send + '_;

  fn get_attendance<'a>(
    &'a self,
    student_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + 'a;

  /// Every student of the class with their status on `date`, if recorded.
  fn class_attendance<'a>(
    &'a self,
    class_name: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ClassAttendanceRow>, Self::Error>> + Send + 'a;

  // ── Exams ─────────────────────────────────────────────────────────────

  /// Insert the header and all schedule rows in one transaction.
  fn publish_exam(
    &self,
    exam: NewExam,
  ) -> impl Future<Output = Result<ExamHeader, Self::Error>> + Send + '_;

  /// Header plus schedules, ordered by date and start time.
  fn get_exam<'a>(
    &'a self,
    exam_code: &'a str,
  ) -> impl Future<Output = Result<Option<Exam>, Self::Error>> + Send + 'a;

  fn list_exams<'a>(
    &'a self,
    class_name: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<ExamHeader>, Self::Error>> + Send + 'a;

  /// Delete the header and every schedule row it owns. Returns `false` when
  /// no exam had that code.
  fn delete_exam(
    &self,
    exam_code: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn add_subject(
    &self,
    subject_name: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Pending login codes ───────────────────────────────────────────────

  fn insert_pending_login(
    &self,
    pending: PendingLogin,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove and return the pending login for `token` in one step, so a code
  /// can never be checked twice.
  fn take_pending_login(
    &self,
    token: Uuid,
  ) -> impl Future<Output = Result<Option<PendingLogin>, Self::Error>> + Send + '_;

  /// Drop every pending login that expired before `now`. Returns the count.
  fn purge_expired_logins(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
