//! Exam headers, their per-subject schedules, and the publisher that writes
//! both in one transaction.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, attendance::parse_date, store::SchoolStore};

// ─── Types ───────────────────────────────────────────────────────────────────

/// The parent record of an exam. `exam_code` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamHeader {
  pub exam_code:  String,
  pub exam_name:  String,
  pub class_name: String,
}

/// One subject sitting of an exam, owned by its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSubjectSchedule {
  /// Store-assigned sequence number.
  pub s_no:         i64,
  pub exam_code:    String,
  pub subject_name: String,
  pub exam_date:    NaiveDate,
  pub start_time:   NaiveTime,
  pub end_time:     NaiveTime,
  pub marks:        i64,
}

/// A header with every schedule row it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exam {
  #[serde(flatten)]
  pub header:   ExamHeader,
  pub subjects: Vec<ExamSubjectSchedule>,
}

/// A validated schedule row waiting for its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubjectSchedule {
  pub subject_name: String,
  pub exam_date:    NaiveDate,
  pub start_time:   NaiveTime,
  pub end_time:     NaiveTime,
  pub marks:        i64,
}

/// Input to [`SchoolStore::publish_exam`]. Always built by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExam {
  pub header:   ExamHeader,
  pub subjects: Vec<NewSubjectSchedule>,
}

/// A publication request as received from the boundary layer.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishExamRequest {
  pub exam_name:  String,
  pub exam_code:  String,
  pub class_name: String,
  #[serde(alias = "exam_details")]
  pub subjects:   Vec<RawSubjectSchedule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubjectSchedule {
  pub subject_name: String,
  pub exam_date:    String,
  pub start_time:   String,
  pub end_time:     String,
  pub marks:        i64,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Parse a wall-clock time as `HH:MM:SS` or `HH:MM`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
  let s = s.trim();
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    .map_err(|_| Error::validation(format!("invalid time {s:?}, expected HH:MM")))
}

fn required(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(format!("{field} is empty")));
  }
  Ok(())
}

fn validate_subject(position: usize, raw: RawSubjectSchedule) -> Result<NewSubjectSchedule> {
  let at = |e: Error| match e {
    Error::Validation(msg) => Error::validation(format!("subject {position}: {msg}")),
    other => other,
  };

  required("subject_name", &raw.subject_name).map_err(at)?;
  let exam_date = parse_date(&raw.exam_date).map_err(at)?;
  let start_time = parse_time(&raw.start_time).map_err(at)?;
  let end_time = parse_time(&raw.end_time).map_err(at)?;

  if start_time >= end_time {
    return Err(Error::validation(format!(
      "subject {position}: start_time {start_time} is not before end_time {end_time}"
    )));
  }
  if raw.marks <= 0 {
    return Err(Error::validation(format!(
      "subject {position}: marks must be positive, got {}",
      raw.marks
    )));
  }

  Ok(NewSubjectSchedule {
    subject_name: raw.subject_name,
    exam_date,
    start_time,
    end_time,
    marks: raw.marks,
  })
}

/// Validate a whole publication request. Any bad row rejects the request.
pub fn validate(req: PublishExamRequest) -> Result<NewExam> {
  required("exam_name", &req.exam_name)?;
  required("exam_code", &req.exam_code)?;
  required("class_name", &req.class_name)?;
  if req.subjects.is_empty() {
    return Err(Error::validation("an exam needs at least one subject"));
  }

  let subjects = req
    .subjects
    .into_iter()
    .enumerate()
    .map(|(i, raw)| validate_subject(i + 1, raw))
    .collect::<Result<Vec<_>>>()?;

  Ok(NewExam {
    header: ExamHeader {
      exam_code:  req.exam_code.trim().to_owned(),
      exam_name:  req.exam_name,
      class_name: req.class_name,
    },
    subjects,
  })
}

// ─── Publisher ───────────────────────────────────────────────────────────────

pub struct ExamPublisher<S> {
  store: Arc<S>,
}

impl<S> Clone for ExamPublisher<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: SchoolStore> ExamPublisher<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Publish an exam and return its code.
  pub async fn publish(&self, req: PublishExamRequest) -> Result<String> {
    let exam = validate(req)?;
    let subject_count = exam.subjects.len();
    let header = self
      .store
      .publish_exam(exam)
      .await
      .map_err(Error::from_store)?;
    tracing::info!(
      exam_code = %header.exam_code,
      class_name = %header.class_name,
      subjects = subject_count,
      "exam schedule published"
    );
    Ok(header.exam_code)
  }

  pub async fn get(&self, exam_code: &str) -> Result<Exam> {
    self
      .store
      .get_exam(exam_code)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| Error::NotFound(format!("exam {exam_code}")))
  }

  pub async fn list(&self, class_name: Option<&str>) -> Result<Vec<ExamHeader>> {
    self
      .store
      .list_exams(class_name)
      .await
      .map_err(Error::from_store)
  }

  /// Delete an exam together with its schedule rows.
  pub async fn delete(&self, exam_code: &str) -> Result<()> {
    let deleted = self
      .store
      .delete_exam(exam_code.to_owned())
      .await
      .map_err(Error::from_store)?;
    if !deleted {
      return Err(Error::NotFound(format!("exam {exam_code}")));
    }
    tracing::info!(%exam_code, "exam deleted");
    Ok(())
  }

  pub async fn subjects(&self) -> Result<Vec<String>> {
    self.store.list_subjects().await.map_err(Error::from_store)
  }

  pub async fn add_subject(&self, subject_name: &str) -> Result<()> {
    required("subject_name", subject_name)?;
    self
      .store
      .add_subject(subject_name.trim().to_owned())
      .await
      .map_err(Error::from_store)
  }
}
