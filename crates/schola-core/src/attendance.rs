//! Attendance records and the reconciler that merges submitted batches into
//! them.
//!
//! A record is keyed by (student, calendar date). The first submission for a
//! date creates it; later submissions and corrections only change its status.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, store::SchoolStore};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  AsRefStr, Display, EnumString,
)]
pub enum AttendanceStatus {
  Present,
  #[default]
  Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub student_id:      String,
  pub attendance_date: NaiveDate,
  pub student_name:    String,
  pub status:          AttendanceStatus,
}

/// A validated entry of a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
  pub student_id:   String,
  pub student_name: String,
  pub status:       AttendanceStatus,
}

/// A validated entry of a modification batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
  pub student_id: String,
  pub status:     AttendanceStatus,
}

/// A batch entry as received; `status` is still free text.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttendanceEntry {
  #[serde(alias = "user_id")]
  pub student_id:   String,
  #[serde(alias = "user_name")]
  pub student_name: String,
  pub status:       String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusChange {
  #[serde(alias = "user_id")]
  pub student_id: String,
  pub status:     String,
}

/// What a reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
  pub inserted: usize,
  pub updated:  usize,
  /// Student ids skipped because no record existed (modify path only).
  pub skipped:  Vec<String>,
}

/// One student of a class with their status on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassAttendanceRow {
  pub student_id:   String,
  pub student_name: String,
  pub class_name:   String,
  /// `None` when nothing was recorded for that date.
  pub status:       Option<AttendanceStatus>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|_| Error::validation(format!("invalid date {s:?}, expected YYYY-MM-DD")))
}

pub fn parse_status(s: &str) -> Result<AttendanceStatus> {
  s.parse()
    .map_err(|_| Error::validation(format!("invalid status {s:?}, expected Present or Absent")))
}

fn status_at(position: usize, s: &str) -> Result<AttendanceStatus> {
  parse_status(s).map_err(|_| {
    Error::validation(format!(
      "entry {position}: invalid status {s:?}, expected Present or Absent"
    ))
  })
}

fn require_id(position: usize, student_id: &str) -> Result<()> {
  if student_id.trim().is_empty() {
    return Err(Error::validation(format!("entry {position}: student_id is empty")));
  }
  Ok(())
}

/// Validate a whole submission batch. A single bad entry rejects the batch.
pub fn validate_submission(
  date: &str,
  entries: Vec<RawAttendanceEntry>,
) -> Result<(NaiveDate, Vec<AttendanceEntry>)> {
  let date = parse_date(date)?;
  let entries = entries
    .into_iter()
    .enumerate()
    .map(|(i, raw)| {
      let position = i + 1;
      require_id(position, &raw.student_id)?;
      if raw.student_name.trim().is_empty() {
        return Err(Error::validation(format!("entry {position}: student_name is empty")));
      }
      let status = status_at(position, &raw.status)?;
      Ok(AttendanceEntry {
        student_id: raw.student_id,
        student_name: raw.student_name,
        status,
      })
    })
    .collect::<Result<Vec<_>>>()?;
  Ok((date, entries))
}

/// Validate a modification batch with the same abort-on-invalid policy.
pub fn validate_modification(
  date: &str,
  changes: Vec<RawStatusChange>,
) -> Result<(NaiveDate, Vec<StatusChange>)> {
  let date = parse_date(date)?;
  let changes = changes
    .into_iter()
    .enumerate()
    .map(|(i, raw)| {
      let position = i + 1;
      require_id(position, &raw.student_id)?;
      let status = status_at(position, &raw.status)?;
      Ok(StatusChange { student_id: raw.student_id, status })
    })
    .collect::<Result<Vec<_>>>()?;
  Ok((date, changes))
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

pub struct AttendanceReconciler<S> {
  store: Arc<S>,
}

impl<S> Clone for AttendanceReconciler<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: SchoolStore> AttendanceReconciler<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Insert-or-update every entry for `date`; all-or-nothing.
  pub async fn submit(
    &self,
    date: &str,
    entries: Vec<RawAttendanceEntry>,
  ) -> Result<ReconcileOutcome> {
    let (date, entries) = validate_submission(date, entries)?;
    let outcome = self
      .store
      .submit_attendance(date, entries)
      .await
      .map_err(Error::from_store)?;
    tracing::info!(
      %date,
      inserted = outcome.inserted,
      updated = outcome.updated,
      "attendance submitted"
    );
    Ok(outcome)
  }

  /// Update the status of existing records only; missing ones are skipped.
  pub async fn modify(
    &self,
    date: &str,
    changes: Vec<RawStatusChange>,
  ) -> Result<ReconcileOutcome> {
    let (date, changes) = validate_modification(date, changes)?;
    let outcome = self
      .store
      .modify_attendance(date, changes)
      .await
      .map_err(Error::from_store)?;
    for student_id in &outcome.skipped {
      tracing::warn!(%student_id, %date, "no attendance record, skipping update");
    }
    tracing::info!(%date, updated = outcome.updated, "attendance modified");
    Ok(outcome)
  }

  pub async fn get(&self, student_id: &str, date: &str) -> Result<Option<AttendanceRecord>> {
    let date = parse_date(date)?;
    self
      .store
      .get_attendance(student_id, date)
      .await
      .map_err(Error::from_store)
  }

  pub async fn class_attendance(
    &self,
    class_name: &str,
    date: NaiveDate,
  ) -> Result<Vec<ClassAttendanceRow>> {
    self
      .store
      .class_attendance(class_name, date)
      .await
      .map_err(Error::from_store)
  }
}
