//! Encoding and decoding helpers between Schola domain types and the plain
//! representations stored in SQLite columns.
//!
//! Calendar dates are `YYYY-MM-DD` text and clock times `HH:MM:SS` text, so
//! lexical order matches chronological order. Login expiry is stored as unix
//! milliseconds. Enumerations use their variant names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use schola_core::{
  attendance::{AttendanceRecord, AttendanceStatus, ClassAttendanceRow},
  exam::ExamSubjectSchedule,
  login::PendingLogin,
  people::{Gender, Student, Teacher},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

pub fn encode_ts(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn decode_ts(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms)
    .ok_or_else(|| Error::Decode(format!("timestamp {ms} out of range")))
}

/// Parse a strum-derived enum from its column text.
fn decode_enum<T: FromStr>(column: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("{column}: unexpected value {s:?}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

fn decode_opt_gender(s: Option<String>) -> Result<Option<Gender>> {
  s.as_deref().map(|g| decode_enum("gender", g)).transpose()
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawStudent::from_row`].
pub const STUDENT_COLUMNS: &str = "
  u.user_id, u.user_name, u.user_email, s.image_url, s.class_name, s.gender,
  s.date_of_birth, s.roll_no, s.age, s.father_name, s.mother_name,
  s.father_mobile_number, s.mother_mobile_number, s.address, s.admission_date";

pub struct RawStudent {
  pub user_id:              String,
  pub student_name:         String,
  pub student_email:        String,
  pub image_url:            Option<String>,
  pub class_name:           String,
  pub gender:               Option<String>,
  pub date_of_birth:        Option<String>,
  pub roll_no:              Option<i64>,
  pub age:                  Option<i64>,
  pub father_name:          Option<String>,
  pub mother_name:          Option<String>,
  pub father_mobile_number: Option<String>,
  pub mother_mobile_number: Option<String>,
  pub address:              Option<String>,
  pub admission_date:       Option<String>,
}

impl RawStudent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:              row.get(0)?,
      student_name:         row.get(1)?,
      student_email:        row.get(2)?,
      image_url:            row.get(3)?,
      class_name:           row.get(4)?,
      gender:               row.get(5)?,
      date_of_birth:        row.get(6)?,
      roll_no:              row.get(7)?,
      age:                  row.get(8)?,
      father_name:          row.get(9)?,
      mother_name:          row.get(10)?,
      father_mobile_number: row.get(11)?,
      mother_mobile_number: row.get(12)?,
      address:              row.get(13)?,
      admission_date:       row.get(14)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      user_id:              self.user_id,
      student_name:         self.student_name,
      student_email:        self.student_email,
      image_url:            self.image_url,
      class_name:           self.class_name,
      gender:               decode_opt_gender(self.gender)?,
      date_of_birth:        decode_opt_date(self.date_of_birth)?,
      roll_no:              self.roll_no,
      age:                  self.age,
      father_name:          self.father_name,
      mother_name:          self.mother_name,
      father_mobile_number: self.father_mobile_number,
      mother_mobile_number: self.mother_mobile_number,
      address:              self.address,
      admission_date:       decode_opt_date(self.admission_date)?,
    })
  }
}

/// Column list matching [`RawTeacher::from_row`].
pub const TEACHER_COLUMNS: &str = "
  u.user_id, u.user_name, u.user_email, t.image_url, t.gender, t.qualification,
  t.age, t.years_of_experience, t.subject_specialization, t.mobile_number,
  t.address, t.bank_account_id, t.class_names";

pub struct RawTeacher {
  pub user_id:                String,
  pub teacher_name:           String,
  pub teacher_email:          String,
  pub image_url:              Option<String>,
  pub gender:                 Option<String>,
  pub qualification:          Option<String>,
  pub age:                    Option<i64>,
  pub years_of_experience:    Option<i64>,
  pub subject_specialization: Option<String>,
  pub mobile_number:          Option<String>,
  pub address:                Option<String>,
  pub bank_account_id:        Option<String>,
  pub class_names:            String,
}

impl RawTeacher {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:                row.get(0)?,
      teacher_name:           row.get(1)?,
      teacher_email:          row.get(2)?,
      image_url:              row.get(3)?,
      gender:                 row.get(4)?,
      qualification:          row.get(5)?,
      age:                    row.get(6)?,
      years_of_experience:    row.get(7)?,
      subject_specialization: row.get(8)?,
      mobile_number:          row.get(9)?,
      address:                row.get(10)?,
      bank_account_id:        row.get(11)?,
      class_names:            row.get(12)?,
    })
  }

  pub fn into_teacher(self) -> Result<Teacher> {
    Ok(Teacher {
      user_id:                self.user_id,
      teacher_name:           self.teacher_name,
      teacher_email:          self.teacher_email,
      image_url:              self.image_url,
      gender:                 decode_opt_gender(self.gender)?,
      qualification:          self.qualification,
      age:                    self.age,
      years_of_experience:    self.years_of_experience,
      subject_specialization: self.subject_specialization,
      mobile_number:          self.mobile_number,
      address:                self.address,
      bank_account_id:        self.bank_account_id,
      class_names:            serde_json::from_str(&self.class_names)?,
    })
  }
}

pub struct RawAttendance {
  pub student_id:      String,
  pub attendance_date: String,
  pub student_name:    String,
  pub status:          String,
}

impl RawAttendance {
  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      student_id:      self.student_id,
      attendance_date: decode_date(&self.attendance_date)?,
      student_name:    self.student_name,
      status:          decode_enum::<AttendanceStatus>("status", &self.status)?,
    })
  }
}

pub struct RawClassRow {
  pub student_id:   String,
  pub student_name: String,
  pub class_name:   String,
  pub status:       Option<String>,
}

impl RawClassRow {
  pub fn into_row(self) -> Result<ClassAttendanceRow> {
    Ok(ClassAttendanceRow {
      student_id:   self.student_id,
      student_name: self.student_name,
      class_name:   self.class_name,
      status:       self
        .status
        .as_deref()
        .map(|s| decode_enum::<AttendanceStatus>("status", s))
        .transpose()?,
    })
  }
}

pub struct RawSchedule {
  pub s_no:         i64,
  pub exam_code:    String,
  pub subject_name: String,
  pub exam_date:    String,
  pub start_time:   String,
  pub end_time:     String,
  pub marks:        i64,
}

impl RawSchedule {
  pub fn into_schedule(self) -> Result<ExamSubjectSchedule> {
    Ok(ExamSubjectSchedule {
      s_no:         self.s_no,
      exam_code:    self.exam_code,
      subject_name: self.subject_name,
      exam_date:    decode_date(&self.exam_date)?,
      start_time:   decode_time(&self.start_time)?,
      end_time:     decode_time(&self.end_time)?,
      marks:        self.marks,
    })
  }
}

pub struct RawPendingLogin {
  pub pending_token: String,
  pub user_id:       String,
  pub email:         String,
  pub code_hash:     String,
  pub expires_at:    i64,
}

impl RawPendingLogin {
  pub fn into_pending(self) -> Result<PendingLogin> {
    Ok(PendingLogin {
      pending_token: decode_uuid(&self.pending_token)?,
      user_id:       self.user_id,
      email:         self.email,
      code_hash:     self.code_hash,
      expires_at:    decode_ts(self.expires_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encoded_times_sort_chronologically() {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let ten = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
    assert!(encode_time(nine) < encode_time(ten));
    assert_eq!(decode_time(&encode_time(ten)).unwrap(), ten);
  }

  #[test]
  fn unknown_status_is_a_decode_error() {
    let raw = RawAttendance {
      student_id:      "s1".into(),
      attendance_date: "2024-03-01".into(),
      student_name:    "Alice".into(),
      status:          "Late".into(),
    };
    assert!(matches!(raw.into_record(), Err(Error::Decode(_))));
  }
}
