//! [`SqliteStore`], the SQLite implementation of [`SchoolStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use schola_core::{
  attendance::{
    AttendanceEntry, AttendanceRecord, ClassAttendanceRow, ReconcileOutcome,
    StatusChange,
  },
  exam::{Exam, ExamHeader, NewExam},
  login::PendingLogin,
  people::{Student, StudentName, Teacher, TeacherProfileUpdate, User},
  store::SchoolStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAttendance, RawClassRow, RawPendingLogin, RawSchedule, RawStudent,
    RawTeacher, STUDENT_COLUMNS, TEACHER_COLUMNS, encode_date, encode_time,
    encode_ts, encode_uuid,
  },
  schema::SCHEMA,
};

/// Whether a failed statement hit a UNIQUE or PRIMARY KEY constraint.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

fn insert_user(
  conn: &rusqlite::Connection,
  user: &User,
) -> rusqlite::Result<std::result::Result<(), Error>> {
  let inserted = conn.execute(
    "INSERT INTO users (user_id, user_name, user_email, password_hash, user_role)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      user.user_id,
      user.user_name,
      user.user_email,
      user.password_hash,
      user.user_role.as_ref(),
    ],
  );
  match inserted {
    Ok(_) => Ok(Ok(())),
    Err(e) if is_unique_violation(&e) => {
      Ok(Err(Error::DuplicateEmail(user.user_email.clone())))
    }
    Err(e) => Err(e),
  }
}

fn select_teacher(
  conn: &rusqlite::Connection,
  user_id: &str,
) -> rusqlite::Result<Option<RawTeacher>> {
  conn
    .query_row(
      &format!(
        "SELECT {TEACHER_COLUMNS}
         FROM teachers t JOIN users u ON u.user_id = t.user_id
         WHERE t.user_id = ?1"
      ),
      rusqlite::params![user_id],
      RawTeacher::from_row,
    )
    .optional()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Schola store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SchoolStore impl ────────────────────────────────────────────────────────

impl SchoolStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_teacher(&self, user: User, teacher: Teacher) -> Result<Teacher> {
    let class_names = serde_json::to_string(&teacher.class_names)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = insert_user(&tx, &user)? {
          return Ok(Err(e));
        }
        tx.execute(
          "INSERT INTO teachers (
             user_id, image_url, gender, qualification, age, years_of_experience,
             subject_specialization, mobile_number, address, bank_account_id,
             class_names
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            teacher.user_id,
            teacher.image_url,
            teacher.gender.map(|g| g.to_string()),
            teacher.qualification,
            teacher.age,
            teacher.years_of_experience,
            teacher.subject_specialization,
            teacher.mobile_number,
            teacher.address,
            teacher.bank_account_id,
            class_names,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(teacher))
      })
      .await?
  }

  async fn find_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>> {
    let email = email.to_owned();

    let raw: Option<RawTeacher> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {TEACHER_COLUMNS}
                 FROM teachers t JOIN users u ON u.user_id = t.user_id
                 WHERE u.user_email = ?1 AND u.user_role = 'Teacher'"
              ),
              rusqlite::params![email],
              RawTeacher::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTeacher::into_teacher).transpose()
  }

  async fn get_teacher(&self, user_id: &str) -> Result<Option<Teacher>> {
    let user_id = user_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(select_teacher(conn, &user_id)?))
      .await?;

    raw.map(RawTeacher::into_teacher).transpose()
  }

  async fn update_teacher_profile(
    &self,
    user_id: String,
    update: TeacherProfileUpdate,
  ) -> Result<Option<Teacher>> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = select_teacher(&tx, &user_id)? else {
          return Ok(Ok(None));
        };
        let mut teacher = match raw.into_teacher() {
          Ok(t) => t,
          Err(e) => return Ok(Err(e)),
        };
        update.apply(&mut teacher);

        tx.execute(
          "UPDATE users SET user_name = ?2 WHERE user_id = ?1",
          rusqlite::params![teacher.user_id, teacher.teacher_name],
        )?;
        tx.execute(
          "UPDATE teachers
           SET age = ?2, gender = ?3, qualification = ?4, bank_account_id = ?5,
               address = ?6
           WHERE user_id = ?1",
          rusqlite::params![
            teacher.user_id,
            teacher.age,
            teacher.gender.map(|g| g.to_string()),
            teacher.qualification,
            teacher.bank_account_id,
            teacher.address,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(Some(teacher)))
      })
      .await?
  }

  async fn add_student(&self, user: User, student: Student) -> Result<Student> {
    let date_of_birth = student.date_of_birth.map(encode_date);
    let admission_date = student.admission_date.map(encode_date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = insert_user(&tx, &user)? {
          return Ok(Err(e));
        }
        tx.execute(
          "INSERT INTO students (
             user_id, class_name, image_url, gender, date_of_birth, roll_no, age,
             father_name, mother_name, father_mobile_number, mother_mobile_number,
             address, admission_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            student.user_id,
            student.class_name,
            student.image_url,
            student.gender.map(|g| g.to_string()),
            date_of_birth,
            student.roll_no,
            student.age,
            student.father_name,
            student.mother_name,
            student.father_mobile_number,
            student.mother_mobile_number,
            student.address,
            admission_date,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(student))
      })
      .await?
  }

  async fn get_student(&self, user_id: &str) -> Result<Option<Student>> {
    let user_id = user_id.to_owned();

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {STUDENT_COLUMNS}
                 FROM students s JOIN users u ON u.user_id = s.user_id
                 WHERE s.user_id = ?1"
              ),
              rusqlite::params![user_id],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn list_students(&self, class_name: &str) -> Result<Vec<Student>> {
    let class_name = class_name.to_owned();

    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STUDENT_COLUMNS}
           FROM students s JOIN users u ON u.user_id = s.user_id
           WHERE s.class_name = ?1
           ORDER BY s.roll_no IS NULL, s.roll_no, u.user_name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![class_name], RawStudent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_student).collect()
  }

  async fn student_names(&self, class_name: &str) -> Result<Vec<StudentName>> {
    let class_name = class_name.to_owned();

    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT u.user_id, u.user_name
           FROM students s JOIN users u ON u.user_id = s.user_id
           WHERE s.class_name = ?1
           ORDER BY s.roll_no IS NULL, s.roll_no, u.user_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![class_name], |row| {
            Ok(StudentName { user_id: row.get(0)?, student_name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn submit_attendance(
    &self,
    date: NaiveDate,
    entries: Vec<AttendanceEntry>,
  ) -> Result<ReconcileOutcome> {
    let date_str = encode_date(date);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outcome = ReconcileOutcome::default();
        {
          let mut known = tx.prepare("SELECT 1 FROM students WHERE user_id = ?1")?;
          let mut update = tx.prepare(
            "UPDATE students_attendance SET status = ?3
             WHERE user_id = ?1 AND attendance_date = ?2",
          )?;
          let mut insert = tx.prepare(
            "INSERT INTO students_attendance (user_id, attendance_date, user_name, status)
             VALUES (?1, ?2, ?3, ?4)",
          )?;

          for entry in entries {
            if !known.exists(rusqlite::params![entry.student_id])? {
              return Ok(Err(Error::UnknownStudent(entry.student_id)));
            }
            let status = entry.status.as_ref();
            let changed =
              update.execute(rusqlite::params![entry.student_id, date_str, status])?;
            if changed == 0 {
              insert.execute(rusqlite::params![
                entry.student_id,
                date_str,
                entry.student_name,
                status,
              ])?;
              outcome.inserted += 1;
            } else {
              outcome.updated += 1;
            }
          }
        }
        tx.commit()?;
        Ok(Ok(outcome))
      })
      .await?
  }

  async fn modify_attendance(
    &self,
    date: NaiveDate,
    changes: Vec<StatusChange>,
  ) -> Result<ReconcileOutcome> {
    let date_str = encode_date(date);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outcome = ReconcileOutcome::default();
        {
          let mut update = tx.prepare(
            "UPDATE students_attendance SET status = ?3
             WHERE user_id = ?1 AND attendance_date = ?2",
          )?;
          for change in changes {
            let changed = update.execute(rusqlite::params![
              change.student_id,
              date_str,
              change.status.as_ref(),
            ])?;
            if changed == 0 {
              outcome.skipped.push(change.student_id);
            } else {
              outcome.updated += 1;
            }
          }
        }
        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    Ok(outcome)
  }

  async fn get_attendance(
    &self,
    student_id: &str,
    date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let student_id = student_id.to_owned();
    let date_str = encode_date(date);

    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, attendance_date, user_name, status
               FROM students_attendance
               WHERE user_id = ?1 AND attendance_date = ?2",
              rusqlite::params![student_id, date_str],
              |row| {
                Ok(RawAttendance {
                  student_id:      row.get(0)?,
                  attendance_date: row.get(1)?,
                  student_name:    row.get(2)?,
                  status:          row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttendance::into_record).transpose()
  }

  async fn class_attendance(
    &self,
    class_name: &str,
    date: NaiveDate,
  ) -> Result<Vec<ClassAttendanceRow>> {
    let class_name = class_name.to_owned();
    let date_str = encode_date(date);

    let raws: Vec<RawClassRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.user_id, u.user_name, s.class_name, a.status
           FROM students s
           JOIN users u ON u.user_id = s.user_id
           LEFT JOIN students_attendance a
             ON a.user_id = s.user_id AND a.attendance_date = ?2
           WHERE s.class_name = ?1
           ORDER BY s.roll_no IS NULL, s.roll_no, u.user_name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![class_name, date_str], |row| {
            Ok(RawClassRow {
              student_id:   row.get(0)?,
              student_name: row.get(1)?,
              class_name:   row.get(2)?,
              status:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawClassRow::into_row).collect()
  }

  // ── Exams ─────────────────────────────────────────────────────────────────

  async fn publish_exam(&self, exam: NewExam) -> Result<ExamHeader> {
    let schedules: Vec<_> = exam
      .subjects
      .iter()
      .map(|s| {
        (
          s.subject_name.clone(),
          encode_date(s.exam_date),
          encode_time(s.start_time),
          encode_time(s.end_time),
          s.marks,
        )
      })
      .collect();
    let header = exam.header;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO exams (exam_code, exam_name, class_name) VALUES (?1, ?2, ?3)",
          rusqlite::params![header.exam_code, header.exam_name, header.class_name],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Ok(Err(Error::DuplicateExamCode(header.exam_code)));
          }
          Err(e) => return Err(e.into()),
        }
        {
          let mut insert = tx.prepare(
            "INSERT INTO exam_subjects (
               exam_code, subject_name, exam_date, start_time, end_time, marks
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (subject_name, exam_date, start_time, end_time, marks) in schedules {
            insert.execute(rusqlite::params![
              header.exam_code,
              subject_name,
              exam_date,
              start_time,
              end_time,
              marks,
            ])?;
          }
        }
        tx.commit()?;
        Ok(Ok(header))
      })
      .await?
  }

  async fn get_exam(&self, exam_code: &str) -> Result<Option<Exam>> {
    let exam_code = exam_code.to_owned();

    let found: Option<(ExamHeader, Vec<RawSchedule>)> = self
      .conn
      .call(move |conn| {
        let header = conn
          .query_row(
            "SELECT exam_code, exam_name, class_name FROM exams WHERE exam_code = ?1",
            rusqlite::params![exam_code],
            |row| {
              Ok(ExamHeader {
                exam_code:  row.get(0)?,
                exam_name:  row.get(1)?,
                class_name: row.get(2)?,
              })
            },
          )
          .optional()?;
        let Some(header) = header else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT s_no, exam_code, subject_name, exam_date, start_time, end_time, marks
           FROM exam_subjects
           WHERE exam_code = ?1
           ORDER BY exam_date, start_time, s_no",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![header.exam_code], |row| {
            Ok(RawSchedule {
              s_no:         row.get(0)?,
              exam_code:    row.get(1)?,
              subject_name: row.get(2)?,
              exam_date:    row.get(3)?,
              start_time:   row.get(4)?,
              end_time:     row.get(5)?,
              marks:        row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some((header, rows)))
      })
      .await?;

    let Some((header, raws)) = found else {
      return Ok(None);
    };
    let subjects = raws
      .into_iter()
      .map(RawSchedule::into_schedule)
      .collect::<Result<_>>()?;
    Ok(Some(Exam { header, subjects }))
  }

  async fn list_exams(&self, class_name: Option<&str>) -> Result<Vec<ExamHeader>> {
    let class_name = class_name.map(str::to_owned);

    let headers = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT exam_code, exam_name, class_name FROM exams
           WHERE ?1 IS NULL OR class_name = ?1
           ORDER BY s_no",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![class_name], |row| {
            Ok(ExamHeader {
              exam_code:  row.get(0)?,
              exam_name:  row.get(1)?,
              class_name: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(headers)
  }

  async fn delete_exam(&self, exam_code: String) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM exam_subjects WHERE exam_code = ?1",
          rusqlite::params![exam_code],
        )?;
        let n = tx.execute(
          "DELETE FROM exams WHERE exam_code = ?1",
          rusqlite::params![exam_code],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    Ok(deleted)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn list_subjects(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT subject_name FROM subjects ORDER BY subject_name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(names)
  }

  async fn add_subject(&self, subject_name: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO subjects (subject_name) VALUES (?1)",
          rusqlite::params![subject_name],
        );
        match inserted {
          Ok(_) => Ok(Ok(())),
          Err(e) if is_unique_violation(&e) => {
            Ok(Err(Error::DuplicateSubject(subject_name)))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?
  }

  // ── Pending login codes ───────────────────────────────────────────────────

  async fn insert_pending_login(&self, pending: PendingLogin) -> Result<()> {
    let token = encode_uuid(pending.pending_token);
    let expires_at = encode_ts(pending.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pending_logins (pending_token, user_id, email, code_hash, expires_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            token,
            pending.user_id,
            pending.email,
            pending.code_hash,
            expires_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn take_pending_login(&self, token: Uuid) -> Result<Option<PendingLogin>> {
    let token = encode_uuid(token);

    let raw: Option<RawPendingLogin> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "DELETE FROM pending_logins WHERE pending_token = ?1
               RETURNING pending_token, user_id, email, code_hash, expires_at",
              rusqlite::params![token],
              |row| {
                Ok(RawPendingLogin {
                  pending_token: row.get(0)?,
                  user_id:       row.get(1)?,
                  email:         row.get(2)?,
                  code_hash:     row.get(3)?,
                  expires_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPendingLogin::into_pending).transpose()
  }

  async fn purge_expired_logins(&self, now: DateTime<Utc>) -> Result<usize> {
    let now = encode_ts(now);

    let purged = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM pending_logins WHERE expires_at <= ?1",
          rusqlite::params![now],
        )?)
      })
      .await?;

    Ok(purged)
  }
}
