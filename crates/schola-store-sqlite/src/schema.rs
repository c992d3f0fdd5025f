//! SQL schema for the Schola SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout version for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    user_name     TEXT NOT NULL,
    user_email    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    user_role     TEXT NOT NULL CHECK (user_role IN ('Teacher', 'Student', 'Principal'))
);

CREATE TABLE IF NOT EXISTS teachers (
    user_id                TEXT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    image_url              TEXT,
    gender                 TEXT,
    qualification          TEXT,
    age                    INTEGER,
    years_of_experience    INTEGER,
    subject_specialization TEXT,
    mobile_number          TEXT,
    address                TEXT,
    bank_account_id        TEXT,
    class_names            TEXT NOT NULL DEFAULT '[]'   -- JSON array
);

CREATE TABLE IF NOT EXISTS students (
    user_id              TEXT PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    class_name           TEXT NOT NULL,
    image_url            TEXT,
    gender               TEXT,
    date_of_birth        TEXT,       -- YYYY-MM-DD
    roll_no              INTEGER,
    age                  INTEGER,
    father_name          TEXT,
    mother_name          TEXT,
    father_mobile_number TEXT,
    mother_mobile_number TEXT,
    address              TEXT,
    admission_date       TEXT        -- YYYY-MM-DD
);

-- One row per student per calendar day. user_name is captured on first
-- submission and never rewritten.
CREATE TABLE IF NOT EXISTS students_attendance (
    user_id         TEXT NOT NULL REFERENCES students(user_id) ON DELETE CASCADE,
    attendance_date TEXT NOT NULL,   -- YYYY-MM-DD
    user_name       TEXT NOT NULL,
    status          TEXT NOT NULL CHECK (status IN ('Present', 'Absent')),
    PRIMARY KEY (user_id, attendance_date)
);

CREATE TABLE IF NOT EXISTS exams (
    s_no       INTEGER PRIMARY KEY AUTOINCREMENT,
    exam_code  TEXT NOT NULL UNIQUE,
    exam_name  TEXT NOT NULL,
    class_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS exam_subjects (
    s_no         INTEGER PRIMARY KEY AUTOINCREMENT,
    exam_code    TEXT NOT NULL REFERENCES exams(exam_code) ON DELETE CASCADE,
    subject_name TEXT NOT NULL,
    exam_date    TEXT NOT NULL,      -- YYYY-MM-DD
    start_time   TEXT NOT NULL,      -- HH:MM:SS
    end_time     TEXT NOT NULL,      -- HH:MM:SS
    marks        INTEGER NOT NULL CHECK (marks > 0),
    CHECK (start_time < end_time)
);

CREATE TABLE IF NOT EXISTS subjects (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS pending_logins (
    pending_token TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    email         TEXT NOT NULL,
    code_hash     TEXT NOT NULL,
    expires_at    INTEGER NOT NULL   -- unix milliseconds
);

CREATE INDEX IF NOT EXISTS students_class_idx       ON students(class_name);
CREATE INDEX IF NOT EXISTS attendance_date_idx      ON students_attendance(attendance_date);
CREATE INDEX IF NOT EXISTS exam_subjects_code_idx   ON exam_subjects(exam_code);
CREATE INDEX IF NOT EXISTS pending_logins_exp_idx   ON pending_logins(expires_at);

PRAGMA user_version = 1;
";
