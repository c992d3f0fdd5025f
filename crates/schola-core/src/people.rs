//! Users, students and teachers.
//!
//! A [`User`] is the identity/credential record. Students and teachers each
//! extend it through the shared `user_id` key; deleting the user cascades to
//! the extension row and, for students, to their attendance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display,
  EnumString,
)]
pub enum UserRole {
  Teacher,
  Student,
  Principal,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display,
  EnumString,
)]
pub enum Gender {
  Male,
  Female,
  Other,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// The credential record behind every student and teacher.
#[derive(Debug, Clone)]
pub struct User {
  pub user_id:       String,
  pub user_name:     String,
  pub user_email:    String,
  /// argon2 PHC string.
  pub password_hash: String,
  pub user_role:     UserRole,
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  pub user_id:              String,
  pub student_name:         String,
  pub student_email:        String,
  pub image_url:            Option<String>,
  pub class_name:           String,
  pub gender:               Option<Gender>,
  pub date_of_birth:        Option<NaiveDate>,
  pub roll_no:              Option<i64>,
  pub age:                  Option<i64>,
  pub father_name:          Option<String>,
  pub mother_name:          Option<String>,
  pub father_mobile_number: Option<String>,
  pub mother_mobile_number: Option<String>,
  pub address:              Option<String>,
  pub admission_date:       Option<NaiveDate>,
}

/// Enrollment input as it arrives from the boundary layer.
///
/// `user_id` and the image URL are assigned during enrollment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentDetails {
  pub student_name:         String,
  pub student_email:        String,
  pub class_name:           String,
  pub gender:               Option<Gender>,
  pub date_of_birth:        Option<NaiveDate>,
  pub roll_no:              Option<i64>,
  pub age:                  Option<i64>,
  pub father_name:          Option<String>,
  pub mother_name:          Option<String>,
  pub father_mobile_number: Option<String>,
  pub mother_mobile_number: Option<String>,
  pub address:              Option<String>,
  pub admission_date:       Option<NaiveDate>,
}

impl StudentDetails {
  pub fn into_student(self, user_id: String, image_url: Option<String>) -> Student {
    Student {
      user_id,
      student_name: self.student_name,
      student_email: self.student_email,
      image_url,
      class_name: self.class_name,
      gender: self.gender,
      date_of_birth: self.date_of_birth,
      roll_no: self.roll_no,
      age: self.age,
      father_name: self.father_name,
      mother_name: self.mother_name,
      father_mobile_number: self.father_mobile_number,
      mother_mobile_number: self.mother_mobile_number,
      address: self.address,
      admission_date: self.admission_date,
    }
  }
}

/// One row of a class roster when only names are wanted.
#[derive(Debug, Clone, Serialize)]
pub struct StudentName {
  pub user_id:      String,
  pub student_name: String,
}

// ─── Teacher ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
  pub user_id:                String,
  pub teacher_name:           String,
  pub teacher_email:          String,
  pub image_url:              Option<String>,
  pub gender:                 Option<Gender>,
  pub qualification:          Option<String>,
  pub age:                    Option<i64>,
  pub years_of_experience:    Option<i64>,
  pub subject_specialization: Option<String>,
  pub mobile_number:          Option<String>,
  pub address:                Option<String>,
  pub bank_account_id:        Option<String>,
  pub class_names:            Vec<String>,
}

impl Teacher {
  /// A teacher with only the required fields set.
  pub fn new(user_id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      user_id:                user_id.into(),
      teacher_name:           name.into(),
      teacher_email:          email.into(),
      image_url:              None,
      gender:                 None,
      qualification:          None,
      age:                    None,
      years_of_experience:    None,
      subject_specialization: None,
      mobile_number:          None,
      address:                None,
      bank_account_id:        None,
      class_names:            Vec::new(),
    }
  }
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherProfileUpdate {
  pub teacher_name:    Option<String>,
  pub age:             Option<i64>,
  pub gender:          Option<Gender>,
  pub qualification:   Option<String>,
  pub bank_account_id: Option<String>,
  pub address:         Option<String>,
}

impl TeacherProfileUpdate {
  pub fn apply(self, teacher: &mut Teacher) {
    if let Some(name) = self.teacher_name {
      teacher.teacher_name = name;
    }
    if self.age.is_some() {
      teacher.age = self.age;
    }
    if self.gender.is_some() {
      teacher.gender = self.gender;
    }
    if self.qualification.is_some() {
      teacher.qualification = self.qualification;
    }
    if self.bank_account_id.is_some() {
      teacher.bank_account_id = self.bank_account_id;
    }
    if self.address.is_some() {
      teacher.address = self.address;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profile_update_only_touches_present_fields() {
    let mut teacher = Teacher::new("t1", "Ada", "ada@school.test");
    teacher.address = Some("Old Street".into());

    TeacherProfileUpdate {
      age: Some(41),
      qualification: Some("MSc".into()),
      ..Default::default()
    }
    .apply(&mut teacher);

    assert_eq!(teacher.teacher_name, "Ada");
    assert_eq!(teacher.age, Some(41));
    assert_eq!(teacher.qualification.as_deref(), Some("MSc"));
    assert_eq!(teacher.address.as_deref(), Some("Old Street"));
  }

  #[test]
  fn gender_parses_from_column_text() {
    assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
    assert!("female".parse::<Gender>().is_err());
    assert_eq!(UserRole::Teacher.as_ref(), "Teacher");
  }
}
