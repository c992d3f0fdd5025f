//! Student enrollment and lookups.

use std::sync::Arc;

use rand_core::OsRng;
use uuid::Uuid;

use crate::{
  Error, Result, mail, password,
  people::{Student, StudentDetails, StudentName, User, UserRole},
  ports::{ImageStore, MailSender, Photo},
  store::SchoolStore,
};

pub struct StudentRegistry<S> {
  store:  Arc<S>,
  images: Arc<dyn ImageStore>,
  mailer: Arc<dyn MailSender>,
}

impl<S> Clone for StudentRegistry<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      images: Arc::clone(&self.images),
      mailer: Arc::clone(&self.mailer),
    }
  }
}

fn validate(details: &StudentDetails) -> Result<()> {
  if details.student_name.trim().is_empty() {
    return Err(Error::validation("student_name is empty"));
  }
  if !details.student_email.contains('@') {
    return Err(Error::validation(format!(
      "invalid student_email {:?}",
      details.student_email
    )));
  }
  if details.class_name.trim().is_empty() {
    return Err(Error::validation("class_name is empty"));
  }
  Ok(())
}

impl<S: SchoolStore> StudentRegistry<S> {
  pub fn new(store: Arc<S>, images: Arc<dyn ImageStore>, mailer: Arc<dyn MailSender>) -> Self {
    Self { store, images, mailer }
  }

  /// Create the user and student rows, uploading the photo first.
  ///
  /// A failed upload aborts before anything is written. The welcome mail is
  /// best-effort.
  pub async fn enroll(&self, mut details: StudentDetails, photo: Option<Photo>) -> Result<Student> {
    details.student_email = details.student_email.trim().to_owned();
    validate(&details)?;

    let image_url = match photo {
      Some(photo) => Some(self.images.upload(photo).await.map_err(|e| {
        tracing::error!(error = %e, "student photo upload failed");
        Error::Delivery { service: "image store", message: e.to_string() }
      })?),
      None => None,
    };

    let temporary = password::generate(&mut OsRng);
    let user = User {
      user_id:       Uuid::new_v4().to_string(),
      user_name:     details.student_name.clone(),
      user_email:    details.student_email.clone(),
      password_hash: password::hash(&temporary)?,
      user_role:     UserRole::Student,
    };
    let student = details.into_student(user.user_id.clone(), image_url);

    let student = self
      .store
      .add_student(user, student)
      .await
      .map_err(Error::from_store)?;
    tracing::info!(user_id = %student.user_id, class_name = %student.class_name, "student enrolled");

    let welcome = mail::welcome(
      &student.student_email,
      &student.student_name,
      &temporary,
      UserRole::Student.as_ref(),
    );
    if let Err(e) = self.mailer.send(welcome).await {
      tracing::warn!(error = %e, user_id = %student.user_id, "welcome mail not delivered");
    }

    Ok(student)
  }

  pub async fn get(&self, user_id: &str) -> Result<Student> {
    self
      .store
      .get_student(user_id)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| Error::NotFound(format!("student {user_id}")))
  }

  pub async fn list(&self, class_name: &str) -> Result<Vec<Student>> {
    self
      .store
      .list_students(class_name)
      .await
      .map_err(Error::from_store)
  }

  pub async fn names(&self, class_name: &str) -> Result<Vec<StudentName>> {
    self
      .store
      .student_names(class_name)
      .await
      .map_err(Error::from_store)
  }
}
