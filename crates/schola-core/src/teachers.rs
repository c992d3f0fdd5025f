//! Teacher provisioning and profiles.

use std::sync::Arc;

use rand_core::OsRng;
use uuid::Uuid;

use crate::{
  Error, Result, mail, password,
  people::{Teacher, TeacherProfileUpdate, User, UserRole},
  ports::MailSender,
  store::SchoolStore,
};

pub struct TeacherProfiles<S> {
  store:  Arc<S>,
  mailer: Arc<dyn MailSender>,
}

impl<S> Clone for TeacherProfiles<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), mailer: Arc::clone(&self.mailer) }
  }
}

impl<S: SchoolStore> TeacherProfiles<S> {
  pub fn new(store: Arc<S>, mailer: Arc<dyn MailSender>) -> Self { Self { store, mailer } }

  /// Create a teacher account. The temporary password is mailed best-effort;
  /// teachers sign in with emailed codes, so a lost mail is not fatal.
  pub async fn provision(&self, name: &str, email: &str) -> Result<Teacher> {
    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() {
      return Err(Error::validation("teacher name is empty"));
    }
    if !email.contains('@') {
      return Err(Error::validation(format!("invalid teacher email {email:?}")));
    }

    let temporary = password::generate(&mut OsRng);
    let user = User {
      user_id:       Uuid::new_v4().to_string(),
      user_name:     name.to_owned(),
      user_email:    email.to_owned(),
      password_hash: password::hash(&temporary)?,
      user_role:     UserRole::Teacher,
    };
    let teacher = Teacher::new(user.user_id.clone(), name, email);

    let teacher = self
      .store
      .add_teacher(user, teacher)
      .await
      .map_err(Error::from_store)?;
    tracing::info!(user_id = %teacher.user_id, "teacher provisioned");

    let welcome = mail::welcome(email, name, &temporary, UserRole::Teacher.as_ref());
    if let Err(e) = self.mailer.send(welcome).await {
      tracing::warn!(error = %e, user_id = %teacher.user_id, "welcome mail not delivered");
    }
    Ok(teacher)
  }

  pub async fn get(&self, user_id: &str) -> Result<Teacher> {
    self
      .store
      .get_teacher(user_id)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| Error::NotFound(format!("teacher {user_id}")))
  }

  pub async fn update(&self, user_id: &str, update: TeacherProfileUpdate) -> Result<Teacher> {
    if update.teacher_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::validation("teacher_name is empty"));
    }
    if update.age.is_some_and(|age| age <= 0) {
      return Err(Error::validation("age must be positive"));
    }
    let teacher = self
      .store
      .update_teacher_profile(user_id.to_owned(), update)
      .await
      .map_err(Error::from_store)?
      .ok_or_else(|| Error::NotFound(format!("teacher {user_id}")))?;
    tracing::info!(%user_id, "teacher profile updated");
    Ok(teacher)
  }
}
