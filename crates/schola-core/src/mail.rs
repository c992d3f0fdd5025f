//! HTML bodies for the mails Schola sends.

use crate::ports::OutgoingMail;

const PRODUCT: &str = "School Management System";

/// Escape text for interpolation into an HTML body.
fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      c => out.push(c),
    }
  }
  out
}

/// The mail carrying a 4-digit login code.
pub fn login_code(to: &str, teacher_name: &str, code: &str, ttl_minutes: i64) -> OutgoingMail {
  let (teacher_name, code) = (escape(teacher_name), escape(code));
  OutgoingMail {
    to:         to.to_owned(),
    subject:    format!("Your {PRODUCT} login code"),
    html_body:  format!(
      "<h2>Hello, {teacher_name}</h2>\n\
       <p>Use this code to finish signing in:</p>\n\
       <p style=\"font-size: 24px; letter-spacing: 4px;\"><strong>{code}</strong></p>\n\
       <p>The code expires in {ttl_minutes} minutes and can be used once.</p>\n\
       <p>If you did not try to sign in, you can ignore this email.</p>"
    ),
    attachment: None,
  }
}

/// The welcome mail sent to a newly enrolled account.
pub fn welcome(to: &str, user_name: &str, password: &str, role: &str) -> OutgoingMail {
  let subject = format!("Welcome to the {PRODUCT}, {role}!");
  let (email, user_name, password, role) =
    (escape(to), escape(user_name), escape(password), escape(role));
  OutgoingMail {
    to:         to.to_owned(),
    subject,
    html_body:  format!(
      "<h1>Welcome, {user_name}!</h1>\n\
       <p>Your account has been created with the role of <b>{role}</b>.</p>\n\
       <p>You can now login using:</p>\n\
       <p><b>Email:</b> {email}</p>\n\
       <p><b>Password:</b> {password}</p>\n\
       <p>Thank you for joining!</p>"
    ),
    attachment: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn login_mail_carries_the_code() {
    let mail = login_code("t@school.test", "Ada", "0427", 5);
    assert_eq!(mail.to, "t@school.test");
    assert!(mail.html_body.contains("<strong>0427</strong>"));
    assert!(mail.html_body.contains("5 minutes"));
  }

  #[test]
  fn names_cannot_inject_markup() {
    let mail = welcome("a@school.test", "<img src=x>Bob & \"Co\"", "p<w>", "Student");
    assert!(mail.html_body.contains("Welcome, &lt;img src=x&gt;Bob &amp; &quot;Co&quot;!"));
    assert!(mail.html_body.contains("<b>Password:</b> p&lt;w&gt;"));
    assert!(!mail.html_body.contains("<img"));
  }
}
