//! SMTP delivery through `lettre`.

use async_trait::async_trait;
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use schola_core::ports::{CollaboratorError, MailSender, OutgoingMail};

use crate::SmtpConfig;

/// Sends mail through an authenticated STARTTLS relay.
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
      .port(cfg.port)
      .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
      .build();
    let from = cfg
      .from
      .parse()
      .map_err(|e| anyhow::anyhow!("invalid smtp.from {:?}: {e}", cfg.from))?;
    Ok(Self { transport, from })
  }
}

/// Build the MIME message. An attachment turns the body into a
/// `multipart/related` with the attachment inline.
pub fn build_message(from: &Mailbox, mail: OutgoingMail) -> Result<Message, CollaboratorError> {
  let to: Mailbox = mail.to.parse().map_err(CollaboratorError::new)?;
  let builder = Message::builder()
    .from(from.clone())
    .to(to)
    .subject(mail.subject);

  let message = match mail.attachment {
    None => builder
      .header(ContentType::TEXT_HTML)
      .body(mail.html_body),
    Some(attachment) => {
      let content_type =
        ContentType::parse(&attachment.content_type).map_err(CollaboratorError::new)?;
      builder.multipart(
        MultiPart::related()
          .singlepart(SinglePart::html(mail.html_body))
          .singlepart(
            Attachment::new_inline(attachment.content_id)
              .body(attachment.bytes, content_type),
          ),
      )
    }
  };
  message.map_err(CollaboratorError::new)
}

#[async_trait]
impl MailSender for SmtpMailer {
  async fn send(&self, mail: OutgoingMail) -> Result<(), CollaboratorError> {
    let to = mail.to.clone();
    let message = build_message(&self.from, mail)?;
    self
      .transport
      .send(message)
      .await
      .map_err(CollaboratorError::new)?;
    tracing::debug!(%to, "mail delivered to relay");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use schola_core::ports::Attachment as InlineAttachment;

  use super::*;

  fn from() -> Mailbox { "Schola <no-reply@school.test>".parse().unwrap() }

  fn mail() -> OutgoingMail {
    OutgoingMail {
      to:         "ada@school.test".into(),
      subject:    "Your login code".into(),
      html_body:  "<p><strong>0420</strong></p>".into(),
      attachment: None,
    }
  }

  #[test]
  fn plain_html_message() {
    let raw = String::from_utf8(build_message(&from(), mail()).unwrap().formatted()).unwrap();
    assert!(raw.contains("To: ada@school.test"));
    assert!(raw.contains("Content-Type: text/html"));
    assert!(raw.contains("0420"));
  }

  #[test]
  fn attachment_goes_inline() {
    let mut m = mail();
    m.attachment = Some(InlineAttachment {
      content_id:   "qr".into(),
      content_type: "image/png".into(),
      bytes:        vec![0x89, b'P', b'N', b'G'],
    });
    let raw = String::from_utf8(build_message(&from(), m).unwrap().formatted()).unwrap();
    assert!(raw.contains("multipart/related"));
    assert!(raw.contains("Content-ID: <qr>"));
  }

  #[test]
  fn bad_recipient_is_an_error() {
    let mut m = mail();
    m.to = "not an address".into();
    assert!(build_message(&from(), m).is_err());
  }
}
