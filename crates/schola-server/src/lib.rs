//! Runtime wiring for the Schola server: configuration plus the concrete
//! mail, session and image collaborators.

pub mod images;
pub mod mail;
pub mod session;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, ensure};
use chrono::Duration;
use schola_api::Collaborators;
use serde::Deserialize;

use images::HttpImageStore;
use mail::SmtpMailer;
use session::JwtIssuer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `schola.toml` and
/// `SCHOLA__*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  pub jwt_secret:             String,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_minutes:    i64,
  #[serde(default = "default_login_code_ttl")]
  pub login_code_ttl_minutes: i64,
  pub smtp:                   SmtpConfig,
  pub images:                 ImageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
  pub host:     String,
  #[serde(default = "default_smtp_port")]
  pub port:     u16,
  pub username: String,
  pub password: String,
  /// Sender mailbox, e.g. `Schola <no-reply@school.test>`.
  pub from:     String,
}

/// A Cloudinary-style unsigned upload endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
  pub upload_url:    String,
  pub upload_preset: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/schola/schola.db") }
fn default_session_ttl() -> i64 { 480 }
fn default_login_code_ttl() -> i64 { 5 }
fn default_smtp_port() -> u16 { 587 }

impl ServerConfig {
  /// Load from an optional TOML file overlaid by the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SCHOLA")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?;

    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.check()?;
    Ok(cfg)
  }

  fn check(&self) -> anyhow::Result<()> {
    ensure!(!self.jwt_secret.trim().is_empty(), "jwt_secret must not be empty");
    ensure!(self.session_ttl_minutes > 0, "session_ttl_minutes must be positive");
    ensure!(self.login_code_ttl_minutes > 0, "login_code_ttl_minutes must be positive");
    Ok(())
  }

  /// Build the concrete collaborators described by this configuration.
  pub fn collaborators(&self) -> anyhow::Result<Collaborators> {
    Ok(Collaborators {
      mailer:         Arc::new(SmtpMailer::new(&self.smtp)?),
      issuer:         Arc::new(JwtIssuer::new(
        &self.jwt_secret,
        Duration::minutes(self.session_ttl_minutes),
      )),
      images:         Arc::new(HttpImageStore::new(&self.images)?),
      login_code_ttl: Duration::minutes(self.login_code_ttl_minutes),
    })
  }
}

/// Expand a leading `~/` to `$HOME`.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()?;
    cfg.check()?;
    Ok(cfg)
  }

  const MINIMAL: &str = r#"
    jwt_secret = "s3cret"

    [smtp]
    host     = "smtp.school.test"
    username = "mailer"
    password = "pw"
    from     = "Schola <no-reply@school.test>"

    [images]
    upload_url    = "https://api.images.test/v1_1/demo/image/upload"
    upload_preset = "students"
  "#;

  #[test]
  fn defaults_fill_optional_fields() {
    let cfg = parse(MINIMAL).unwrap();
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.session_ttl_minutes, 480);
    assert_eq!(cfg.login_code_ttl_minutes, 5);
    assert_eq!(cfg.smtp.port, 587);
  }

  #[test]
  fn empty_secret_is_rejected() {
    let toml = MINIMAL.replace("\"s3cret\"", "\"  \"");
    assert!(parse(&toml).is_err());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/schola.db")),
      PathBuf::from(home).join("schola.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }
}
