//! schola-server binary.
//!
//! Reads `schola.toml` (or the path given with `--config`) plus `SCHOLA__*`
//! environment variables, opens the SQLite store and serves the JSON API.
//!
//! ```text
//! schola-server [--config FILE] [serve]
//! schola-server add-teacher --name "Ada Lovelace" --email ada@school.test
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use schola_api::AppState;
use schola_core::teachers::TeacherProfiles;
use schola_server::{ServerConfig, expand_tilde};
use schola_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Schola school management server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "schola.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Create a teacher account and print its user id.
  AddTeacher {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    email: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);
  let collaborators = cfg.collaborators()?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {
      let state = AppState::new(store, collaborators);
      let app = schola_api::api_router(state).layer(TraceLayer::new_for_http());
      let address = format!("{}:{}", cfg.host, cfg.port);

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }
    Command::AddTeacher { name, email } => {
      let teachers = TeacherProfiles::new(store, collaborators.mailer);
      let teacher = teachers
        .provision(&name, &email)
        .await
        .context("failed to add teacher")?;
      println!("{}", teacher.user_id);
    }
  }

  Ok(())
}
