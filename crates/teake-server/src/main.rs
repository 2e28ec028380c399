//! TeaKE server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite record store and the image directory, and serves the JSON API under
//! `/api` and uploaded images under `/objects`.
//!
//! # Operator commands
//!
//! ```text
//! teake-server add-user --email sam@example.com --nickname sam --status approved
//! teake-server set-verification <USER_ID> rejected
//! ```

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use teake_api::{AppState, auth::issue_session};
use teake_core::{
  store::UserStore,
  user::{NewUser, VerificationStatus},
};
use teake_post::PostService;
use teake_store_fs::FsObjectStore;
use teake_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "TeaKE API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (default).
  Serve,
  /// Create a user and print a session token for it.
  AddUser {
    #[arg(long)]
    email:    Option<String>,
    #[arg(long)]
    nickname: String,
    #[arg(long, value_parser = VerificationStatus::parse)]
    status:   Option<VerificationStatus>,
  },
  /// Set a user's verification status.
  SetVerification {
    user_id: Uuid,
    #[arg(value_parser = VerificationStatus::parse)]
    status:  VerificationStatus,
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

  if let Some(parent) = cfg.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::AddUser { email, nickname, status } => {
      add_user(&store, email, nickname, status).await
    }
    Command::SetVerification { user_id, status } => {
      let user = store
        .set_verification(user_id, status)
        .await
        .context("failed to update verification status")?
        .with_context(|| format!("no user with id {user_id}"))?;
      println!("{} is now {}", user.user_id, user.verification_status);
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  if !cfg.is_configured() {
    anyhow::bail!(
      "public_base_url and admin_email must be set (TEAKE_PUBLIC_BASE_URL, TEAKE_ADMIN_EMAIL)"
    );
  }

  tokio::fs::create_dir_all(&cfg.objects_root)
    .await
    .with_context(|| format!("failed to create {:?}", cfg.objects_root))?;

  let objects = FsObjectStore::new(&cfg.objects_root, cfg.public_base_url.clone());
  let posts = PostService::new(Arc::new(store), Arc::new(objects), Arc::new(DefaultClock));
  let state = AppState::new(posts, cfg.admin_email.as_str());

  let app = Router::new()
    .nest("/api", teake_api::api_router(state))
    .nest_service("/objects", ServeDir::new(&cfg.objects_root))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}

async fn add_user(
  store: &SqliteStore,
  email: Option<String>,
  nickname: String,
  status: Option<VerificationStatus>,
) -> anyhow::Result<()> {
  let mut user = store
    .create_user(NewUser { email, nickname })
    .await
    .context("failed to create user")?;

  if let Some(status) = status {
    user = store
      .set_verification(user.user_id, status)
      .await
      .context("failed to set verification status")?
      .context("user vanished after creation")?;
  }

  let token = issue_session(store, user.user_id)
    .await
    .context("failed to create session")?;

  println!("user_id: {}", user.user_id);
  println!("status:  {}", user.verification_status);
  println!("token:   {token}");
  Ok(())
}
