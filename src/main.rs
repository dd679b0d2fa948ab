//! Algebra Tutor Backend
//!
//! - Axum HTTP API: accounts, skill dashboard, practice questions, answer checking
//! - Mastery tracking in SQLite, with demotion to the prerequisite after repeated misses
//! - Optional OpenAI integration (tutor chat, drawing grading) via environment variables
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   DATABASE_PATH       : SQLite file (default "./instance/algebra_tutor.db")
//!   STATIC_DIR          : frontend directory (default "./static")
//!   TUTOR_CONFIG_PATH   : path to TOML config (prompts + extra skill dependencies)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_CHAT_MODEL   : default "gpt-4o-mini"
//!   OPENAI_VISION_MODEL : default "gpt-4o"
//!   OPENAI_TIMEOUT_SECS : default 60
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod config;
mod error;
mod formatting;
mod validators;
mod generators;
mod registry;
mod mastery;
mod db;
mod auth;
mod session;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Settings;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();

  // Database, registry sync, prompts and the optional OpenAI client.
  let state = Arc::new(AppState::from_env(&settings)?);

  let app = build_router(state, &settings.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "algebra_tutor", %addr, static_dir = %settings.static_dir.display(), "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "algebra_tutor", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "algebra_tutor", error = %e, "Failed to listen for Ctrl-C");
    // Without a signal handler, keep serving.
    std::future::pending::<()>().await;
  }
  info!(target: "algebra_tutor", "Shutdown requested");
}
