//! Error types for persistence and the HTTP boundary.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("Already exists: {0}")]
  Conflict(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Lock poisoned: {0}")]
  Poisoned(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Not logged in")]
  Unauthorized,

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("AI tutor is not configured")]
  AiUnavailable,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl From<StoreError> for ApiError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::Conflict(what) => ApiError::Conflict(what),
      other => ApiError::Internal(other.to_string()),
    }
  }
}

/// Body extraction failures (no JSON content type, bad syntax, wrong shape).
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(target: "algebra_tutor", error = %self, "Request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
