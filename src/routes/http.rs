//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler resolves the session first; unauthenticated calls get 401.

use std::sync::Arc;

use axum::{
  extract::{FromRequest, Path, State},
  http::{header::SET_COOKIE, HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::session::{expired_session_cookie, session_cookie, token_from_headers};
use crate::state::AppState;

/// `Json` extractor whose rejections render as `ApiError` (JSON 400).
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip_all)]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> Result<impl IntoResponse, ApiError> {
  Ok((StatusCode::CREATED, Json(logic::register(&state, &body).await?)))
}

#[instrument(level = "info", skip_all)]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  ApiJson(body): ApiJson<CredentialsIn>,
) -> Result<impl IntoResponse, ApiError> {
  let session = logic::login(&state, &body).await?;
  let cookie = session_cookie(&session.token);
  Ok(([(SET_COOKIE, cookie)], Json(AccountOut { ok: true, username: session.username })))
}

#[instrument(level = "info", skip_all)]
pub async fn http_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
  if let Some(token) = token_from_headers(&headers) {
    let removed = state.sessions.remove(&token).await;
    info!(target: "algebra_tutor", %removed, "Logged out");
  }
  ([(SET_COOKIE, expired_session_cookie())], Json(OkOut { ok: true }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_dashboard(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<DashboardOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  Ok(Json(logic::dashboard(&state, &session).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_practice(
  State(state): State<Arc<AppState>>,
  Path(skill_id): Path<String>,
  headers: HeaderMap,
) -> Result<Json<PracticeOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  Ok(Json(logic::start_practice(&state, &session, &skill_id).await?))
}

#[instrument(level = "info", skip_all)]
pub async fn http_next_question(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<NextQuestionOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  Ok(Json(logic::next_question(&state, &session).await?))
}

#[instrument(level = "info", skip_all)]
pub async fn http_check_answer(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<CheckAnswerIn>,
) -> Result<Json<CheckAnswerOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  let out = logic::check_answer(&state, &session, body.answer.as_ref()).await?;
  info!(target: "practice", correct = out.correct, demote_to = ?out.demote_to_skill_id, "HTTP check_answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip_all)]
pub async fn http_ask_tutor(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<AskTutorIn>,
) -> Result<Json<AskTutorOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  Ok(Json(logic::ask_tutor(&state, &session, &body).await?))
}

#[instrument(level = "info", skip_all, fields(image_len = body.image_data_url.as_ref().map(|s| s.len())))]
pub async fn http_analyze_handwriting(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<HandwritingIn>,
) -> Result<Json<HandwritingOut>, ApiError> {
  let session = logic::current_session(&state, &headers).await?;
  Ok(Json(logic::analyze_handwriting(&state, &session, body.image_data_url.as_deref()).await?))
}
