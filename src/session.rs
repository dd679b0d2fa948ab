//! Server-side sessions: who is logged in and which question they are looking at.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::generators::GeneratedQuestion;
use crate::validators::ValidatorKind;

pub const SESSION_COOKIE: &str = "tutor_session";

/// Sessions unused for this long are dropped.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// The question currently shown to a session. Replaced wholesale on every new
/// question, never merged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveQuestion {
  pub skill_id: &'static str,
  pub text: String,
  pub answer: Option<String>,
  pub validator: Option<ValidatorKind>,
  pub inequality: Option<String>,
}

impl ActiveQuestion {
  pub fn new(skill_id: &'static str, q: GeneratedQuestion) -> Self {
    Self { skill_id, text: q.text, answer: q.answer, validator: q.validator, inequality: q.inequality }
  }

  pub fn is_graphical(&self) -> bool {
    self.inequality.is_some()
  }
}

#[derive(Clone, Debug)]
pub struct Session {
  pub token: String,
  pub user_id: i64,
  pub username: String,
  pub active: Option<ActiveQuestion>,
  last_seen: Instant,
}

/// One live session per user; idle sessions expire after `idle_ttl`.
pub struct SessionStore {
  by_token: RwLock<HashMap<String, Session>>,
  idle_ttl: Duration,
}

impl Default for SessionStore {
  fn default() -> Self {
    Self::with_idle_ttl(SESSION_IDLE_TTL)
  }
}

impl SessionStore {
  pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
    Self { by_token: RwLock::new(HashMap::new()), idle_ttl }
  }

  /// Start a session. The user's previous session (if any) and every expired
  /// session are removed in the same pass.
  pub async fn create(&self, user_id: i64, username: &str) -> Session {
    let now = Instant::now();
    let session = Session {
      token: Uuid::new_v4().to_string(),
      user_id,
      username: username.to_string(),
      active: None,
      last_seen: now,
    };

    let mut map = self.by_token.write().await;
    let before = map.len();
    map.retain(|_, s| s.user_id != user_id && now.duration_since(s.last_seen) < self.idle_ttl);
    if map.len() < before {
      debug!(target: "algebra_tutor", dropped = before - map.len(), "Dropped replaced or idle sessions");
    }
    map.insert(session.token.clone(), session.clone());
    session
  }

  /// Look up a live session and refresh its idle clock.
  pub async fn get(&self, token: &str) -> Option<Session> {
    let now = Instant::now();
    let mut map = self.by_token.write().await;
    let fresh = now.duration_since(map.get(token)?.last_seen) < self.idle_ttl;
    if !fresh {
      map.remove(token);
      return None;
    }
    map.get_mut(token).map(|s| {
      s.last_seen = now;
      s.clone()
    })
  }

  /// Replace the active question. False if the session is gone.
  pub async fn set_active(&self, token: &str, question: ActiveQuestion) -> bool {
    match self.by_token.write().await.get_mut(token) {
      Some(s) => {
        s.active = Some(question);
        true
      }
      None => false,
    }
  }

  pub async fn remove(&self, token: &str) -> bool {
    self.by_token.write().await.remove(token).is_some()
  }

  #[cfg(test)]
  pub async fn live_count(&self) -> usize {
    self.by_token.read().await.len()
  }
}

/// Session token from the `tutor_session` cookie or an `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
  let from_cookie = headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value.to_string());

  from_cookie.or_else(|| {
    headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(|t| t.trim().to_string())
  })
  .filter(|t| !t.is_empty())
}

pub fn session_cookie(token: &str) -> HeaderValue {
  cookie_value(&format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"))
}

pub fn expired_session_cookie() -> HeaderValue {
  cookie_value(&format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))
}

// Tokens are uuids, so the value is always valid header text.
fn cookie_value(s: &str) -> HeaderValue {
  HeaderValue::from_str(s).unwrap_or_else(|_| HeaderValue::from_static(""))
}
