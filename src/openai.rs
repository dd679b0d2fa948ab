//! Minimal OpenAI client for the tutor chat and for grading drawings.
//!
//! We only call chat.completions, either with plain text or with one text part
//! plus one image part (vision). Calls are instrumented and log model names,
//! latencies and token usage, not contents.
//!
//! NOTE: We never log the API key or image payloads.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum AiError {
  #[error("OpenAI HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("model returned an empty reply")]
  EmptyReply,
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub chat_model: String,
  pub vision_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let chat_model = std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let vision_model = std::env::var("OPENAI_VISION_MODEL").unwrap_or_else(|_| "gpt-4o".into());
    let timeout = parse_timeout_secs(std::env::var("OPENAI_TIMEOUT_SECS").ok().as_deref());

    match Self::new(api_key, base_url, chat_model, vision_model, timeout) {
      Ok(oa) => Some(oa),
      Err(e) => {
        error!(target: "algebra_tutor", error = %e, "Failed to build HTTP client; AI tutor disabled");
        None
      }
    }
  }

  pub fn new(
    api_key: String,
    base_url: String,
    chat_model: String,
    vision_model: String,
    timeout: Option<Duration>,
  ) -> Result<Self, AiError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
      builder = builder.timeout(t);
    }
    let client = builder.build()?;
    Ok(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), chat_model, vision_model })
  }

  /// Plain-text chat completion: system instruction + one user message.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.chat_model))]
  pub async fn tutor_reply(&self, system: &str, user: &str) -> Result<String, AiError> {
    let messages = vec![
      ChatMessageReq { role: "system".into(), content: MessageContent::Text(system.into()) },
      ChatMessageReq { role: "user".into(), content: MessageContent::Text(user.into()) },
    ];
    self.complete(&self.chat_model, messages, 0.4).await
  }

  /// Vision chat completion: one instruction plus one image (a data URL).
  #[instrument(level = "info", skip(self, instruction, image_data_url), fields(model = %self.vision_model, image_len = image_data_url.len()))]
  pub async fn analyze_image(&self, instruction: &str, image_data_url: &str) -> Result<String, AiError> {
    let messages = vec![ChatMessageReq {
      role: "user".into(),
      content: MessageContent::Parts(vec![
        ContentPart::Text { text: instruction.into() },
        ContentPart::ImageUrl { image_url: ImageUrl { url: image_data_url.into() } },
      ]),
    }];
    self.complete(&self.vision_model, messages, 0.0).await
  }

  async fn complete(&self, model: &str, messages: Vec<ChatMessageReq>, temperature: f32) -> Result<String, AiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest { model: model.to_string(), messages, temperature, max_tokens: None };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "algebra-tutor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(AiError::Http { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, elapsed = ?start.elapsed(), "OpenAI usage");
    }
    let text = body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default()
      .trim()
      .to_string();

    if text.is_empty() { Err(AiError::EmptyReply) } else { Ok(text) }
  }
}

/// OPENAI_TIMEOUT_SECS: whole seconds, 0 or unparsable means no request timeout.
fn parse_timeout_secs(v: Option<&str>) -> Option<Duration> {
  v.and_then(|s| s.trim().parse::<u64>().ok())
    .filter(|secs| *secs > 0)
    .map(Duration::from_secs)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: MessageContent }

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
  Text(String),
  Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
  Text { text: String },
  ImageUrl { image_url: ImageUrl },
}
#[derive(Serialize)]
struct ImageUrl { url: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
