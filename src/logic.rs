//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Accounts and session lookup
//!   - Starting practice / serving the next question (active question replaced wholesale)
//!   - Grading typed answers and feeding the mastery tracker
//!   - Tutor chat and drawing/working analysis via OpenAI

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::mastery::Demotion;
use crate::protocol::*;
use crate::registry::{self, SkillDef};
use crate::session::{token_from_headers, ActiveQuestion, Session};
use crate::state::AppState;
use crate::util::{fill_template, first_line, non_blank, trunc_for_log};
use crate::validators::{grade, Verdict};

const CORRECT_MARKER: &str = "CORRECT:";
const INCORRECT_MARKER: &str = "INCORRECT:";
const FALLBACK_SKILL_NAME: &str = "math";
const FALLBACK_PREREQUISITE_NAME: &str = "the basics";

// -------- Accounts & sessions --------

/// Resolve the caller's session or fail with 401.
pub async fn current_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
  let token = token_from_headers(headers).ok_or(ApiError::Unauthorized)?;
  state.sessions.get(&token).await.ok_or(ApiError::Unauthorized)
}

fn credentials(body: &CredentialsIn) -> Result<(&str, &str), ApiError> {
  let username = non_blank(body.username.as_deref());
  let password = body.password.as_deref().filter(|p| !p.is_empty());
  match (username, password) {
    (Some(u), Some(p)) => Ok((u, p)),
    _ => Err(ApiError::BadRequest("Username and password must not be empty".into())),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn register(state: &AppState, body: &CredentialsIn) -> Result<AccountOut, ApiError> {
  let (username, password) = credentials(body)?;
  let hash = hash_password(password)?;
  let user_id = state.db.create_user(username, &hash)?;
  info!(target: "algebra_tutor", user_id, %username, "Registered user");
  Ok(AccountOut { ok: true, username: username.to_string() })
}

#[instrument(level = "info", skip(state, body))]
pub async fn login(state: &AppState, body: &CredentialsIn) -> Result<Session, ApiError> {
  let (username, password) = credentials(body)?;
  let user = state.db.find_user(username)?;
  match user {
    Some(u) if verify_password(password, &u.password_hash) => {
      let session = state.sessions.create(u.id, &u.username).await;
      info!(target: "algebra_tutor", user_id = u.id, "Logged in");
      Ok(session)
    }
    _ => {
      warn!(target: "algebra_tutor", %username, "Rejected login");
      Err(ApiError::Unauthorized)
    }
  }
}

// -------- Dashboard & question flow --------

#[instrument(level = "info", skip(state, session), fields(user_id = session.user_id))]
pub async fn dashboard(state: &AppState, session: &Session) -> Result<DashboardOut, ApiError> {
  let skills = state.db.list_skills()?;
  let progress = state.db.progress_for_user(session.user_id)?;
  let mut requirements = state.db.requirements_by_target()?;

  let skills = skills
    .into_iter()
    .map(|row| {
      let counters = progress.get(&row.skill_id).copied().unwrap_or_default();
      DashboardSkill {
        requires: requirements.remove(&row.skill_id).unwrap_or_default(),
        skill_id: row.skill_id,
        display_name: row.display_name,
        description: row.description,
        prerequisite_skill_id: row.prerequisite_skill_id,
        consecutive_correct: counters.consecutive_correct,
        total_correct: counters.total_correct,
        total_attempted: counters.total_attempted,
      }
    })
    .collect();

  Ok(DashboardOut { username: session.username.clone(), skills })
}

fn generate(skill: &'static SkillDef) -> ActiveQuestion {
  let question = (skill.generator)(&mut rand::thread_rng());
  debug!(target: "practice", skill_id = skill.id, answer = ?question.answer, "Generated question");
  ActiveQuestion::new(skill.id, question)
}

async fn activate(state: &AppState, session: &Session, question: ActiveQuestion) -> Result<(), ApiError> {
  if state.sessions.set_active(&session.token, question).await {
    Ok(())
  } else {
    Err(ApiError::Unauthorized)
  }
}

/// Enter a skill: generate its first question and make it the active one.
#[instrument(level = "info", skip(state, session), fields(user_id = session.user_id))]
pub async fn start_practice(state: &AppState, session: &Session, skill_id: &str) -> Result<PracticeOut, ApiError> {
  let skill = registry::find(skill_id).ok_or_else(|| ApiError::NotFound(format!("Unknown skill: {skill_id}")))?;
  let question = generate(skill);
  let out = PracticeOut {
    skill_id: skill.id.to_string(),
    skill_display_name: skill.display_name.to_string(),
    question_text: question.text.clone(),
    inequality_string: question.inequality.clone(),
  };
  activate(state, session, question).await?;
  info!(target: "practice", skill_id = skill.id, "Practice started");
  Ok(out)
}

/// Replace the active question with a fresh one for the same skill.
#[instrument(level = "info", skip(state, session), fields(user_id = session.user_id))]
pub async fn next_question(state: &AppState, session: &Session) -> Result<NextQuestionOut, ApiError> {
  let skill = session
    .active
    .as_ref()
    .and_then(|a| registry::find(a.skill_id))
    .ok_or_else(|| ApiError::BadRequest("No active skill".into()))?;
  let question = generate(skill);
  let out = NextQuestionOut { new_question_text: question.text.clone(), inequality_string: question.inequality.clone() };
  activate(state, session, question).await?;
  Ok(out)
}

// -------- Grading --------

/// Feed one graded attempt to the mastery tracker. Bookkeeping failures are
/// logged and reported as "no demotion"; they never fail the grading itself.
fn record_graded_attempt(state: &AppState, user_id: i64, skill_id: &str, correct: bool) -> Option<Demotion> {
  let Some(skill) = registry::find(skill_id) else {
    warn!(target: "mastery", %skill_id, "Skill not registered; progress not recorded");
    return None;
  };
  match state.db.record_attempt(user_id, skill, correct) {
    Ok(rec) => {
      if let Some(d) = &rec.demotion {
        info!(target: "mastery", user_id, skill_id, to = d.to_skill_id, streak = d.streak, "Demotion triggered");
      }
      rec.demotion
    }
    Err(e) => {
      error!(target: "mastery", user_id, skill_id, error = %e, "Progress update failed; rolled back");
      None
    }
  }
}

fn prerequisite_name(d: &Demotion) -> &'static str {
  registry::display_name(d.to_skill_id).unwrap_or(FALLBACK_PREREQUISITE_NAME)
}

fn skill_name(session: &Session) -> &'static str {
  session
    .active
    .as_ref()
    .and_then(|a| registry::display_name(a.skill_id))
    .unwrap_or(FALLBACK_SKILL_NAME)
}

/// Text form of a submitted answer: strings as-is, numbers in their JSON
/// spelling. Any other shape is not gradable.
pub fn answer_text(answer: &Value) -> Option<String> {
  match answer {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

#[instrument(level = "info", skip(state, session, answer), fields(user_id = session.user_id))]
pub async fn check_answer(state: &AppState, session: &Session, answer: Option<&Value>) -> Result<CheckAnswerOut, ApiError> {
  let submitted = answer.ok_or_else(|| ApiError::BadRequest("Missing 'answer'".into()))?;
  let active = session.active.as_ref().ok_or_else(|| ApiError::BadRequest("No active question".into()))?;
  let canonical = active.answer.as_deref().ok_or_else(|| {
    ApiError::BadRequest("This question is graded from a drawing; submit it to analyze_handwriting".into())
  })?;

  let verdict = match answer_text(submitted) {
    Some(text) => grade(active.validator, &text, canonical),
    None => Verdict::InvalidFormat,
  };
  let mut result = match verdict {
    Verdict::Correct => "Correct!".to_string(),
    Verdict::Incorrect => format!("Not quite... (hint: {canonical})"),
    Verdict::InvalidFormat => "Invalid answer format".to_string(),
  };

  let demotion = record_graded_attempt(state, session.user_id, active.skill_id, verdict.is_correct());
  if let Some(d) = &demotion {
    result = format!(
      "You have missed {} questions in a row on \"{}\".\nWe recommend reviewing \"{}\" first!",
      d.streak,
      skill_name(session),
      prerequisite_name(d)
    );
  }

  info!(target: "practice", skill_id = active.skill_id, ?verdict, demoted = demotion.is_some(), "Answer checked");
  Ok(CheckAnswerOut {
    result,
    correct: verdict.is_correct(),
    demote_to_skill_id: demotion.map(|d| d.to_skill_id.to_string()),
  })
}

#[instrument(level = "info", skip(state, session, body), fields(user_id = session.user_id))]
pub async fn ask_tutor(state: &AppState, session: &Session, body: &AskTutorIn) -> Result<AskTutorOut, ApiError> {
  let (Some(prompt), Some(question)) = (non_blank(body.prompt.as_deref()), non_blank(body.current_question.as_deref()))
  else {
    return Err(ApiError::BadRequest("Missing prompt or current question".into()));
  };
  let oa = state.openai.as_ref().ok_or(ApiError::AiUnavailable)?;

  let system = fill_template(&state.prompts.tutor_system, &[("skill", skill_name(session)), ("question", question)]);
  let reply = match oa.tutor_reply(&system, prompt).await {
    Ok(t) => {
      debug!(target: "algebra_tutor", reply = %trunc_for_log(&t, 120), "Tutor reply");
      t
    }
    Err(e) => {
      error!(target: "algebra_tutor", error = %e, "Tutor call failed; using apology reply");
      state.prompts.tutor_unavailable_reply.clone()
    }
  };
  Ok(AskTutorOut { reply })
}

/// How the model graded a drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiGrading {
  Correct,
  Incorrect,
  Malformed,
}

pub fn parse_grading_reply(reply: &str) -> AiGrading {
  let reply = reply.trim_start();
  if reply.starts_with(CORRECT_MARKER) {
    AiGrading::Correct
  } else if reply.starts_with(INCORRECT_MARKER) {
    AiGrading::Incorrect
  } else {
    AiGrading::Malformed
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImageError {
  NotADataUrl,
  BadBase64,
  Empty,
}

/// Check `data:<mime>;base64,<payload>` and that the payload decodes.
pub fn validate_image_data_url(url: &str) -> Result<(), ImageError> {
  let (header, payload) = url.split_once(',').ok_or(ImageError::NotADataUrl)?;
  if !header.starts_with("data:") || !header.ends_with(";base64") {
    return Err(ImageError::NotADataUrl);
  }
  let bytes = STANDARD.decode(payload.trim()).map_err(|_| ImageError::BadBase64)?;
  if bytes.is_empty() {
    return Err(ImageError::Empty);
  }
  Ok(())
}

fn analysis_failure(detail: &str) -> HandwritingOut {
  let message = format!("Analysis failed: {}... please check the image or try again later.", trunc_for_log(detail, 100));
  HandwritingOut { short_feedback: message.clone(), reply: message, is_graph_correct: false, demote_to_skill_id: None }
}

/// Analyze a drawing (graphical question, graded + tracked) or handwritten
/// working (computational question, feedback only).
#[instrument(level = "info", skip(state, session, image_data_url), fields(user_id = session.user_id))]
pub async fn analyze_handwriting(
  state: &AppState,
  session: &Session,
  image_data_url: Option<&str>,
) -> Result<HandwritingOut, ApiError> {
  let image = non_blank(image_data_url).ok_or_else(|| ApiError::BadRequest("Missing image data".into()))?;
  let active = session.active.as_ref().ok_or_else(|| ApiError::BadRequest("No active question".into()))?;
  let oa = state.openai.as_ref().ok_or(ApiError::AiUnavailable)?;

  if let Err(e) = validate_image_data_url(image) {
    warn!(target: "algebra_tutor", error = ?e, "Rejected image");
    return Ok(analysis_failure(&format!("{e:?}")));
  }

  let skill = skill_name(session);
  let instruction = match &active.inequality {
    Some(inequality) => fill_template(
      &state.prompts.graph_grading_template,
      &[("skill", skill), ("question", active.text.as_str()), ("inequality", inequality.as_str())],
    ),
    None => fill_template(&state.prompts.work_grading_template, &[("skill", skill), ("question", active.text.as_str())]),
  };

  let reply = match oa.analyze_image(&instruction, image).await {
    Ok(r) => r,
    Err(e) => {
      error!(target: "algebra_tutor", error = %e, "Image analysis failed");
      return Ok(analysis_failure(&e.to_string()));
    }
  };

  let mut short_feedback = first_line(&reply).to_string();
  let mut detailed = reply.clone();
  if !active.is_graphical() {
    return Ok(HandwritingOut { short_feedback, reply: detailed, is_graph_correct: false, demote_to_skill_id: None });
  }

  let grading = parse_grading_reply(&reply);
  if grading == AiGrading::Malformed {
    short_feedback = format!("Malformed AI reply...\n({})", trunc_for_log(&reply, 200));
    detailed = short_feedback.clone();
  }
  let correct = grading == AiGrading::Correct;

  let demotion = record_graded_attempt(state, session.user_id, active.skill_id, correct);
  if let Some(d) = &demotion {
    detailed.push_str(&format!(
      "\n\nThat is several misses in a row; we recommend reviewing \"{}\" first.",
      prerequisite_name(d)
    ));
  }

  info!(target: "practice", skill_id = active.skill_id, ?grading, demoted = demotion.is_some(), "Drawing graded");
  Ok(HandwritingOut {
    short_feedback,
    reply: detailed,
    is_graph_correct: correct,
    demote_to_skill_id: demotion.map(|d| d.to_skill_id.to_string()),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grading_markers() {
    assert_eq!(parse_grading_reply("CORRECT: Well drawn!"), AiGrading::Correct);
    assert_eq!(parse_grading_reply("INCORRECT: the line should be dashed"), AiGrading::Incorrect);
    assert_eq!(parse_grading_reply("I think it's mostly fine"), AiGrading::Malformed);
    assert_eq!(parse_grading_reply("correct: lowercase"), AiGrading::Malformed);
  }

  #[test]
  fn data_url_validation() {
    assert_eq!(validate_image_data_url("data:image/png;base64,iVBORw0KGgo="), Ok(()));
    assert_eq!(validate_image_data_url("iVBORw0KGgo="), Err(ImageError::NotADataUrl));
    assert_eq!(validate_image_data_url("data:image/png,abc"), Err(ImageError::NotADataUrl));
    assert_eq!(validate_image_data_url("data:image/png;base64,@@@"), Err(ImageError::BadBase64));
    assert_eq!(validate_image_data_url("data:image/png;base64,"), Err(ImageError::Empty));
  }

  #[test]
  fn answers_are_read_from_strings_and_numbers() {
    assert_eq!(answer_text(&serde_json::json!(" -7 ")).as_deref(), Some(" -7 "));
    assert_eq!(answer_text(&serde_json::json!(-7)).as_deref(), Some("-7"));
    assert_eq!(answer_text(&serde_json::json!(2.5)).as_deref(), Some("2.5"));
    assert_eq!(answer_text(&serde_json::json!(true)), None);
    assert_eq!(answer_text(&serde_json::json!(["yes"])), None);
    assert_eq!(answer_text(&serde_json::json!({"x": 1})), None);
  }

  #[test]
  fn failure_pair_never_demotes() {
    let out = analysis_failure("quota exceeded");
    assert!(!out.is_graph_correct);
    assert_eq!(out.demote_to_skill_id, None);
    assert_eq!(out.short_feedback, out.reply);
  }
}
