//! Public request/response structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Request fields are optional so a missing field becomes a 400 with a clear
//! message instead of an extractor rejection.

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Deserialize)]
pub struct CredentialsIn {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AccountOut {
    pub ok: bool,
    pub username: String,
}

#[derive(Serialize)]
pub struct OkOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct DashboardOut {
    pub username: String,
    pub skills: Vec<DashboardSkill>,
}

#[derive(Serialize)]
pub struct DashboardSkill {
    pub skill_id: String,
    pub display_name: String,
    pub description: String,
    pub prerequisite_skill_id: Option<String>,
    /// Prerequisites recorded in the dependency-edge table.
    pub requires: Vec<String>,
    pub consecutive_correct: u32,
    pub total_correct: u32,
    pub total_attempted: u32,
}

#[derive(Serialize)]
pub struct PracticeOut {
    pub skill_id: String,
    pub skill_display_name: String,
    pub question_text: String,
    pub inequality_string: Option<String>,
}

#[derive(Serialize)]
pub struct NextQuestionOut {
    pub new_question_text: String,
    pub inequality_string: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckAnswerIn {
    /// Any JSON value; strings and numbers are graded, other shapes are a format fault.
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CheckAnswerOut {
    pub result: String,
    pub correct: bool,
    pub demote_to_skill_id: Option<String>,
}

#[derive(Deserialize)]
pub struct AskTutorIn {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub current_question: Option<String>,
}

#[derive(Serialize)]
pub struct AskTutorOut {
    pub reply: String,
}

#[derive(Deserialize)]
pub struct HandwritingIn {
    #[serde(default)]
    pub image_data_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HandwritingOut {
    pub short_feedback: String,
    pub reply: String,
    pub is_graph_correct: bool,
    pub demote_to_skill_id: Option<String>,
}
