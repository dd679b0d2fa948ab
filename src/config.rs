//! Runtime settings (environment) and the optional tutor configuration file (TOML).
//!
//! See `TutorConfig` and `Prompts` for the expected schema.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TutorConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// Extra prerequisite → target edges on top of the registry's own chain.
  #[serde(default)]
  pub dependencies: Vec<DependencyCfg>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DependencyCfg {
  pub prerequisite: String,
  pub target: String,
}

/// Prompts sent to the AI tutor. Any field left out of the TOML keeps its default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Chat tutor system prompt. Placeholders: `{skill}`, `{question}`.
  pub tutor_system: String,
  /// Grading a drawn inequality region. Placeholders: `{skill}`, `{question}`, `{inequality}`.
  pub graph_grading_template: String,
  /// Checking handwritten working. Placeholders: `{skill}`, `{question}`.
  pub work_grading_template: String,
  /// Returned by the chat tutor when the model call fails.
  pub tutor_unavailable_reply: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      tutor_system: "You are a patient high-school math tutor helping students who find math hard; their goal is to pass the next test.\n\
        The student is practicing \"{skill}\". The question on their screen is:\n{question}\n\n\
        Rules:\n\
        - NEVER give the final answer directly. This is the most important rule.\n\
        - If asked for the answer, ask back what the first step should be, or whether they remember the definition of {skill}.\n\
        - If asked for a full solution, give the steps and the reasoning, not just the arithmetic.\n\
        - If asked about a concept, explain it in the simplest, plainest words you can."
        .into(),
      graph_grading_template: "You are a patient high-school math tutor. The student is practicing \"{skill}\". The question is:\n{question}\n\n\
        The attached image is the student's hand drawing of the solution region of {inequality}.\n\
        Check the boundary line (position, solid or dashed) and the shaded side.\n\
        - If it is correct, reply exactly: \"CORRECT: Well drawn! The solution region is right.\"\n\
        - If it is wrong, the first line must be \"INCORRECT: <what is wrong>\", followed by a short explanation.\n\
        State the conclusion directly."
        .into(),
      work_grading_template: "You are a patient high-school math tutor. The student is practicing \"{skill}\". The question is:\n{question}\n\n\
        The attached image is the student's handwritten working. Check every step.\n\
        - If it is correct, reply: \"CORRECT: Your working is correct!\"\n\
        - If it is wrong, the first line must be \"INCORRECT: <the first wrong step>\", followed by a short explanation.\n\
        State the conclusion directly."
        .into(),
      tutor_unavailable_reply: "Sorry, the tutor is a little busy right now... please try again in a moment.".into(),
    }
  }
}

/// Process settings read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub database_path: PathBuf,
  pub static_dir: PathBuf,
}

impl Settings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    let database_path = std::env::var("DATABASE_PATH")
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("./instance/algebra_tutor.db"));
    let static_dir = std::env::var("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./static"));
    Self { port, database_path, static_dir }
  }
}

/// Load `TutorConfig` from TUTOR_CONFIG_PATH. Missing variable, unreadable file
/// or bad TOML all fall back to defaults (the last two are logged).
pub fn load_tutor_config_from_env() -> TutorConfig {
  let Ok(path) = std::env::var("TUTOR_CONFIG_PATH") else {
    return TutorConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_tutor_config(&s) {
      Ok(cfg) => {
        info!(target: "algebra_tutor", %path, dependencies = cfg.dependencies.len(), "Loaded tutor config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "algebra_tutor", %path, error = %e, "Failed to parse TOML config");
        TutorConfig::default()
      }
    },
    Err(e) => {
      error!(target: "algebra_tutor", %path, error = %e, "Failed to read TOML config file");
      TutorConfig::default()
    }
  }
}

pub fn parse_tutor_config(s: &str) -> Result<TutorConfig, toml::de::Error> {
  toml::from_str::<TutorConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_prompt_overrides_keep_other_defaults() {
    let cfg = parse_tutor_config(
      r#"
        [prompts]
        tutor_unavailable_reply = "Back soon."

        [[dependencies]]
        prerequisite = "remainder-theorem"
        target = "linear-eq-addition"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.prompts.tutor_unavailable_reply, "Back soon.");
    assert_eq!(cfg.prompts.tutor_system, Prompts::default().tutor_system);
    assert_eq!(
      cfg.dependencies,
      vec![DependencyCfg { prerequisite: "remainder-theorem".into(), target: "linear-eq-addition".into() }]
    );
  }

  #[test]
  fn empty_file_is_all_defaults() {
    let cfg = parse_tutor_config("").unwrap();
    assert!(cfg.dependencies.is_empty());
    assert!(cfg.prompts.graph_grading_template.contains("{inequality}"));
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(parse_tutor_config("[[dependencies]]\nprerequisite = 3").is_err());
  }
}
