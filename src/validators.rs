//! Answer validators, one kind per answer surface form.
//!
//! Every kind currently compares trimmed, case-insensitive text. They stay
//! separate so a skill can later accept equivalent forms without touching the
//! others.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest answer we are willing to compare.
pub const MAX_ANSWER_CHARS: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
  /// Signed integer remainder.
  Remainder,
  /// "yes" / "no".
  Factor,
  /// Value of the requested unknown.
  LinearEquation,
  /// "yes" / "no".
  CheckPoint,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerFormatError {
  #[error("answer is longer than {MAX_ANSWER_CHARS} characters")]
  TooLong,
  #[error("answer contains control characters")]
  ControlCharacters,
}

/// Outcome of comparing a submission against the canonical answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
  Correct,
  Incorrect,
  InvalidFormat,
}

impl Verdict {
  pub fn is_correct(self) -> bool {
    matches!(self, Verdict::Correct)
  }
}

impl ValidatorKind {
  pub fn validate(self, submitted: &str, canonical: &str) -> Result<bool, AnswerFormatError> {
    let submitted = well_formed(submitted)?;
    Ok(match self {
      ValidatorKind::Remainder => default_compare(submitted, canonical),
      ValidatorKind::Factor => default_compare(submitted, canonical),
      ValidatorKind::LinearEquation => default_compare(submitted, canonical),
      ValidatorKind::CheckPoint => default_compare(submitted, canonical),
    })
  }
}

/// Trimmed, case-insensitive equality.
pub fn default_compare(submitted: &str, canonical: &str) -> bool {
  submitted.trim().to_lowercase() == canonical.trim().to_lowercase()
}

/// Grade with the question's validator, falling back to [`default_compare`]
/// when none is set. Format faults become [`Verdict::InvalidFormat`].
pub fn grade(validator: Option<ValidatorKind>, submitted: &str, canonical: &str) -> Verdict {
  let result = match validator {
    Some(kind) => kind.validate(submitted, canonical),
    None => Ok(default_compare(submitted, canonical)),
  };
  match result {
    Ok(true) => Verdict::Correct,
    Ok(false) => Verdict::Incorrect,
    Err(_) => Verdict::InvalidFormat,
  }
}

fn well_formed(submitted: &str) -> Result<&str, AnswerFormatError> {
  let trimmed = submitted.trim();
  if trimmed.chars().count() > MAX_ANSWER_CHARS {
    return Err(AnswerFormatError::TooLong);
  }
  if trimmed.chars().any(char::is_control) {
    return Err(AnswerFormatError::ControlCharacters);
  }
  Ok(trimmed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn comparisons_are_trimmed_and_case_insensitive() {
    assert!(ValidatorKind::Factor.validate("  YES ", "yes").unwrap());
    assert!(ValidatorKind::Remainder.validate("-7", "-7").unwrap());
    assert!(!ValidatorKind::Remainder.validate("7", "-7").unwrap());
    assert!(ValidatorKind::CheckPoint.validate("No", "no").unwrap());
  }

  #[test]
  fn oversized_or_control_input_is_a_format_fault() {
    let long = "1".repeat(MAX_ANSWER_CHARS + 1);
    assert_eq!(ValidatorKind::LinearEquation.validate(&long, "1"), Err(AnswerFormatError::TooLong));
    assert_eq!(
      ValidatorKind::LinearEquation.validate("1\u{7}", "1"),
      Err(AnswerFormatError::ControlCharacters)
    );
    assert_eq!(grade(Some(ValidatorKind::Remainder), &long, "1"), Verdict::InvalidFormat);
  }

  #[test]
  fn missing_validator_falls_back_to_default_comparison() {
    assert_eq!(grade(None, " Yes", "yes"), Verdict::Correct);
    assert_eq!(grade(None, "3", "4"), Verdict::Incorrect);
  }

  #[test]
  fn kinds_serialize_as_snake_case_tags() {
    let tag = serde_json::to_string(&ValidatorKind::LinearEquation).unwrap();
    assert_eq!(tag, "\"linear_equation\"");
  }
}
