//! Per-(user, skill) mastery counters and the demotion rule.
//!
//! The counter pair `consecutive_correct` / `consecutive_incorrect` is the
//! state; [`Counters::record`] is the only transition. Both grading sources
//! (typed answers and AI-graded drawings) go through it.

use serde::Serialize;

/// Misses in a row that send a learner back to the prerequisite skill.
pub const DEMOTION_THRESHOLD: u32 = 3;

/// A missing progress row is equivalent to `Counters::default()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
  pub consecutive_correct: u32,
  pub total_correct: u32,
  pub total_attempted: u32,
  pub consecutive_incorrect: u32,
}

/// Emitted when a miss streak reaches the threshold on a skill with a prerequisite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Demotion {
  pub to_skill_id: &'static str,
  /// Streak length that fired the demotion, before the reset.
  pub streak: u32,
}

impl Counters {
  /// Apply one graded attempt.
  ///
  /// Without a prerequisite the miss counter keeps growing; it is never clamped.
  pub fn record(&mut self, correct: bool, prerequisite: Option<&'static str>) -> Option<Demotion> {
    self.total_attempted += 1;

    if correct {
      self.consecutive_correct += 1;
      self.total_correct += 1;
      self.consecutive_incorrect = 0;
      return None;
    }

    self.consecutive_correct = 0;
    self.consecutive_incorrect += 1;

    match prerequisite {
      Some(to_skill_id) if self.consecutive_incorrect >= DEMOTION_THRESHOLD => {
        let streak = self.consecutive_incorrect;
        self.consecutive_incorrect = 0;
        Some(Demotion { to_skill_id, streak })
      }
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_correct_answer_from_empty_state() {
    let mut c = Counters::default();
    assert_eq!(c.record(true, None), None);
    assert_eq!(
      c,
      Counters { consecutive_correct: 1, total_correct: 1, total_attempted: 1, consecutive_incorrect: 0 }
    );
  }

  #[test]
  fn demotion_fires_exactly_at_the_threshold_and_resets_the_streak() {
    let mut c = Counters::default();
    for attempt in 1..=9u32 {
      let d = c.record(false, Some("remainder-theorem"));
      if attempt % DEMOTION_THRESHOLD == 0 {
        assert_eq!(d, Some(Demotion { to_skill_id: "remainder-theorem", streak: DEMOTION_THRESHOLD }));
        assert_eq!(c.consecutive_incorrect, 0);
      } else {
        assert_eq!(d, None, "attempt {attempt} should not demote");
        assert_eq!(c.consecutive_incorrect, attempt % DEMOTION_THRESHOLD);
      }
    }
    assert_eq!(c.total_attempted, 9);
    assert_eq!(c.total_correct, 0);
  }

  #[test]
  fn no_prerequisite_never_demotes_and_never_clamps() {
    let mut c = Counters::default();
    for _ in 0..10 {
      assert_eq!(c.record(false, None), None);
    }
    assert_eq!(c.consecutive_incorrect, 10);
  }

  #[test]
  fn one_correct_answer_breaks_a_miss_streak() {
    let mut c = Counters::default();
    c.record(false, Some("x"));
    c.record(false, Some("x"));
    c.record(true, Some("x"));
    assert_eq!(c.consecutive_incorrect, 0);
    assert_eq!(c.consecutive_correct, 1);
    // The streak starts over: two more misses are not enough.
    assert_eq!(c.record(false, Some("x")), None);
    assert_eq!(c.record(false, Some("x")), None);
  }

  #[test]
  fn a_miss_resets_the_correct_streak() {
    let mut c = Counters::default();
    c.record(true, None);
    c.record(true, None);
    c.record(false, None);
    assert_eq!(c.consecutive_correct, 0);
    assert_eq!(c.total_correct, 2);
    assert!(c.total_correct <= c.total_attempted);
  }

  #[test]
  fn a_streak_already_past_the_threshold_demotes_on_the_next_miss() {
    // Counters persisted before the skill gained a prerequisite.
    let mut c = Counters { consecutive_incorrect: 7, total_attempted: 7, ..Counters::default() };
    let d = c.record(false, Some("linear-eq-substitution"));
    assert_eq!(d.map(|d| d.streak), Some(8));
    assert_eq!(c.consecutive_incorrect, 0);
  }
}
