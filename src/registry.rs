//! The built-in skill table: generator, display metadata and prerequisite per skill.
//!
//! Read-only for the life of the process; synced into the database once at
//! startup (see `db::skills`).

use crate::generators::{self, Generator};

#[derive(Clone, Copy)]
pub struct SkillDef {
  pub id: &'static str,
  pub display_name: &'static str,
  pub description: &'static str,
  /// Single parent used by the demotion rule.
  pub prerequisite: Option<&'static str>,
  /// Graded only from a drawing; its questions carry no canonical answer.
  pub graphical: bool,
  pub generator: Generator,
}

impl std::fmt::Debug for SkillDef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SkillDef")
      .field("id", &self.id)
      .field("prerequisite", &self.prerequisite)
      .finish_non_exhaustive()
  }
}

pub static SKILLS: &[SkillDef] = &[
  SkillDef {
    id: "remainder-theorem",
    display_name: "Remainder Theorem",
    description: "Find the remainder of f(x) divided by (x - k).",
    prerequisite: None,
    graphical: false,
    generator: generators::remainder_theorem,
  },
  SkillDef {
    id: "factor-theorem",
    display_name: "Factor Theorem",
    description: "Decide whether (x - k) is a factor of f(x).",
    prerequisite: Some("remainder-theorem"),
    graphical: false,
    generator: generators::factor_theorem,
  },
  SkillDef {
    id: "linear-eq-substitution",
    display_name: "Linear Systems (Substitution)",
    description: "Solve a system where one equation is already in y = mx + k form.",
    prerequisite: None,
    graphical: false,
    generator: generators::linear_substitution,
  },
  SkillDef {
    id: "linear-eq-addition",
    display_name: "Linear Systems (Elimination)",
    description: "Eliminate a variable after scaling one equation by a multiple.",
    prerequisite: Some("linear-eq-substitution"),
    graphical: false,
    generator: generators::linear_elimination,
  },
  SkillDef {
    id: "linear-ineq-region",
    display_name: "Linear Inequalities (Graphing Regions)",
    description: "Shade the solution region of a linear inequality on the scratch pad.",
    prerequisite: Some("linear-eq-addition"),
    graphical: true,
    generator: generators::inequality_region,
  },
  SkillDef {
    id: "linear-ineq-check-point",
    display_name: "Linear Inequalities (Checking Points)",
    description: "Decide whether a point solves a system of linear inequalities.",
    prerequisite: Some("linear-ineq-region"),
    graphical: false,
    generator: generators::inequality_check_point,
  },
];

pub fn find(id: &str) -> Option<&'static SkillDef> {
  SKILLS.iter().find(|s| s.id == id)
}

pub fn display_name(id: &str) -> Option<&'static str> {
  find(id).map(|s| s.display_name)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, SeedableRng};
  use std::collections::HashSet;

  #[test]
  fn ids_are_unique() {
    let ids: HashSet<_> = SKILLS.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), SKILLS.len());
  }

  #[test]
  fn prerequisites_resolve_and_chains_terminate() {
    for skill in SKILLS {
      let mut seen = HashSet::new();
      let mut current = Some(skill.id);
      while let Some(id) = current {
        assert!(seen.insert(id), "prerequisite cycle through {id}");
        current = find(id).expect("prerequisite must be registered").prerequisite;
      }
    }
  }

  #[test]
  fn only_the_region_skill_is_graphical() {
    let mut rng = StdRng::seed_from_u64(1);
    for skill in SKILLS {
      let q = (skill.generator)(&mut rng);
      assert_eq!(q.answer.is_none(), skill.graphical, "{}", skill.id);
    }
  }

  #[test]
  fn lookup() {
    assert_eq!(find("factor-theorem").and_then(|s| s.prerequisite), Some("remainder-theorem"));
    assert_eq!(display_name("remainder-theorem"), Some("Remainder Theorem"));
    assert!(find("calculus").is_none());
  }
}
