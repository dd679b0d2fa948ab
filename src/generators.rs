//! Procedural question generators, one per skill.
//!
//! Each generator samples its parameters through a small problem struct, so the
//! sampled values stay inspectable, and then renders the question text from it.
//! Degenerate draws (zero leading coefficients, singular systems, always-zero
//! remainders when the target is "not a factor") are resampled here and never
//! reach the learner.

use rand::{Rng, RngCore};

use crate::formatting::{
  check_inequality, evaluate_polynomial, format_divisor, format_inequality, format_linear_equation_lhs,
  format_polynomial, format_slope_intercept, InequalitySign,
};
use crate::validators::ValidatorKind;

/// What a generator hands to the practice flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedQuestion {
  pub text: String,
  /// `None` for graphical questions, graded from a drawing only.
  pub answer: Option<String>,
  pub validator: Option<ValidatorKind>,
  /// Inequality the drawing is graded against (graphical questions only).
  pub inequality: Option<String>,
}

pub type Generator = fn(&mut dyn RngCore) -> GeneratedQuestion;

pub const YES: &str = "yes";
pub const NO: &str = "no";

const ELIMINATION_MULTIPLIERS: [i64; 4] = [-3, -2, 2, 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unknown {
  X,
  Y,
}

impl Unknown {
  fn sample(rng: &mut dyn RngCore) -> Self {
    if rng.gen_bool(0.5) { Unknown::X } else { Unknown::Y }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Unknown::X => "x",
      Unknown::Y => "y",
    }
  }

  fn pick(self, x: i64, y: i64) -> i64 {
    match self {
      Unknown::X => x,
      Unknown::Y => y,
    }
  }
}

fn nonzero(rng: &mut dyn RngCore, lo: i64, hi: i64) -> i64 {
  loop {
    let v = rng.gen_range(lo..=hi);
    if v != 0 {
      return v;
    }
  }
}

fn yes_no(flag: bool) -> String {
  if flag { YES.into() } else { NO.into() }
}

// Integer solution with both coordinates nonzero.
fn sample_solution(rng: &mut dyn RngCore) -> (i64, i64) {
  (nonzero(rng, -5, 5), nonzero(rng, -5, 5))
}

// Every coefficient except the constant term of a degree 2 or 3 polynomial.
fn sample_polynomial_head(rng: &mut dyn RngCore) -> Vec<i64> {
  if rng.gen_bool(0.5) {
    vec![nonzero(rng, -3, 3), rng.gen_range(-5..=5)]
  } else {
    vec![nonzero(rng, -2, 2), rng.gen_range(-3..=3), rng.gen_range(-5..=5)]
  }
}

fn system_text(method: &str, rows: [(String, String); 2], ask: Unknown) -> String {
  let [(l1, r1), (l2, r2)] = rows;
  format!(
    "Solve the system of equations by {method}:\n  {l1:<15} = {r1:<10} ...... (1)\n  {l2:<15} = {r2:<10} ...... (2)\n\nFind {} = ?",
    ask.as_str()
  )
}

// ---------------------------------------------------------------------------
// Remainder theorem
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct RemainderProblem {
  /// Highest degree first.
  pub coeffs: Vec<i64>,
  pub k: i64,
}

impl RemainderProblem {
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let k = rng.gen_range(-3..=3);
    let mut coeffs = sample_polynomial_head(rng);
    coeffs.push(rng.gen_range(-9..=9));
    Self { coeffs, k }
  }

  pub fn remainder(&self) -> i64 {
    evaluate_polynomial(&self.coeffs, self.k)
  }

  pub fn question(&self) -> GeneratedQuestion {
    GeneratedQuestion {
      text: format!(
        "Find the remainder when f(x) = {} is divided by {}.",
        format_polynomial(&self.coeffs),
        format_divisor(self.k)
      ),
      answer: Some(self.remainder().to_string()),
      validator: Some(ValidatorKind::Remainder),
      inequality: None,
    }
  }
}

pub fn remainder_theorem(rng: &mut dyn RngCore) -> GeneratedQuestion {
  RemainderProblem::sample(rng).question()
}

// ---------------------------------------------------------------------------
// Factor theorem
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct FactorProblem {
  pub coeffs: Vec<i64>,
  pub k: i64,
  pub is_factor: bool,
}

impl FactorProblem {
  /// The target answer is drawn first; the constant term is then solved
  /// (factor) or resampled until the remainder is nonzero (not a factor).
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let k = rng.gen_range(-3..=3);
    let is_factor = rng.gen_bool(0.5);
    let mut coeffs = sample_polynomial_head(rng);

    coeffs.push(0);
    let without_constant = evaluate_polynomial(&coeffs, k);
    let constant = if is_factor {
      -without_constant
    } else {
      loop {
        let c = rng.gen_range(-9..=9);
        if without_constant + c != 0 {
          break c;
        }
      }
    };
    if let Some(last) = coeffs.last_mut() {
      *last = constant;
    }

    Self { coeffs, k, is_factor }
  }

  pub fn question(&self) -> GeneratedQuestion {
    GeneratedQuestion {
      text: format!(
        "Is {} a factor of f(x) = {}? (answer '{YES}' or '{NO}')",
        format_divisor(self.k),
        format_polynomial(&self.coeffs)
      ),
      answer: Some(yes_no(self.is_factor)),
      validator: Some(ValidatorKind::Factor),
      inequality: None,
    }
  }
}

pub fn factor_theorem(rng: &mut dyn RngCore) -> GeneratedQuestion {
  FactorProblem::sample(rng).question()
}

// ---------------------------------------------------------------------------
// Linear system, substitution form
// ---------------------------------------------------------------------------

/// Which unknown equation (1) is solved for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlopeForm {
  /// y = m·x + k
  YOfX,
  /// x = m·y + k
  XOfY,
}

#[derive(Clone, Debug)]
pub struct SubstitutionProblem {
  pub form: SlopeForm,
  pub m: i64,
  pub k: i64,
  /// Equation (2): a·x + b·y = c
  pub a: i64,
  pub b: i64,
  pub c: i64,
  pub solution: (i64, i64),
  pub ask: Unknown,
}

impl SubstitutionProblem {
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let (x, y) = sample_solution(rng);
    let form = if rng.gen_bool(0.5) { SlopeForm::YOfX } else { SlopeForm::XOfY };
    let m = nonzero(rng, -3, 3);
    let k = match form {
      SlopeForm::YOfX => y - m * x,
      SlopeForm::XOfY => x - m * y,
    };

    // Reject a second equation parallel to the first.
    let (a, b) = loop {
      let a = nonzero(rng, -3, 3);
      let b = nonzero(rng, -3, 3);
      let parallel = match form {
        SlopeForm::YOfX => a == -m * b,
        SlopeForm::XOfY => b == -m * a,
      };
      if !parallel {
        break (a, b);
      }
    };

    Self { form, m, k, a, b, c: a * x + b * y, solution: (x, y), ask: Unknown::sample(rng) }
  }

  pub fn question(&self) -> GeneratedQuestion {
    let first = match self.form {
      SlopeForm::YOfX => ("y".to_string(), format_slope_intercept(self.m, "x", self.k)),
      SlopeForm::XOfY => ("x".to_string(), format_slope_intercept(self.m, "y", self.k)),
    };
    let second = (format_linear_equation_lhs(self.a, self.b), self.c.to_string());
    let (x, y) = self.solution;
    GeneratedQuestion {
      text: system_text("substitution", [first, second], self.ask),
      answer: Some(self.ask.pick(x, y).to_string()),
      validator: Some(ValidatorKind::LinearEquation),
      inequality: None,
    }
  }
}

pub fn linear_substitution(rng: &mut dyn RngCore) -> GeneratedQuestion {
  SubstitutionProblem::sample(rng).question()
}

// ---------------------------------------------------------------------------
// Linear system, elimination form
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct EliminationProblem {
  pub a1: i64,
  pub b1: i64,
  pub c1: i64,
  pub a2: i64,
  pub b2: i64,
  pub c2: i64,
  pub multiplier: i64,
  pub solution: (i64, i64),
  pub ask: Unknown,
}

impl EliminationProblem {
  /// b2 is a multiple of b1, so eliminating y takes one scaling step.
  /// a2 = a1·multiplier would make the system singular and is rejected.
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let (x, y) = sample_solution(rng);
    let a1 = nonzero(rng, -5, 5);
    let b1 = nonzero(rng, -5, 5);
    let multiplier = ELIMINATION_MULTIPLIERS[rng.gen_range(0..ELIMINATION_MULTIPLIERS.len())];
    let b2 = b1 * multiplier;
    let a2 = loop {
      let a2 = nonzero(rng, -5, 5);
      if a2 != a1 * multiplier {
        break a2;
      }
    };

    Self {
      a1,
      b1,
      c1: a1 * x + b1 * y,
      a2,
      b2,
      c2: a2 * x + b2 * y,
      multiplier,
      solution: (x, y),
      ask: Unknown::sample(rng),
    }
  }

  pub fn question(&self) -> GeneratedQuestion {
    let rows = [
      (format_linear_equation_lhs(self.a1, self.b1), self.c1.to_string()),
      (format_linear_equation_lhs(self.a2, self.b2), self.c2.to_string()),
    ];
    let (x, y) = self.solution;
    GeneratedQuestion {
      text: system_text("elimination", rows, self.ask),
      answer: Some(self.ask.pick(x, y).to_string()),
      validator: Some(ValidatorKind::LinearEquation),
      inequality: None,
    }
  }
}

pub fn linear_elimination(rng: &mut dyn RngCore) -> GeneratedQuestion {
  EliminationProblem::sample(rng).question()
}

// ---------------------------------------------------------------------------
// Inequality systems
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct Inequality {
  pub a: i64,
  pub b: i64,
  pub c: i64,
  pub sign: InequalitySign,
}

impl Inequality {
  pub fn contains(&self, x: i64, y: i64) -> bool {
    check_inequality(self.a, self.b, self.c, self.sign, x, y)
  }
}

fn sample_sign(rng: &mut dyn RngCore) -> InequalitySign {
  InequalitySign::ALL[rng.gen_range(0..InequalitySign::ALL.len())]
}

fn sample_direction(rng: &mut dyn RngCore) -> (i64, i64) {
  loop {
    let a = rng.gen_range(-5..=5);
    let b = rng.gen_range(-5..=5);
    if a != 0 || b != 0 {
      return (a, b);
    }
  }
}

#[derive(Clone, Debug)]
pub struct CheckPointProblem {
  pub inequalities: Vec<Inequality>,
  pub point: (i64, i64),
}

impl CheckPointProblem {
  /// Each inequality's boundary passes through its own sampled point; the test
  /// point is drawn independently and evaluated, never assumed.
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let count = rng.gen_range(2..=3);
    let inequalities = (0..count)
      .map(|_| {
        let (a, b) = sample_direction(rng);
        let (px, py) = (rng.gen_range(-3..=3), rng.gen_range(-3..=3));
        Inequality { a, b, c: a * px + b * py, sign: sample_sign(rng) }
      })
      .collect();
    let point = (rng.gen_range(-5..=5), rng.gen_range(-5..=5));
    Self { inequalities, point }
  }

  pub fn is_solution(&self) -> bool {
    let (x, y) = self.point;
    self.inequalities.iter().all(|i| i.contains(x, y))
  }

  pub fn question(&self) -> GeneratedQuestion {
    let (x, y) = self.point;
    let system = self
      .inequalities
      .iter()
      .map(|i| format!("  {}", format_inequality(i.a, i.b, i.c, i.sign)))
      .collect::<Vec<_>>()
      .join("\n");
    GeneratedQuestion {
      text: format!(
        "Is the point ({x}, {y}) a solution of the system below? (answer '{YES}' or '{NO}')\n{system}"
      ),
      answer: Some(yes_no(self.is_solution())),
      validator: Some(ValidatorKind::CheckPoint),
      inequality: None,
    }
  }
}

pub fn inequality_check_point(rng: &mut dyn RngCore) -> GeneratedQuestion {
  CheckPointProblem::sample(rng).question()
}

/// `a·x + b·y + c <sign> 0`, sketched by the learner.
#[derive(Clone, Debug)]
pub struct RegionProblem {
  pub a: i64,
  pub b: i64,
  pub c: i64,
  pub sign: InequalitySign,
}

impl RegionProblem {
  pub fn sample(rng: &mut dyn RngCore) -> Self {
    let (a, b) = sample_direction(rng);
    let c = nonzero(rng, -9, 9);
    Self { a, b, c, sign: sample_sign(rng) }
  }

  pub fn inequality_string(&self) -> String {
    let constant = if self.c > 0 {
      format!(" + {}", self.c)
    } else {
      format!(" - {}", self.c.unsigned_abs())
    };
    format!("{}{} {} 0", format_linear_equation_lhs(self.a, self.b), constant, self.sign)
  }

  pub fn question(&self) -> GeneratedQuestion {
    let inequality = self.inequality_string();
    GeneratedQuestion {
      text: format!(
        "On the scratch pad below, shade the solution region of the linear inequality:\n\n    {inequality}\n\nWhen you are done, press \"Check with AI\"."
      ),
      answer: None,
      validator: None,
      inequality: Some(inequality),
    }
  }
}

pub fn inequality_region(rng: &mut dyn RngCore) -> GeneratedQuestion {
  RegionProblem::sample(rng).question()
}
