//! Rendering integer coefficients as readable expressions, plus the inequality
//! evaluator shared by the generators.

use std::fmt;

/// Comparison operator of a linear inequality `a·x + b·y <sign> c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InequalitySign {
  Gt,
  Ge,
  Lt,
  Le,
}

impl InequalitySign {
  pub const ALL: [InequalitySign; 4] = [Self::Gt, Self::Ge, Self::Lt, Self::Le];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Gt => ">",
      Self::Ge => ">=",
      Self::Lt => "<",
      Self::Le => "<=",
    }
  }

  /// Does `lhs <sign> rhs` hold?
  pub fn holds(self, lhs: i64, rhs: i64) -> bool {
    match self {
      Self::Gt => lhs > rhs,
      Self::Ge => lhs >= rhs,
      Self::Lt => lhs < rhs,
      Self::Le => lhs <= rhs,
    }
  }
}

impl fmt::Display for InequalitySign {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Render Σ coeff·x^power, highest degree first.
///
/// Zero terms are skipped, a magnitude of 1 is omitted except on the constant
/// term, and `"0"` is returned when every coefficient is zero.
pub fn format_polynomial(coeffs: &[i64]) -> String {
  let degree = coeffs.len().saturating_sub(1);
  let mut out = String::new();

  for (i, &coeff) in coeffs.iter().enumerate() {
    if coeff == 0 {
      continue;
    }
    let power = degree - i;
    push_signed(&mut out, coeff);

    let magnitude = coeff.unsigned_abs();
    if magnitude != 1 || power == 0 {
      out.push_str(&magnitude.to_string());
    }
    match power {
      0 => {}
      1 => out.push('x'),
      p => out.push_str(&format!("x^{p}")),
    }
  }

  if out.is_empty() { "0".into() } else { out }
}

/// Render `ax + by`, omitting zero terms and unit magnitudes.
pub fn format_linear_equation_lhs(a: i64, b: i64) -> String {
  let mut out = String::new();
  push_term(&mut out, a, "x");
  push_term(&mut out, b, "y");
  if out.is_empty() { "0".into() } else { out }
}

/// Render the right-hand side `m·var + k` of a slope-intercept equation.
pub fn format_slope_intercept(m: i64, var: &str, k: i64) -> String {
  let mut out = String::new();
  push_term(&mut out, m, var);
  if k != 0 {
    push_signed(&mut out, k);
    out.push_str(&k.unsigned_abs().to_string());
  }
  if out.is_empty() { "0".into() } else { out }
}

/// `ax + by <sign> c`
pub fn format_inequality(a: i64, b: i64, c: i64, sign: InequalitySign) -> String {
  format!("{} {} {}", format_linear_equation_lhs(a, b), sign, c)
}

/// Is the point (x, y) inside `ax + by <sign> c`?
pub fn check_inequality(a: i64, b: i64, c: i64, sign: InequalitySign, x: i64, y: i64) -> bool {
  sign.holds(a * x + b * y, c)
}

/// Horner evaluation, coefficients highest degree first.
pub fn evaluate_polynomial(coeffs: &[i64], x: i64) -> i64 {
  coeffs.iter().fold(0, |acc, &c| acc * x + c)
}

/// `(x)`, `(x - k)` or `(x + |k|)`.
pub fn format_divisor(k: i64) -> String {
  match k {
    0 => "(x)".into(),
    k if k > 0 => format!("(x - {k})"),
    k => format!("(x + {})", k.unsigned_abs()),
  }
}

// Sign separator for the next nonzero term: nothing or "-" up front, " + "/" - " after.
fn push_signed(out: &mut String, value: i64) {
  match (out.is_empty(), value < 0) {
    (true, false) => {}
    (true, true) => out.push('-'),
    (false, false) => out.push_str(" + "),
    (false, true) => out.push_str(" - "),
  }
}

fn push_term(out: &mut String, coeff: i64, var: &str) {
  if coeff == 0 {
    return;
  }
  push_signed(out, coeff);
  let magnitude = coeff.unsigned_abs();
  if magnitude != 1 {
    out.push_str(&magnitude.to_string());
  }
  out.push_str(var);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn polynomial_skips_zero_terms_and_unit_coefficients() {
    assert_eq!(format_polynomial(&[1, 0, -3, 5]), "x^3 - 3x + 5");
    assert_eq!(format_polynomial(&[-2, 1, -1]), "-2x^2 + x - 1");
    assert_eq!(format_polynomial(&[3, -1, 0]), "3x^2 - x");
  }

  #[test]
  fn polynomial_keeps_unit_constant() {
    assert_eq!(format_polynomial(&[2, 0, 1]), "2x^2 + 1");
    assert_eq!(format_polynomial(&[0, 0, -1]), "-1");
  }

  #[test]
  fn polynomial_all_zero_is_zero() {
    assert_eq!(format_polynomial(&[0, 0, 0]), "0");
    assert_eq!(format_polynomial(&[]), "0");
  }

  #[test]
  fn leading_zeros_do_not_emit_a_dangling_plus() {
    assert_eq!(format_polynomial(&[0, 4, 2]), "4x + 2");
  }

  #[test]
  fn linear_lhs_rendering() {
    assert_eq!(format_linear_equation_lhs(2, 3), "2x + 3y");
    assert_eq!(format_linear_equation_lhs(-1, -1), "-x - y");
    assert_eq!(format_linear_equation_lhs(1, -4), "x - 4y");
    assert_eq!(format_linear_equation_lhs(0, -2), "-2y");
    assert_eq!(format_linear_equation_lhs(0, 1), "y");
    assert_eq!(format_linear_equation_lhs(5, 0), "5x");
    assert_eq!(format_linear_equation_lhs(0, 0), "0");
  }

  #[test]
  fn slope_intercept_rendering() {
    assert_eq!(format_slope_intercept(3, "x", 2), "3x + 2");
    assert_eq!(format_slope_intercept(-1, "y", -4), "-y - 4");
    assert_eq!(format_slope_intercept(1, "x", 0), "x");
  }

  #[test]
  fn inequality_string_and_check() {
    assert_eq!(format_inequality(2, -1, 3, InequalitySign::Ge), "2x - y >= 3");
    assert!(check_inequality(2, -1, 3, InequalitySign::Ge, 2, 1));
    assert!(!check_inequality(2, -1, 3, InequalitySign::Gt, 2, 1));
    assert!(check_inequality(1, 1, 0, InequalitySign::Lt, -1, 0));
    assert!(check_inequality(1, 1, 0, InequalitySign::Le, 0, 0));
  }

  #[test]
  fn horner_matches_expanded_form() {
    // 2x^3 - x^2 + 4 at x = -2
    assert_eq!(evaluate_polynomial(&[2, -1, 0, 4], -2), -16 - 4 + 4);
  }

  #[test]
  fn divisor_forms() {
    assert_eq!(format_divisor(0), "(x)");
    assert_eq!(format_divisor(2), "(x - 2)");
    assert_eq!(format_divisor(-3), "(x + 3)");
  }
}
