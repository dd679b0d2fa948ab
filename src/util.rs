//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings, on a char boundary.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}

/// First line of a reply; the whole string if it has no newline.
pub fn first_line(s: &str) -> &str {
  s.lines().next().unwrap_or("")
}

/// Non-empty trimmed value of an optional request field.
pub fn non_blank(v: Option<&str>) -> Option<&str> {
  v.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_fills_every_occurrence() {
    assert_eq!(fill_template("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]), "x and x then y");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    assert_eq!(trunc_for_log("ééééé", 2), "éé… (10 bytes total)");
  }

  #[test]
  fn first_line_and_blank_checks() {
    assert_eq!(first_line("INCORRECT: sign\nmore"), "INCORRECT: sign");
    assert_eq!(first_line(""), "");
    assert_eq!(non_blank(Some("  ")), None);
    assert_eq!(non_blank(Some(" 4 ")), Some("4"));
    assert_eq!(non_blank(None), None);
  }
}
