//! Phone number normalization.
//!
//! Every phone number is rewritten into one canonical form before it is
//! stored or matched: a leading `+` followed by digits only. Numbers without
//! an international prefix are assumed to be North American, so ten-digit
//! numbers gain the `+1` country code.

/// Rewrite `raw` into canonical form.
///
/// Idempotent: `format_phone_number(&format_phone_number(x)) ==
/// format_phone_number(x)`. Input without any digits is returned trimmed.
pub fn format_phone_number(raw: &str) -> String {
  let trimmed = raw.trim();
  let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

  if digits.is_empty() {
    return trimmed.to_owned();
  }

  if trimmed.starts_with('+') {
    return format!("+{digits}");
  }

  if let Some(rest) = digits.strip_prefix("00")
    && !rest.is_empty()
  {
    return format!("+{rest}");
  }

  match digits.len() {
    10 => format!("+1{digits}"),
    _ => format!("+{digits}"),
  }
}
