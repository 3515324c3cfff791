use chrono::{DateTime, Utc};
use ratatui::prelude::Color;

/// Glyph shown for a finished todo
pub const DONE_GLYPH: &str = "☑";
/// Glyph shown for an open todo
pub const NOT_DONE_GLYPH: &str = "☒";

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Toggle glyph for a todo's done flag
pub fn done_glyph(done: bool) -> &'static str {
  if done {
    DONE_GLYPH
  } else {
    NOT_DONE_GLYPH
  }
}

pub fn done_color(done: bool) -> Color {
  if done {
    Color::Green
  } else {
    Color::Red
  }
}

/// Render a deadline as a calendar date
pub fn format_deadline(deadline: Option<DateTime<Utc>>) -> String {
  deadline
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("ääääääää", 5), "ää...");
  }

  #[test]
  fn test_done_glyph() {
    assert_eq!(done_glyph(true), "☑");
    assert_eq!(done_glyph(false), "☒");
    assert_eq!(done_color(true), Color::Green);
    assert_eq!(done_color(false), Color::Red);
  }

  #[test]
  fn test_format_deadline() {
    let d = Utc.with_ymd_and_hms(2023, 10, 10, 15, 30, 0).unwrap();
    assert_eq!(format_deadline(Some(d)), "2023-10-10");
    assert_eq!(format_deadline(None), "");
  }
}
