use ratatui::prelude::Color;

/// Truncate to at most `max_len` chars, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for an equipment status
pub fn status_color(status: &str) -> Color {
  match status.to_lowercase().replace('_', " ").as_str() {
    "available" | "in service" | "active" => Color::Green,
    "maintenance" | "in repair" | "reserved" => Color::Yellow,
    "out of service" | "broken" | "lost" => Color::Red,
    _ => Color::White,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Grävmaskin 12", 7), "Gräv...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color("in_service"), Color::Green);
    assert_eq!(status_color("Maintenance"), Color::Yellow);
    assert_eq!(status_color("out_of_service"), Color::Red);
    assert_eq!(status_color("unknown"), Color::White);
  }
}
