use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Modal message box. While shown it swallows every key; Enter or Esc
/// dismisses it.
#[derive(Debug, Clone, Default)]
pub struct Alert {
  message: Option<String>,
}

impl Alert {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.message.is_some()
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  pub fn dismiss(&mut self) {
    self.message = None;
  }

  /// Returns `Event(())` when the alert was dismissed
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<()> {
    if !self.is_active() {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Enter | KeyCode::Esc => {
        self.dismiss();
        KeyResult::Event(())
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(message) = self.message() else {
      return;
    };

    let width = (message.chars().count() as u16 + 6)
      .clamp(30, 60)
      .min(area.width);
    let height = 5.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Error ")
      .title_bottom(Line::from(" Enter: dismiss ").right_aligned());

    let paragraph = Paragraph::new(message)
      .block(block)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, overlay_area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_alert_blocks_until_dismissed() {
    let mut alert = Alert::new();
    assert_eq!(alert.handle_key(key(KeyCode::Char('q'))), KeyResult::NotHandled);

    alert.show("Something broke");
    assert_eq!(alert.handle_key(key(KeyCode::Char('q'))), KeyResult::Handled);
    assert!(alert.is_active());

    assert_eq!(alert.handle_key(key(KeyCode::Enter)), KeyResult::Event(()));
    assert!(!alert.is_active());
  }
}
