//! A single text field that is read-only by default and editable by
//! authorized users, with remote persistence and a visible save lifecycle.
//!
//! The field takes two external signals, `set_authorized` and
//! `set_edit_mode`, and is editable only while both are true. Saves run as
//! spawned tasks; `poll()` applies the result on the UI tick:
//!
//! - success: cache entry overwritten, `on_save_success` called, timestamp set
//! - failure: blocking alert shown and error logged; nothing else changes

use super::alert::Alert;
use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::backend::{FieldStore, FieldUpdate};
use crate::cache::EntityCache;
use chrono::{DateTime, Local};
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Shown to the user for any failed save; backend detail only goes to the log.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save summary. Please try again.";

/// Called with the entity id and the normalized value after a successful save
pub type SaveCallback = Box<dyn FnMut(&str, Option<&str>)>;

/// Trim surrounding whitespace; an empty result becomes the "no value" marker.
pub fn normalize(input: &str) -> Option<String> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}

pub struct FieldOptions {
  /// Backend column written on save
  pub column: String,
  pub label: String,
  /// Shown when there is no value
  pub placeholder: String,
  /// Shown under the placeholder to users who may edit
  pub edit_hint: String,
  pub failure_message: String,
  pub on_save_success: Option<SaveCallback>,
}

impl Default for FieldOptions {
  fn default() -> Self {
    Self {
      column: "summary".to_string(),
      label: "Summary".to_string(),
      placeholder: "No summary available.".to_string(),
      edit_hint: "Press 'e' to add a summary.".to_string(),
      failure_message: SAVE_FAILED_MESSAGE.to_string(),
      on_save_success: None,
    }
  }
}

impl FieldOptions {
  pub fn on_save_success(mut self, callback: impl FnMut(&str, Option<&str>) + 'static) -> Self {
    self.on_save_success = Some(Box::new(callback));
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
  Idle,
  Saving,
  Saved(DateTime<Local>),
  Failed,
}

/// Observable state of the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
  Viewing,
  Editing,
  Saving,
  SaveSucceeded,
  SaveFailed,
}

/// What the field shows outside of edit mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayText {
  Value(String),
  /// No value; `show_hint` is set for users who can add one
  Empty { show_hint: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAttempt {
  Started,
  /// A save is still in flight; nothing was sent
  AlreadySaving,
  /// Not in edit mode; nothing was sent
  NotEditing,
}

/// Events emitted by the field that the parent view needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
  /// Esc pressed while editing; the parent owns the edit-mode signal
  ExitRequested,
}

struct PendingSave {
  entity_id: String,
  value: Option<String>,
  rx: oneshot::Receiver<Result<()>>,
}

pub struct EditableField {
  entity_id: String,
  initial: Option<String>,
  display: Option<String>,
  /// Present only while authorized and in edit mode
  draft: Option<TextInput>,
  status: SaveStatus,
  last_saved: Option<DateTime<Local>>,
  authorized: bool,
  edit_requested: bool,
  cache: EntityCache<Option<String>>,
  store: Arc<dyn FieldStore>,
  options: FieldOptions,
  pending: Option<PendingSave>,
  alert: Alert,
}

impl EditableField {
  pub fn new(
    entity_id: impl Into<String>,
    initial: Option<String>,
    cache: EntityCache<Option<String>>,
    store: Arc<dyn FieldStore>,
    options: FieldOptions,
  ) -> Self {
    let mut field = Self {
      entity_id: entity_id.into(),
      initial,
      display: None,
      draft: None,
      status: SaveStatus::Idle,
      last_saved: None,
      authorized: false,
      edit_requested: false,
      cache,
      store,
      options,
      pending: None,
      alert: Alert::new(),
    };
    field.display = field.resolve();
    field
  }

  /// Cached value if present, else the caller-supplied initial value
  fn resolve(&self) -> Option<String> {
    self
      .cache
      .get(&self.entity_id)
      .unwrap_or_else(|| self.initial.clone())
  }

  /// Point the field at an entity.
  ///
  /// Switching to a different entity resets the displayed value (cache
  /// first), the save status and the last-saved time. An in-flight save for
  /// the previous entity still completes against that entity, and the field
  /// stays in `Saving` until it has.
  pub fn set_entity(&mut self, entity_id: &str, initial: Option<String>) {
    self.initial = initial;
    if entity_id != self.entity_id {
      self.entity_id = entity_id.to_string();
      self.status = SaveStatus::Idle;
      self.last_saved = None;
      self.draft = None;
    }
    self.display = self.resolve();
    self.sync_draft();
  }

  /// External authorization signal. Revoking it discards any draft.
  pub fn set_authorized(&mut self, authorized: bool) {
    self.authorized = authorized;
    self.sync_draft();
  }

  /// External edit-mode signal. Ignored unless authorized.
  pub fn set_edit_mode(&mut self, edit: bool) {
    self.edit_requested = edit;
    self.sync_draft();
  }

  fn sync_draft(&mut self) {
    if !(self.authorized && self.edit_requested) {
      self.draft = None;
      return;
    }
    if self.draft.is_none() {
      self.display = self.resolve();
      let value = self.display.clone().unwrap_or_default();
      self.draft = Some(TextInput::with_value(&value));
    }
  }

  pub fn is_editing(&self) -> bool {
    self.draft.is_some()
  }

  #[cfg(test)]
  fn draft(&self) -> Option<&str> {
    self.draft.as_ref().map(|d| d.value())
  }

  #[cfg(test)]
  fn alert_message(&self) -> Option<&str> {
    self.alert.message()
  }

  pub fn status(&self) -> &SaveStatus {
    &self.status
  }

  pub fn last_saved(&self) -> Option<DateTime<Local>> {
    self.last_saved
  }

  pub fn state(&self) -> FieldState {
    // Any save in flight blocks the draft, including one for a previous entity
    if self.pending.is_some() {
      return FieldState::Saving;
    }
    if !self.is_editing() {
      return FieldState::Viewing;
    }
    match self.status {
      SaveStatus::Saved(_) => FieldState::SaveSucceeded,
      SaveStatus::Failed => FieldState::SaveFailed,
      SaveStatus::Idle | SaveStatus::Saving => FieldState::Editing,
    }
  }

  pub fn display_text(&self) -> DisplayText {
    match &self.display {
      Some(value) if !value.trim().is_empty() => DisplayText::Value(value.clone()),
      _ => DisplayText::Empty {
        show_hint: self.authorized,
      },
    }
  }

  /// Send the normalized draft to the store.
  ///
  /// At most one save is in flight per field; further attempts are refused
  /// until `poll()` has applied the result.
  pub fn save(&mut self) -> SaveAttempt {
    if self.pending.is_some() {
      return SaveAttempt::AlreadySaving;
    }
    let Some(draft) = &self.draft else {
      return SaveAttempt::NotEditing;
    };

    let value = normalize(draft.value());
    let update = FieldUpdate::new(self.options.column.as_str(), value.clone());
    info!(entity = %self.entity_id, column = %update.column, "saving field");

    let future = self.store.update_field(&self.entity_id, update);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });

    self.pending = Some(PendingSave {
      entity_id: self.entity_id.clone(),
      value,
      rx,
    });
    self.status = SaveStatus::Saving;
    SaveAttempt::Started
  }

  /// Apply a finished save. Returns `true` if anything changed.
  pub fn poll(&mut self) -> bool {
    let Some(mut pending) = self.pending.take() else {
      return false;
    };

    let result = match pending.rx.try_recv() {
      Ok(result) => result,
      Err(oneshot::error::TryRecvError::Empty) => {
        self.pending = Some(pending);
        return false;
      }
      Err(oneshot::error::TryRecvError::Closed) => Err(eyre!("save task ended without a result")),
    };

    let current = pending.entity_id == self.entity_id;
    match result {
      Ok(()) => {
        self.cache.set(&pending.entity_id, pending.value.clone());
        if let Some(callback) = self.options.on_save_success.as_mut() {
          callback(&pending.entity_id, pending.value.as_deref());
        }
        info!(entity = %pending.entity_id, "field saved");

        if current {
          let now = Local::now();
          self.status = SaveStatus::Saved(now);
          self.last_saved = Some(now);
          if let Some(draft) = self.draft.as_mut() {
            draft.set_value(pending.value.as_deref().unwrap_or_default());
          }
          self.display = pending.value.take();
        }
      }
      Err(e) => {
        error!(entity = %pending.entity_id, error = %e, "failed to save field");
        self.alert.show(self.options.failure_message.clone());
        if current {
          self.status = SaveStatus::Failed;
        }
      }
    }
    true
  }

  /// Handle keys while the alert is shown or the field is being edited.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FieldEvent> {
    match self.alert.handle_key(key) {
      KeyResult::NotHandled => {}
      _ => return KeyResult::Handled,
    }

    let Some(draft) = self.draft.as_mut() else {
      return KeyResult::NotHandled;
    };

    // Draft is frozen until the save settles
    if self.pending.is_some() {
      return KeyResult::Handled;
    }

    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.save();
      return KeyResult::Handled;
    }

    let before = draft.value().to_string();
    match draft.handle_key(key) {
      InputResult::Submitted(_) => {
        self.save();
        KeyResult::Handled
      }
      InputResult::Cancelled => KeyResult::Event(FieldEvent::ExitRequested),
      InputResult::Consumed => {
        if draft.value() != before && self.status != SaveStatus::Idle {
          self.status = SaveStatus::Idle;
        }
        KeyResult::Handled
      }
      // The draft owns the keyboard until the parent leaves edit mode
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  fn title(&self) -> String {
    match self.state() {
      FieldState::Saving => format!(" {} (saving...) ", self.options.label),
      FieldState::Editing | FieldState::SaveSucceeded | FieldState::SaveFailed => {
        format!(" {} (editing) ", self.options.label)
      }
      FieldState::Viewing => format!(" {} ", self.options.label),
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let border = if self.is_editing() {
      Color::Yellow
    } else {
      Color::Blue
    };

    let mut block = Block::default()
      .title(self.title())
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));
    if let Some(saved) = self.last_saved() {
      block = block.title_bottom(
        Line::from(format!(" Last saved {} ", saved.format("%H:%M:%S")))
          .right_aligned()
          .style(Style::default().fg(Color::Green)),
      );
    } else if *self.status() == SaveStatus::Failed {
      block = block.title_bottom(
        Line::from(" Not saved ")
          .right_aligned()
          .style(Style::default().fg(Color::Red)),
      );
    }

    let lines = match &self.draft {
      Some(draft) => {
        let (before, after) = draft.split_at_cursor();
        let mut lines = draft_lines(before, after);
        lines.push(Line::default());
        lines.push(Line::styled(
          "Enter: save  Esc: done",
          Style::default().fg(Color::DarkGray),
        ));
        lines
      }
      None => match self.display_text() {
        DisplayText::Value(text) => text.lines().map(|l| Line::from(l.to_string())).collect(),
        DisplayText::Empty { show_hint } => {
          let mut lines = vec![Line::styled(
            self.options.placeholder.as_str(),
            Style::default().fg(Color::DarkGray),
          )];
          if show_hint {
            lines.push(Line::styled(
              self.options.edit_hint.as_str(),
              Style::default().fg(Color::Cyan),
            ));
          }
          lines
        }
      },
    };

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  /// Draw the failure alert, if any, centered in `area`
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    self.alert.render_overlay(frame, area);
  }
}

/// Lay out the draft with a cursor marker, keeping embedded line breaks.
fn draft_lines<'a>(before: &'a str, after: &'a str) -> Vec<Line<'a>> {
  let mut before_parts: Vec<&str> = before.split('\n').collect();
  let mut after_parts = after.split('\n');
  let cursor_line_start = before_parts.pop().unwrap_or_default();
  let cursor_line_end = after_parts.next().unwrap_or_default();

  let mut lines: Vec<Line> = before_parts.into_iter().map(Line::raw).collect();
  lines.push(Line::from(vec![
    Span::raw(cursor_line_start),
    Span::styled("_", Style::default().fg(Color::Yellow)),
    Span::raw(cursor_line_end),
  ]));
  lines.extend(after_parts.map(Line::raw));
  lines
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::store::StoreFuture;
  use futures::FutureExt;
  use std::sync::Mutex;
  use std::time::Duration;
  use tokio::sync::Notify;

  type Calls = Arc<Mutex<Vec<(String, FieldUpdate)>>>;
  type Saved = Arc<Mutex<Vec<(String, Option<String>)>>>;

  #[derive(Default)]
  struct FakeStore {
    calls: Calls,
    fail: bool,
    /// When set, writes don't resolve until notified
    gate: Option<Arc<Notify>>,
  }

  impl FieldStore for FakeStore {
    fn update_field(&self, entity_id: &str, update: FieldUpdate) -> StoreFuture<()> {
      self
        .calls
        .lock()
        .unwrap()
        .push((entity_id.to_string(), update));
      let fail = self.fail;
      let gate = self.gate.clone();
      async move {
        if let Some(gate) = gate {
          gate.notified().await;
        }
        if fail {
          Err(eyre!("permission denied for table equipment"))
        } else {
          Ok(())
        }
      }
      .boxed()
    }
  }

  struct Harness {
    field: EditableField,
    cache: EntityCache<Option<String>>,
    calls: Calls,
    saved: Saved,
  }

  fn harness(store: FakeStore, cache: EntityCache<Option<String>>, initial: Option<&str>) -> Harness {
    let calls = store.calls.clone();
    let saved: Saved = Arc::default();
    let saved_clone = saved.clone();
    let options = FieldOptions::default().on_save_success(move |id, value| {
      saved_clone
        .lock()
        .unwrap()
        .push((id.to_string(), value.map(String::from)));
    });
    let field = EditableField::new(
      "E1",
      initial.map(String::from),
      cache.clone(),
      Arc::new(store),
      options,
    );
    Harness {
      field,
      cache,
      calls,
      saved,
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn edit_to(field: &mut EditableField, text: &str) {
    field.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
    for c in text.chars() {
      field.handle_key(key(KeyCode::Char(c)));
    }
  }

  async fn settle(field: &mut EditableField) {
    for _ in 0..100 {
      if field.poll() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("save did not settle");
  }

  #[test]
  fn test_normalize() {
    assert_eq!(normalize("  Needs service \n"), Some("Needs service".to_string()));
    assert_eq!(normalize("   "), None);
    assert_eq!(normalize(""), None);
  }

  #[test]
  fn test_initial_value_then_switch_entity() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));
    assert_eq!(h.field.state(), FieldState::Viewing);
    assert_eq!(h.field.display_text(), DisplayText::Value("Hello".to_string()));

    h.field.set_entity("E2", None);
    assert_eq!(
      h.field.display_text(),
      DisplayText::Empty { show_hint: false }
    );
  }

  #[test]
  fn test_cache_takes_precedence_over_initial() {
    let cache = EntityCache::new();
    cache.set("E1", Some("Cached text".to_string()));
    let mut h = harness(FakeStore::default(), cache, Some("Stale text"));
    assert_eq!(
      h.field.display_text(),
      DisplayText::Value("Cached text".to_string())
    );

    h.field.set_authorized(true);
    h.field.set_edit_mode(true);
    assert_eq!(h.field.draft(), Some("Cached text"));
  }

  #[tokio::test]
  async fn test_unauthorized_never_edits() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));

    for edit in [true, false, true] {
      h.field.set_edit_mode(edit);
      assert_eq!(h.field.state(), FieldState::Viewing);
      assert!(h.field.draft().is_none());
    }

    assert_eq!(h.field.save(), SaveAttempt::NotEditing);
    assert_eq!(h.field.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
    assert!(h.calls.lock().unwrap().is_empty());
  }

  #[test]
  fn test_revoking_authorization_discards_draft() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);
    assert_eq!(h.field.state(), FieldState::Editing);

    h.field.set_authorized(false);
    assert_eq!(h.field.state(), FieldState::Viewing);
    assert!(h.field.draft().is_none());
  }

  #[tokio::test]
  async fn test_whitespace_saves_no_value_marker() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);

    edit_to(&mut h.field, "   ");
    assert_eq!(h.field.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    settle(&mut h.field).await;

    let calls = h.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![("E1".to_string(), FieldUpdate::new("summary", None))]);
    assert_eq!(h.cache.get("E1"), Some(None));

    h.field.set_edit_mode(false);
    assert_eq!(h.field.display_text(), DisplayText::Empty { show_hint: true });
  }

  #[tokio::test]
  async fn test_save_trims_and_notifies_once() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), None);
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);

    edit_to(&mut h.field, "  Hydraulic leak fixed  ");
    assert_eq!(h.field.save(), SaveAttempt::Started);
    assert_eq!(h.field.state(), FieldState::Saving);
    settle(&mut h.field).await;

    let expected = Some("Hydraulic leak fixed".to_string());
    assert_eq!(
      h.calls.lock().unwrap()[0].1,
      FieldUpdate::new("summary", expected.clone())
    );
    assert_eq!(h.cache.get("E1"), Some(expected.clone()));
    assert_eq!(
      h.saved.lock().unwrap().clone(),
      vec![("E1".to_string(), expected)]
    );
    assert_eq!(h.field.state(), FieldState::SaveSucceeded);
    assert!(matches!(h.field.status(), SaveStatus::Saved(_)));
    assert!(h.field.last_saved().is_some());
    assert_eq!(h.field.draft(), Some("Hydraulic leak fixed"));
    assert!(!h.field.poll());
  }

  #[tokio::test]
  async fn test_failed_save_leaves_state_untouched() {
    let cache = EntityCache::new();
    cache.set("E1", Some("Before".to_string()));
    let store = FakeStore {
      fail: true,
      ..Default::default()
    };
    let mut h = harness(store, cache, None);
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);

    edit_to(&mut h.field, "After");
    h.field.save();
    settle(&mut h.field).await;

    assert!(h.saved.lock().unwrap().is_empty());
    assert_eq!(h.cache.get("E1"), Some(Some("Before".to_string())));
    assert_eq!(h.field.alert_message(), Some(SAVE_FAILED_MESSAGE));
    assert_eq!(h.field.state(), FieldState::SaveFailed);
    assert_eq!(h.field.draft(), Some("After"));
    assert!(h.field.last_saved().is_none());

    // Alert blocks the draft until dismissed
    h.field.handle_key(key(KeyCode::Char('!')));
    assert_eq!(h.field.draft(), Some("After"));
    h.field.handle_key(key(KeyCode::Enter));
    assert_eq!(h.field.alert_message(), None);
    assert_eq!(h.calls.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_save_is_not_reentrant() {
    let gate = Arc::new(Notify::new());
    let store = FakeStore {
      gate: Some(gate.clone()),
      ..Default::default()
    };
    let mut h = harness(store, EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);

    assert_eq!(h.field.save(), SaveAttempt::Started);
    assert_eq!(h.field.save(), SaveAttempt::AlreadySaving);
    h.field.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!h.field.poll());
    assert_eq!(h.calls.lock().unwrap().len(), 1);

    gate.notify_one();
    settle(&mut h.field).await;
    assert_eq!(h.calls.lock().unwrap().len(), 1);
    assert_eq!(h.saved.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_switching_entity_resets_status() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);
    h.field.save();
    settle(&mut h.field).await;
    assert_eq!(h.field.state(), FieldState::SaveSucceeded);

    h.field.set_entity("E2", Some("Other".to_string()));
    assert_eq!(h.field.status(), &SaveStatus::Idle);
    assert_eq!(h.field.state(), FieldState::Editing);
    assert_eq!(h.field.draft(), Some("Other"));
    assert!(h.field.last_saved().is_none());
  }

  #[tokio::test]
  async fn test_switching_entity_mid_save_stays_saving() {
    let gate = Arc::new(Notify::new());
    let store = FakeStore {
      gate: Some(gate.clone()),
      ..Default::default()
    };
    let mut h = harness(store, EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);
    assert_eq!(h.field.save(), SaveAttempt::Started);

    h.field.set_entity("E2", Some("Other".to_string()));
    assert_eq!(h.field.state(), FieldState::Saving);
    assert_eq!(h.field.save(), SaveAttempt::AlreadySaving);
    assert_eq!(h.field.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert_eq!(h.field.draft(), Some("Other"));

    gate.notify_one();
    settle(&mut h.field).await;

    // The earlier save lands on its own entity only
    assert_eq!(h.cache.get("E1"), Some(Some("Hello".to_string())));
    assert_eq!(h.cache.get("E2"), None);
    assert_eq!(
      h.saved.lock().unwrap().clone(),
      vec![("E1".to_string(), Some("Hello".to_string()))]
    );
    assert_eq!(h.field.state(), FieldState::Editing);
    assert!(h.field.last_saved().is_none());

    h.field.handle_key(key(KeyCode::Char('x')));
    assert_eq!(h.field.draft(), Some("Otherx"));
  }

  #[test]
  fn test_editing_keeps_navigation_keys() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), Some("Hello"));
    h.field.set_authorized(true);
    assert_eq!(h.field.handle_key(key(KeyCode::Tab)), KeyResult::NotHandled);

    h.field.set_edit_mode(true);
    assert_eq!(h.field.handle_key(key(KeyCode::Tab)), KeyResult::Handled);
    assert_eq!(h.field.handle_key(key(KeyCode::Up)), KeyResult::Handled);
    assert_eq!(h.field.draft(), Some("Hello"));
  }

  #[test]
  fn test_draft_lines_keep_line_breaks() {
    let lines = draft_lines("Hydraulics ok\nTyres wo", "rn\nCheck in May");
    let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    assert_eq!(text, vec!["Hydraulics ok", "Tyres wo_rn", "Check in May"]);

    let single = draft_lines("abc", "");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].to_string(), "abc_");
  }

  #[test]
  fn test_escape_requests_exit() {
    let mut h = harness(FakeStore::default(), EntityCache::new(), None);
    h.field.set_authorized(true);
    h.field.set_edit_mode(true);
    assert_eq!(
      h.field.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FieldEvent::ExitRequested)
    );
    // Leaving edit mode is the parent's call
    assert!(h.field.is_editing());
  }
}
