use crate::backend::{CachedBackend, Equipment, LogEntry, Role};
use crate::query::{Query, QueryState};
use crate::ui::components::{EditableField, FieldEvent, FieldOptions, KeyResult};
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
  Summary,
  Logs,
}

impl Tab {
  fn next(self) -> Self {
    match self {
      Tab::Summary => Tab::Logs,
      Tab::Logs => Tab::Summary,
    }
  }
}

/// Details, editable summary and logs of one equipment record
pub struct EquipmentDetailView {
  id: String,
  backend: CachedBackend,
  role: Role,
  equipment: Query<Equipment>,
  logs: Query<Vec<LogEntry>>,
  summary: Option<EditableField>,
  edit_mode: bool,
  tab: Tab,
}

impl EquipmentDetailView {
  pub fn new(id: String, backend: CachedBackend, role: Role) -> Self {
    let equipment_backend = backend.clone();
    let equipment_id = id.clone();
    let mut equipment = Query::new(move || {
      let backend = equipment_backend.clone();
      let id = equipment_id.clone();
      async move { backend.get_equipment(&id).await.map_err(|e| e.to_string()) }
    });

    let logs_backend = backend.clone();
    let logs_id = id.clone();
    let mut logs = Query::new(move || {
      let backend = logs_backend.clone();
      let id = logs_id.clone();
      async move { backend.list_logs(&id).await.map_err(|e| e.to_string()) }
    });

    equipment.fetch();
    logs.fetch();

    Self {
      id,
      backend,
      role,
      equipment,
      logs,
      summary: None,
      edit_mode: false,
      tab: Tab::Summary,
    }
  }

  /// Create the summary field on first load, re-point it on later loads
  fn sync_summary(&mut self) {
    let Some(equipment) = self.equipment.data() else {
      return;
    };
    let initial = equipment.summary.clone();

    match self.summary.as_mut() {
      Some(field) => field.set_entity(&self.id, initial),
      None => {
        // Keep the cached record in step so reopening shows the saved text
        let records = self.backend.equipment_cache().clone();
        let options = FieldOptions::default().on_save_success(move |id, value| {
          records.update(id, |record| record.summary = value.map(String::from));
        });

        let mut field = EditableField::new(
          self.id.clone(),
          initial,
          self.backend.summaries().clone(),
          self.backend.field_store(),
          options,
        );
        field.set_authorized(self.role.can_edit());
        field.set_edit_mode(self.edit_mode);
        self.summary = Some(field);
      }
    }
  }

  fn set_edit_mode(&mut self, edit: bool) {
    self.edit_mode = edit;
    if let Some(field) = self.summary.as_mut() {
      field.set_edit_mode(edit);
    }
  }

  fn is_editing(&self) -> bool {
    self.summary.as_ref().is_some_and(|f| f.is_editing())
  }

  fn refresh(&mut self) {
    self.backend.invalidate(&self.id);
    self.equipment.refetch();
    self.logs.refetch();
  }

  fn render_header(&self, frame: &mut Frame, area: Rect) {
    let title = match self.equipment.state() {
      QueryState::Loading => format!(" {} (loading...) ", self.id),
      QueryState::Error(e) => format!(" {} (error: {}) ", self.id, e),
      _ => format!(
        " {} ",
        self.equipment.data().map(|e| e.name.as_str()).unwrap_or(&self.id)
      ),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(equipment) = self.equipment.data() else {
      let content = if self.equipment.is_error() {
        "Failed to load equipment. Press 'r' to retry."
      } else {
        "Loading equipment..."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let status = equipment.status.as_deref().unwrap_or("unknown");
    let lines = vec![
      Line::from(vec![
        Span::styled("Type: ", label),
        Span::raw(equipment.equipment_type.as_deref().unwrap_or("-")),
        Span::raw("  "),
        Span::styled("Status: ", label),
        Span::styled(status, Style::default().fg(status_color(status))),
      ]),
      Line::from(vec![
        Span::styled("Position: ", label),
        Span::raw(equipment.position().unwrap_or_else(|| "unknown".to_string())),
      ]),
      Line::from(vec![
        Span::styled("Updated: ", label),
        Span::raw(
          equipment
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string()),
        ),
      ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_tabs(&self, frame: &mut Frame, area: Rect) {
    let log_count = self.logs.data().map(Vec::len).unwrap_or(0);
    let tabs = [
      (Tab::Summary, "Summary".to_string()),
      (Tab::Logs, format!("Logs ({})", log_count)),
    ];

    let mut spans = Vec::new();
    for (idx, (tab, name)) in tabs.into_iter().enumerate() {
      if idx > 0 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
      let style = if tab == self.tab {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(format!(" {} ", name), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_logs(&self, frame: &mut Frame, area: Rect) {
    let title = match self.logs.state() {
      QueryState::Loading => " Logs (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Logs (error: {}) ", e),
      _ => " Logs ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let entries = self.logs.data().map(|v| v.as_slice()).unwrap_or(&[]);
    if entries.is_empty() {
      let paragraph = Paragraph::new("No log entries.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = entries
      .iter()
      .map(|entry| {
        let header = format!(
          "{}  {}",
          entry.created_at.format("%Y-%m-%d %H:%M"),
          entry.author.as_deref().unwrap_or("unknown")
        );
        ListItem::new(vec![
          Line::styled(header, Style::default().fg(Color::DarkGray)),
          Line::from(truncate(&entry.note, width)),
        ])
      })
      .collect();

    frame.render_widget(List::new(items).block(block), area);
  }
}

impl View for EquipmentDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // The field gets first pick: it owns the alert and, while editing, the keyboard
    if let Some(field) = self.summary.as_mut() {
      match field.handle_key(key) {
        KeyResult::Event(FieldEvent::ExitRequested) => {
          self.set_edit_mode(false);
          return ViewAction::None;
        }
        KeyResult::Handled => return ViewAction::None,
        KeyResult::NotHandled => {}
      }
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab => self.tab = self.tab.next(),
      KeyCode::Char('e') => {
        self.tab = Tab::Summary;
        let edit = !self.edit_mode;
        self.set_edit_mode(edit);
      }
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(5), // Record fields
        Constraint::Length(1), // Tabs
        Constraint::Min(3),    // Tab content
      ])
      .split(area);

    self.render_header(frame, chunks[0]);
    self.render_tabs(frame, chunks[1]);

    match (self.tab, &self.summary) {
      (Tab::Summary, Some(field)) => field.render(frame, chunks[2]),
      (Tab::Summary, None) => {
        let block = Block::default()
          .title(" Summary ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue));
        frame.render_widget(block, chunks[2]);
      }
      (Tab::Logs, _) => self.render_logs(frame, chunks[2]),
    }

    if let Some(field) = &self.summary {
      field.render_overlay(frame, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    self
      .equipment
      .data()
      .map(|e| e.name.clone())
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    if self.equipment.poll() {
      self.sync_summary();
    }
    self.logs.poll();
    if let Some(field) = self.summary.as_mut() {
      field.poll();
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.is_editing() {
      return vec![
        Shortcut::new("enter", "save").with_priority(10),
        Shortcut::new("esc", "done").with_priority(20),
      ];
    }

    let mut shortcuts = vec![
      Shortcut::new("tab", "switch tab").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "back").with_priority(40),
    ];
    if self.role.can_edit() {
      shortcuts.push(Shortcut::new("e", "edit summary").with_priority(10));
    }
    shortcuts
  }
}
