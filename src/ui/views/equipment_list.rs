use crate::backend::{CachedBackend, Equipment, Role};
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::EquipmentDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Whether an equipment record matches a filter query (case-insensitive)
pub fn matches_filter(item: &Equipment, query: &str) -> bool {
  let query = query.trim().to_lowercase();
  if query.is_empty() {
    return true;
  }

  let fields = [
    Some(item.id.as_str()),
    Some(item.name.as_str()),
    item.equipment_type.as_deref(),
    item.status.as_deref(),
  ];
  fields
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&query))
}

/// Root view listing all equipment
pub struct EquipmentListView {
  backend: CachedBackend,
  role: Role,
  query: Query<Vec<Equipment>>,
  list_state: ListState,
  search: SearchInput,
}

impl EquipmentListView {
  pub fn new(backend: CachedBackend, role: Role) -> Self {
    let backend_for_query = backend.clone();
    let mut query = Query::new(move || {
      let backend = backend_for_query.clone();
      async move { backend.list_equipment().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      backend,
      role,
      query,
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  fn filtered(&self) -> Vec<&Equipment> {
    let items = self.query.data().map(|v| v.as_slice()).unwrap_or(&[]);
    items
      .iter()
      .filter(|item| matches_filter(item, self.search.query()))
      .collect()
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let filtered = self.filtered();
    let total = self.query.data().map(Vec::len).unwrap_or(0);

    let count = if filtered.len() == total {
      format!("{}", total)
    } else {
      format!("{}/{}", filtered.len(), total)
    };
    let title = match self.query.state() {
      QueryState::Loading => " Equipment (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Equipment (error: {}) ", e),
      _ => format!(" Equipment ({}) ", count),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if filtered.is_empty() {
      let content = if self.query.is_loading() {
        "Loading equipment..."
      } else if self.query.is_error() {
        "Failed to load equipment. Press 'r' to retry."
      } else if total > 0 {
        "No equipment matches the filter."
      } else {
        "No equipment found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = filtered
      .iter()
      .map(|item| {
        let status = item.status.as_deref().unwrap_or("-");
        let line = Line::from(vec![
          Span::styled(
            format!("{:<28}", truncate(&item.name, 28)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<16}", truncate(status, 16)),
            Style::default().fg(status_color(status)),
          ),
          Span::raw(" "),
          Span::raw(format!(
            "{:<16}",
            truncate(item.equipment_type.as_deref().unwrap_or("-"), 16)
          )),
          Span::raw(" "),
          Span::styled(
            item.position().unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();
    let len = items.len();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    ensure_valid_selection(&mut self.list_state, len);
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn refresh(&mut self) {
    self.backend.invalidate_all();
    self.query.refetch();
  }

  fn open_selected(&self) -> ViewAction {
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| self.filtered().get(idx).map(|item| item.id.clone()));

    match selected {
      Some(id) => ViewAction::Push(Box::new(EquipmentDetailView::new(
        id,
        self.backend.clone(),
        self.role,
      ))),
      None => ViewAction::None,
    }
  }
}

impl View for EquipmentListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.search.query() {
      "" => "Equipment".to_string(),
      query => format!("Equipment [/{}]", query),
    }
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.search.is_active() {
      return vec![
        Shortcut::new("enter", "apply").with_priority(10),
        Shortcut::new("esc", "clear").with_priority(20),
      ];
    }

    vec![
      Shortcut::new("/", "filter").with_priority(10),
      Shortcut::new("enter", "open").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(30),
      Shortcut::new("q", "quit").with_priority(40),
    ]
  }
}
