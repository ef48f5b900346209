use crate::backend::{CachedBackend, RestClient, Role};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::EquipmentListView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Header title
  title: String,

  backend_url: String,

  /// Access level resolved at startup
  role: Role,

  /// Shown at the right of the footer
  notice: Option<String>,

  should_quit: bool,
}

impl App {
  pub async fn new(config: Config) -> Result<Self> {
    let client = RestClient::new(&config)?;
    let backend_url = client.base_url().to_string();
    let signed_in = client.is_signed_in();
    let backend = CachedBackend::new(client, config.cache.ttl());

    let role = match backend.current_role().await {
      Ok(role) => role,
      Err(e) => {
        warn!(error = %e, "could not resolve role, continuing read-only");
        Role::Viewer
      }
    };
    info!(role = role.label(), signed_in, "session started");

    let notice = if !signed_in {
      Some("not signed in, read-only".to_string())
    } else if !role.can_edit() {
      Some("read-only".to_string())
    } else {
      None
    };

    Ok(Self {
      view_stack: vec![Box::new(EquipmentListView::new(backend, role))],
      title: config.title.unwrap_or_else(|| "eqtrack".to_string()),
      backend_url,
      role,
      notice,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize | Event::Tick => {}
    }

    // Pending fetches and saves progress on every event, not just ticks
    for view in &mut self.view_stack {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let Some(view) = self.view_stack.last_mut() else {
      self.should_quit = true;
      return;
    };

    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Quit => self.should_quit = true,
    }
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn backend_url(&self) -> &str {
    &self.backend_url
  }

  pub fn role(&self) -> Role {
    self.role
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }
}
