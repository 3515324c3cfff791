use crate::api::TodoClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::TodoListView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

/// Main application state
pub struct App {
  /// Navigation stack - the todo list is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command: CommandInput,

  /// Header title
  title: String,

  /// Feedback for the last palette command, cleared by the next key
  message: Option<String>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    let client = TodoClient::new(&config.api)?;
    let root = TodoListView::new(client);
    Ok(Self::with_root(config.display_title(), Box::new(root)))
  }

  pub fn with_root(title: String, root: Box<dyn View>) -> Self {
    Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      title,
      message: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.main_loop().await;

    // Cleanup terminal, also when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    info!("event loop started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    info!("event loop finished");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      // Redrawn at the top of the loop
      Event::Resize => {}
      Event::Tick => self.tick(),
    }
  }

  /// Poll every view, so the list keeps applying results while a detail
  /// view is on top
  fn tick(&mut self) {
    for view in &mut self.view_stack {
      view.tick();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    self.message = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The palette only opens while the view has no text field focused
    let captured = self.current_view().is_some_and(|v| v.captures_input());
    if self.command.is_active() || !captured {
      match self.command.handle_key(key) {
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.current_view_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    debug!(command = cmd, "execute command");
    match cmd {
      "todos" => self.view_stack.truncate(1),
      "add" => {
        // The create form lives on the list
        self.view_stack.truncate(1);
        if let Some(root) = self.view_stack.first_mut() {
          root.run_command(cmd);
        }
      }
      "quit" => self.should_quit = true,
      "" => {}
      _ => {
        let handled = self
          .current_view_mut()
          .is_some_and(|view| view.run_command(cmd));
        if !handled {
          self.message = Some(format!("Unknown command: {}", cmd));
        }
      }
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .current_view()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  /// Command feedback wins over the view's own status
  pub fn status(&self) -> Option<String> {
    self
      .message
      .clone()
      .or_else(|| self.current_view().and_then(|v| v.status()))
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}
