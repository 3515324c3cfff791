use crate::api::{RemoteStore, TodoRecord};
use crate::store::TodoStore;
use crate::ui::components::{
  CreateTodoModal, FormEvent, KeyResult, SearchEvent, SearchInput, TodoForm,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{done_color, done_glyph, format_deadline, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::TodoDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::debug;

/// Per-row mode. At most one row is edited at a time.
enum RowMode {
  Viewing,
  Editing { id: i64, form: TodoForm },
}

/// Root view: every cached todo with toggle, edit and delete actions
pub struct TodoListView<R: RemoteStore> {
  store: TodoStore<R>,
  list_state: ListState,
  search: SearchInput,
  filter: String,
  create: CreateTodoModal,
  row_mode: RowMode,
  /// Action rejected locally, shown until the next key press
  notice: Option<String>,
}

impl<R: RemoteStore> TodoListView<R> {
  pub fn new(remote: R) -> Self {
    let mut store = TodoStore::new(remote);

    // Start fetching immediately
    store.load();

    Self {
      store,
      list_state: ListState::default(),
      search: SearchInput::new(),
      filter: String::new(),
      create: CreateTodoModal::new(),
      row_mode: RowMode::Viewing,
      notice: None,
    }
  }

  /// Cached todos matching the search filter, in server order
  fn visible(&self) -> Vec<&TodoRecord> {
    let needle = self.filter.to_lowercase();
    self
      .store
      .todos()
      .unwrap_or(&[])
      .iter()
      .filter(|t| needle.is_empty() || matches_filter(t, &needle))
      .collect()
  }

  fn selected_id(&self) -> Option<i64> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|t| t.id)
  }

  fn editing_id(&self) -> Option<i64> {
    match &self.row_mode {
      RowMode::Editing { id, .. } => Some(*id),
      RowMode::Viewing => None,
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let mut title = match self.store.todos() {
      None => " Todos ".to_string(),
      Some(_) if self.filter.is_empty() => format!(" Todos ({}) ", self.visible().len()),
      Some(todos) => format!(
        " Todos ({}/{}) [/{}] ",
        self.visible().len(),
        todos.len(),
        self.filter
      ),
    };
    if let Some(error) = self.store.last_error() {
      title.push_str(&format!("(error: {}) ", truncate(error, 60)));
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    // Placeholder until the first list arrives, never an empty list
    if self.store.todos().is_none() {
      let (content, style) = match self.store.last_error() {
        Some(error) if !self.store.is_loading() => (
          format!("Failed to load todos: {}\n\nPress 'r' to retry.", error),
          Style::default().fg(Color::Red),
        ),
        _ => ("Loading...".to_string(), Style::default().fg(Color::DarkGray)),
      };
      frame.render_widget(Paragraph::new(content).block(block).style(style), area);
      return;
    }

    let editing = self.editing_id();
    let width = area.width.saturating_sub(8) as usize;

    // Collect owned items first to avoid borrow conflicts with list_state
    let items: Vec<ListItem> = self
      .visible()
      .into_iter()
      .map(|todo| todo_item(todo, editing == Some(todo.id), width))
      .collect();
    let len = items.len();

    if len == 0 {
      let content = if self.filter.is_empty() {
        "No todos yet. Press 'a' to add one."
      } else {
        "No todos match the filter."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    ensure_valid_selection(&mut self.list_state, len);

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.create.handle_key(key) {
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(FormEvent::Submitted(values)) => {
        debug!(title = %values.title, "submitting new todo");
        self.store.create(values.into_new_todo());
        return Some(ViewAction::None);
      }
      KeyResult::Event(FormEvent::Cancelled) => return Some(ViewAction::None),
      KeyResult::NotHandled => {}
    }

    if let RowMode::Editing { id, form } = &mut self.row_mode {
      let id = *id;
      match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(values)) => {
          match self.store.get(id).cloned() {
            Some(todo) => self.store.update(values.apply_to(&todo)),
            None => self.notice = Some(format!("Todo {} no longer exists", id)),
          }
          self.row_mode = RowMode::Viewing;
        }
        KeyResult::Event(FormEvent::Cancelled) => self.row_mode = RowMode::Viewing,
        KeyResult::Handled | KeyResult::NotHandled => {}
      }
      return Some(ViewAction::None);
    }

    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter = query;
        let len = self.visible().len();
        self.list_state.select(None);
        ensure_valid_selection(&mut self.list_state, len);
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('g') | KeyCode::Home => {
        self.list_state.select_first();
        Some(ViewAction::None)
      }
      KeyCode::Char('G') | KeyCode::End => {
        self.list_state.select_last();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char(' ') | KeyCode::Char('x') => {
        let id = self.selected_id()?;
        if let Err(e) = self.store.toggle_done(id) {
          self.notice = Some(e.to_string());
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let todo = self.store.get(self.selected_id()?)?;
        self.row_mode = RowMode::Editing {
          id: todo.id,
          form: TodoForm::edit(todo),
        };
        Some(ViewAction::None)
      }
      KeyCode::Char('d') | KeyCode::Delete => {
        let id = self.selected_id()?;
        self.store.delete(id);
        Some(ViewAction::None)
      }
      KeyCode::Char('a') => {
        self.create.open();
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.store.revalidate();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let todo = self.store.get(self.selected_id()?)?;
        Some(ViewAction::Push(Box::new(TodoDetailView::new(
          todo.id,
          todo.title.clone(),
          self.store.remote().clone(),
        ))))
      }
      KeyCode::Esc if !self.filter.is_empty() => {
        self.filter.clear();
        Some(ViewAction::None)
      }
      KeyCode::Char('q') => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl<R: RemoteStore> View for TodoListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self.notice = None;
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match &self.row_mode {
      RowMode::Viewing => self.render_list(frame, area),
      RowMode::Editing { form, .. } => {
        let form_height = form.height();
        let chunks = Layout::default()
          .direction(Direction::Vertical)
          .constraints([Constraint::Min(3), Constraint::Length(form_height)])
          .split(area);
        self.render_list(frame, chunks[0]);
        if let RowMode::Editing { form, .. } = &self.row_mode {
          form.render(frame, chunks[1]);
        }
      }
    }

    self.search.render_overlay(frame, area);
    self.create.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Todos".to_string()
  }

  fn tick(&mut self) {
    if self.store.poll() {
      let len = self.visible().len();
      ensure_valid_selection(&mut self.list_state, len);
    }
  }

  fn captures_input(&self) -> bool {
    self.create.is_open() || self.editing_id().is_some() || self.search.is_active()
  }

  fn run_command(&mut self, command: &str) -> bool {
    match command {
      "add" => {
        self.row_mode = RowMode::Viewing;
        self.create.open();
        true
      }
      "refresh" => {
        self.store.revalidate();
        true
      }
      _ => false,
    }
  }

  fn status(&self) -> Option<String> {
    if let Some(notice) = &self.notice {
      return Some(notice.clone());
    }
    if self.store.is_syncing() {
      return Some("syncing...".to_string());
    }
    None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    if self.create.is_open() || self.editing_id().is_some() {
      return vec![
        Shortcut::new("tab", "next field").with_priority(10),
        Shortcut::new("ctrl-s", "save").with_priority(20),
        Shortcut::new("esc", "cancel").with_priority(30),
      ];
    }

    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("/", "search").with_priority(20),
      Shortcut::new("a", "add").with_priority(30),
      Shortcut::new("space", "done").with_priority(40),
      Shortcut::new("e", "edit").with_priority(50),
      Shortcut::new("d", "delete").with_priority(60),
      Shortcut::new("enter", "open").with_priority(70),
      Shortcut::new("r", "refresh").with_priority(80),
      Shortcut::new("q", "quit").with_priority(90),
    ]
  }
}

/// Case-insensitive match on title, body or category. `needle` is lowercase.
fn matches_filter(todo: &TodoRecord, needle: &str) -> bool {
  todo.title.to_lowercase().contains(needle)
    || todo.body.to_lowercase().contains(needle)
    || todo
      .category
      .as_deref()
      .is_some_and(|c| c.to_lowercase().contains(needle))
}

/// Two-line row: glyph, title, category and deadline, then the body
fn todo_item(todo: &TodoRecord, editing: bool, width: usize) -> ListItem<'static> {
  let mut head = vec![
    Span::styled(
      done_glyph(todo.done),
      Style::default().fg(done_color(todo.done)),
    ),
    Span::raw(" "),
    Span::styled(
      truncate(&todo.title, width.saturating_sub(30).max(10)),
      Style::default().add_modifier(Modifier::BOLD),
    ),
  ];

  if let Some(category) = &todo.category {
    head.push(Span::raw("  "));
    head.push(Span::styled(
      format!("[{}]", category),
      Style::default().fg(Color::Yellow),
    ));
  }

  let deadline = format_deadline(todo.deadline);
  if !deadline.is_empty() {
    head.push(Span::raw("  "));
    head.push(Span::styled(
      format!("due {}", deadline),
      Style::default().fg(Color::Magenta),
    ));
  }

  if editing {
    head.push(Span::styled("  (editing)", Style::default().fg(Color::Cyan)));
  }

  let body = Line::from(vec![
    Span::raw("  "),
    Span::styled(
      truncate(&todo.body, width.max(10)),
      Style::default().fg(Color::Gray),
    ),
  ]);

  ListItem::new(vec![Line::from(head), body])
}
