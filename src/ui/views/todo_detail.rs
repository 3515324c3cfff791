use crate::api::{RemoteStore, TodoRecord};
use crate::query::{Query, QueryState};
use crate::ui::renderfns::{done_color, done_glyph, format_deadline};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// View for a single todo, fetched fresh from the server
pub struct TodoDetailView {
  id: i64,
  title: String,
  query: Query<TodoRecord>,
}

impl TodoDetailView {
  pub fn new<R: RemoteStore>(id: i64, title: String, remote: R) -> Self {
    let mut query = Query::new(move || {
      let remote = remote.clone();
      async move { remote.get(id).await.map_err(|e| e.to_string()) }
    });

    // Start fetching immediately
    query.fetch();

    Self { id, title, query }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => format!(" #{} (loading...) ", self.id),
      QueryState::Error(e) => format!(" #{} (error: {}) ", self.id, e),
      _ => format!(" #{} ", self.id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let todo = match self.query.data() {
      Some(todo) => todo,
      None => {
        let paragraph = match self.query.error() {
          Some(error) => Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
            .style(Style::default().fg(Color::Red)),
          None => Paragraph::new("Loading todo...").style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(paragraph, inner);
        return;
      }
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(4), // Title, status, category, deadline
        Constraint::Length(1), // Separator
        Constraint::Min(1),    // Body
      ])
      .split(inner);

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let status = if todo.done { "Done" } else { "Open" };
    let deadline = format_deadline(todo.deadline);

    let header = vec![
      Line::from(vec![
        label("Title:    "),
        Span::styled(&todo.title, Style::default().add_modifier(Modifier::BOLD)),
      ]),
      Line::from(vec![
        label("Status:   "),
        Span::styled(
          format!("{} {}", done_glyph(todo.done), status),
          Style::default().fg(done_color(todo.done)),
        ),
      ]),
      Line::from(vec![
        label("Category: "),
        Span::styled(
          todo.category.as_deref().unwrap_or("None"),
          Style::default().fg(Color::Yellow),
        ),
      ]),
      Line::from(vec![
        label("Deadline: "),
        Span::raw(if deadline.is_empty() { "None".to_string() } else { deadline }),
      ]),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let sep = Paragraph::new("─".repeat(chunks[1].width as usize))
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, chunks[1]);

    let body = Paragraph::new(todo.body.as_str()).wrap(Wrap { trim: true });
    frame.render_widget(body, chunks[2]);
  }
}

impl View for TodoDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self
      .query
      .data()
      .map(|t| t.title.clone())
      .unwrap_or_else(|| self.title.clone())
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn run_command(&mut self, command: &str) -> bool {
    if command == "refresh" {
      self.query.refetch();
      return true;
    }
    false
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("r", "refresh"), Shortcut::new("q", "back")]
  }
}
