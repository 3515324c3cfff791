pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function: header, current view, footer, then the command palette
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.title(), &app.shortcuts());

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  let status = app.status();
  renderfns::draw_footer(frame, chunks[2], &app.breadcrumb(), status.as_deref());

  app.command_input().render_overlay(frame, chunks[1]);
}

/// Keep the selection inside a list of `len` rows, selecting the first row
/// when nothing is selected
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(idx) if idx >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Flatten a rendered buffer into lines of text
#[cfg(test)]
pub fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
  let area = buffer.area;
  let mut text = String::new();
  for y in area.top()..area.bottom() {
    for x in area.left()..area.right() {
      text.push_str(buffer[(x, y)].symbol());
    }
    text.push('\n');
  }
  text
}
