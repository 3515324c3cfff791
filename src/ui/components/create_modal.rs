use super::todo_form::{FormEvent, TodoForm};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::Clear;

/// "Create Todo" dialog. Holds a fresh form while open and nothing while closed.
#[derive(Debug, Clone, Default)]
pub struct CreateTodoModal {
  form: Option<TodoForm>,
}

impl CreateTodoModal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_open(&self) -> bool {
    self.form.is_some()
  }

  /// Open with empty fields
  pub fn open(&mut self) {
    self.form = Some(TodoForm::create());
  }

  pub fn close(&mut self) {
    self.form = None;
  }

  /// Route a key to the form. Submitting or cancelling closes the dialog.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    let Some(form) = self.form.as_mut() else {
      return KeyResult::NotHandled;
    };

    let result = form.handle_key(key);
    if let KeyResult::Event(_) = result {
      self.close();
    }
    result
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(form) = &self.form else {
      return;
    };

    let overlay_area = centered(area, 60, form.height());
    frame.render_widget(Clear, overlay_area);
    form.render(frame, overlay_area);
  }
}

/// Rect of `height` rows and `percent_x` of the width, centered in `area`
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
  let width = (area.width * percent_x / 100).max(40.min(area.width));
  let height = height.min(area.height);
  let x = area.x + (area.width - width) / 2;
  let y = area.y + (area.height - height) / 2;
  Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::buffer_text;
  use crossterm::event::{KeyCode, KeyModifiers};
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn render(modal: &CreateTodoModal) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal
      .draw(|frame| modal.render_overlay(frame, frame.area()))
      .unwrap();
    buffer_text(terminal.backend().buffer())
  }

  #[test]
  fn test_open_shows_heading_and_cancel_removes_it() {
    let mut modal = CreateTodoModal::new();
    assert!(!render(&modal).contains("Create Todo"));

    modal.open();
    let screen = render(&modal);
    assert!(screen.contains("Create Todo"));
    assert!(screen.contains("What is your todo?"));
    assert!(screen.contains("Cancel"));

    // Focus the Cancel button and press it
    modal.handle_key(key(KeyCode::BackTab));
    modal.handle_key(key(KeyCode::BackTab));
    assert_eq!(
      modal.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Cancelled)
    );
    assert!(!modal.is_open());
    assert!(!render(&modal).contains("Create Todo"));
  }

  #[test]
  fn test_reopen_starts_empty() {
    let mut modal = CreateTodoModal::new();
    modal.open();
    modal.handle_key(key(KeyCode::Char('x')));
    modal.handle_key(key(KeyCode::Esc));

    modal.open();
    let form = modal.form.as_ref().unwrap();
    assert_eq!(form.value(super::super::todo_form::FormField::Title), "");
  }

  #[test]
  fn test_closed_modal_ignores_keys() {
    let mut modal = CreateTodoModal::new();
    assert_eq!(modal.handle_key(key(KeyCode::Char('a'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_centered_fits_small_area() {
    let area = Rect::new(0, 0, 30, 5);
    let rect = centered(area, 60, 11);
    assert_eq!(rect, Rect::new(0, 0, 30, 5));
  }
}
