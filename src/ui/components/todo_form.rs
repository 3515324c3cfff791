use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::types::non_blank;
use crate::api::{NewTodo, TodoRecord};
use chrono::{NaiveDate, NaiveTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

pub const TITLE_PLACEHOLDER: &str = "What is your todo?";
pub const CATEGORY_PLACEHOLDER: &str = "Enter category";
pub const BODY_PLACEHOLDER: &str = "Tell me more...";
pub const DEADLINE_PLACEHOLDER: &str = "YYYY-MM-DD";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  Title,
  Category,
  Body,
  Deadline,
}

#[derive(Debug, Clone)]
struct Field {
  kind: FormField,
  label: &'static str,
  placeholder: &'static str,
  required: bool,
  input: TextInput,
}

impl Field {
  fn new(kind: FormField, label: &'static str, placeholder: &'static str, value: &str) -> Self {
    Self {
      kind,
      label,
      placeholder,
      required: false,
      input: TextInput::with_value(value),
    }
  }

  fn required(mut self) -> Self {
    self.required = true;
    self
  }
}

/// Values collected by a submitted form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
  pub title: String,
  pub body: String,
  pub category: Option<String>,
  pub deadline: Option<NaiveDate>,
}

impl FormValues {
  pub fn into_new_todo(self) -> NewTodo {
    NewTodo {
      title: self.title,
      body: self.body,
      category: self.category,
    }
  }

  /// The edited record: `todo` with the form's fields laid over it.
  ///
  /// An unchanged deadline date keeps its time of day; a new date is
  /// stored as midnight UTC.
  pub fn apply_to(self, todo: &TodoRecord) -> TodoRecord {
    let deadline = match self.deadline {
      Some(date) if Some(date) == todo.deadline_date() => todo.deadline,
      Some(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
      None => None,
    };
    TodoRecord {
      title: self.title,
      body: self.body,
      category: self.category,
      deadline,
      ..todo.clone()
    }
  }
}

/// Events emitted by the form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submitted(FormValues),
  Cancelled,
}

/// Focus targets after the fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
  Cancel,
  Save,
}

/// Form for creating or editing a todo.
///
/// Focus cycles through the fields and then the Cancel and Save buttons.
/// Required fields block submission while empty, like native `required`
/// inputs do in a browser.
#[derive(Debug, Clone)]
pub struct TodoForm {
  heading: &'static str,
  fields: Vec<Field>,
  focus: usize,
  error: Option<String>,
}

impl TodoForm {
  /// Empty form for a new todo
  pub fn create() -> Self {
    Self {
      heading: "Create Todo",
      fields: vec![
        Field::new(FormField::Title, "Title", TITLE_PLACEHOLDER, "").required(),
        Field::new(FormField::Category, "Category", CATEGORY_PLACEHOLDER, ""),
        Field::new(FormField::Body, "Body", BODY_PLACEHOLDER, "").required(),
      ],
      focus: 0,
      error: None,
    }
  }

  /// Form pre-filled from an existing todo
  pub fn edit(todo: &TodoRecord) -> Self {
    let deadline = todo
      .deadline_date()
      .map(|d| d.format(DATE_FORMAT).to_string())
      .unwrap_or_default();

    Self {
      heading: "Edit Todo",
      fields: vec![
        Field::new(FormField::Title, "Title", TITLE_PLACEHOLDER, &todo.title).required(),
        Field::new(FormField::Body, "Body", BODY_PLACEHOLDER, &todo.body),
        Field::new(
          FormField::Category,
          "Category",
          CATEGORY_PLACEHOLDER,
          todo.category_label(),
        ),
        Field::new(FormField::Deadline, "Deadline", DEADLINE_PLACEHOLDER, &deadline),
      ],
      focus: 0,
      error: None,
    }
  }

  pub fn heading(&self) -> &str {
    self.heading
  }

  /// Current text of a field, empty if the form has no such field
  pub fn value(&self, kind: FormField) -> &str {
    self
      .fields
      .iter()
      .find(|f| f.kind == kind)
      .map(|f| f.input.value())
      .unwrap_or("")
  }

  /// Field whose input has focus, `None` while a button is focused
  pub fn focused_field(&self) -> Option<FormField> {
    self.fields.get(self.focus).map(|f| f.kind)
  }

  /// Move focus to a field
  pub fn focus_field(&mut self, kind: FormField) {
    if let Some(idx) = self.fields.iter().position(|f| f.kind == kind) {
      self.focus = idx;
    }
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  fn focus_count(&self) -> usize {
    self.fields.len() + 2
  }

  fn focused_button(&self) -> Option<Button> {
    match self.focus.checked_sub(self.fields.len()) {
      Some(0) => Some(Button::Cancel),
      Some(1) => Some(Button::Save),
      _ => None,
    }
  }

  fn focus_next(&mut self) {
    self.focus = (self.focus + 1) % self.focus_count();
  }

  fn focus_prev(&mut self) {
    self.focus = (self.focus + self.focus_count() - 1) % self.focus_count();
  }

  /// Validate and collect the values. On failure the offending field is
  /// focused and the error is kept for rendering.
  fn submit(&mut self) -> KeyResult<FormEvent> {
    match self.collect() {
      Ok(values) => {
        self.error = None;
        KeyResult::Event(FormEvent::Submitted(values))
      }
      Err((idx, message)) => {
        self.focus = idx;
        self.error = Some(message);
        KeyResult::Handled
      }
    }
  }

  fn collect(&self) -> Result<FormValues, (usize, String)> {
    if let Some((idx, field)) = self
      .fields
      .iter()
      .enumerate()
      .find(|(_, f)| f.required && f.input.value().trim().is_empty())
    {
      return Err((idx, format!("{} is required", field.label)));
    }

    let deadline = match self.fields.iter().position(|f| f.kind == FormField::Deadline) {
      Some(idx) => match non_blank(self.fields[idx].input.value()) {
        Some(text) => Some(
          NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map_err(|_| (idx, format!("Deadline must be {}", DEADLINE_PLACEHOLDER)))?,
        ),
        None => None,
      },
      None => None,
    };

    Ok(FormValues {
      title: self.value(FormField::Title).trim().to_string(),
      body: self.value(FormField::Body).trim().to_string(),
      category: non_blank(self.value(FormField::Category)),
      deadline,
    })
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => return self.submit(),
      KeyCode::Tab | KeyCode::Down => {
        self.focus_next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus_prev();
        return KeyResult::Handled;
      }
      _ => {}
    }

    if let Some(button) = self.focused_button() {
      return match (key.code, button) {
        (KeyCode::Enter, Button::Save) => self.submit(),
        (KeyCode::Enter, Button::Cancel) => KeyResult::Event(FormEvent::Cancelled),
        (KeyCode::Left | KeyCode::Right, _) => {
          self.focus = if button == Button::Save {
            self.fields.len()
          } else {
            self.fields.len() + 1
          };
          KeyResult::Handled
        }
        _ => KeyResult::Handled,
      };
    }

    let field = &mut self.fields[self.focus];
    match field.input.handle_key(key) {
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      InputResult::Submitted(_) => {
        // Enter moves on, like Tab, until the last field submits
        if self.focus + 1 == self.fields.len() {
          self.submit()
        } else {
          self.focus_next();
          KeyResult::Handled
        }
      }
      InputResult::Cancelled => KeyResult::Event(FormEvent::Cancelled),
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Rows needed to render the form including its border
  pub fn height(&self) -> u16 {
    // label + input per field, blank, error, buttons, border
    self.fields.len() as u16 * 2 + 1 + 1 + 1 + 2
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(Span::styled(
        format!(" {} ", self.heading),
        Style::default().add_modifier(Modifier::BOLD),
      ))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();

    for (idx, field) in self.fields.iter().enumerate() {
      let focused = idx == self.focus;
      let mut label = field.label.to_string();
      if field.required {
        label.push_str(" *");
      }
      lines.push(Line::styled(label, Style::default().fg(Color::Gray)));
      lines.push(input_line(field, focused));
    }

    lines.push(Line::raw(""));
    lines.push(match &self.error {
      Some(e) => Line::styled(e.clone(), Style::default().fg(Color::Red)),
      None => Line::raw(""),
    });

    let button_style = |b: Button| {
      if self.focused_button() == Some(b) {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      }
    };
    lines.push(Line::from(vec![
      Span::styled("[ Cancel ]", button_style(Button::Cancel)),
      Span::raw("  "),
      Span::styled("[ Save ]", button_style(Button::Save)),
    ]));

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

/// Input value with a block cursor, or the dimmed placeholder when empty
fn input_line(field: &Field, focused: bool) -> Line<'static> {
  let value = field.input.value();
  let marker = if focused { "> " } else { "  " };

  if value.is_empty() && !focused {
    return Line::from(vec![
      Span::raw(marker),
      Span::styled(field.placeholder, Style::default().fg(Color::DarkGray)),
    ]);
  }

  if !focused {
    return Line::from(vec![Span::raw(marker), Span::raw(value.to_string())]);
  }

  let cursor = field.input.cursor_position();
  let before: String = value.chars().take(cursor).collect();
  let at: String = value.chars().nth(cursor).map(String::from).unwrap_or(" ".into());
  let after: String = value.chars().skip(cursor + 1).collect();

  let mut spans = vec![
    Span::styled(marker, Style::default().fg(Color::Yellow)),
    Span::raw(before),
    Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
    Span::raw(after),
  ];
  if value.is_empty() {
    spans.push(Span::styled(field.placeholder, Style::default().fg(Color::DarkGray)));
  }
  Line::from(spans)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fake::todo;
  use chrono::{TimeZone, Utc};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut TodoForm, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_typed_values_bind_to_their_fields() {
    let mut form = TodoForm::create();
    assert_eq!(form.focused_field(), Some(FormField::Title));
    type_str(&mut form, "New Todo Title");

    form.focus_field(FormField::Body);
    type_str(&mut form, "New Todo Description");

    form.focus_field(FormField::Category);
    type_str(&mut form, "New Todo Category");

    assert_eq!(form.value(FormField::Title), "New Todo Title");
    assert_eq!(form.value(FormField::Body), "New Todo Description");
    assert_eq!(form.value(FormField::Category), "New Todo Category");
  }

  #[test]
  fn test_tab_order_follows_layout() {
    let mut form = TodoForm::create();
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focused_field(), Some(FormField::Category));
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focused_field(), Some(FormField::Body));
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.focused_field(), None);
    form.handle_key(key(KeyCode::BackTab));
    assert_eq!(form.focused_field(), Some(FormField::Body));
  }

  #[test]
  fn test_required_fields_block_submit() {
    let mut form = TodoForm::create();
    type_str(&mut form, "Only a title");

    let result = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert_eq!(result, KeyResult::Handled);
    assert_eq!(form.error(), Some("Body is required"));
    assert_eq!(form.focused_field(), Some(FormField::Body));
  }

  #[test]
  fn test_enter_walks_fields_then_submits() {
    let mut form = TodoForm::create();
    type_str(&mut form, "playwrighttest");
    form.handle_key(key(KeyCode::Enter));
    type_str(&mut form, "testcategory");
    form.handle_key(key(KeyCode::Enter));
    type_str(&mut form, "test");

    let result = form.handle_key(key(KeyCode::Enter));
    assert_eq!(
      result,
      KeyResult::Event(FormEvent::Submitted(FormValues {
        title: "playwrighttest".to_string(),
        body: "test".to_string(),
        category: Some("testcategory".to_string()),
        deadline: None,
      }))
    );
  }

  #[test]
  fn test_cancel_button() {
    let mut form = TodoForm::create();
    form.handle_key(key(KeyCode::BackTab));
    form.handle_key(key(KeyCode::BackTab));
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Event(FormEvent::Cancelled));
  }

  #[test]
  fn test_save_button_submits() {
    let mut form = TodoForm::create();
    type_str(&mut form, "t");
    form.focus_field(FormField::Body);
    type_str(&mut form, "b");
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Right));
    assert!(matches!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted(_))
    ));
  }

  #[test]
  fn test_edit_form_prefills_and_applies() {
    let mut record = todo(4, "Old", "Body", Some("Work"), true);
    record.deadline = Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap());

    let mut form = TodoForm::edit(&record);
    assert_eq!(form.heading(), "Edit Todo");
    assert_eq!(form.value(FormField::Category), "Work");
    assert_eq!(form.value(FormField::Deadline), "2024-01-02");

    form.focus_field(FormField::Deadline);
    for _ in 0..2 {
      form.handle_key(key(KeyCode::Backspace));
    }
    type_str(&mut form, "15");

    let values = match form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)) {
      KeyResult::Event(FormEvent::Submitted(v)) => v,
      other => panic!("unexpected {:?}", other),
    };
    let edited = values.apply_to(&record);
    assert_eq!(edited.id, 4);
    assert!(edited.done);
    assert_eq!(
      edited.deadline,
      Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn test_title_edit_keeps_deadline_time() {
    let mut record = todo(5, "Call", "Dentist", None, false);
    record.deadline = Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap());

    let mut form = TodoForm::edit(&record);
    form.focus_field(FormField::Title);
    type_str(&mut form, " back");

    let values = match form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)) {
      KeyResult::Event(FormEvent::Submitted(v)) => v,
      other => panic!("unexpected {:?}", other),
    };
    let edited = values.apply_to(&record);
    assert_eq!(edited.title, "Call back");
    assert_eq!(edited.deadline, record.deadline);
  }

  #[test]
  fn test_bad_deadline_is_rejected() {
    let record = todo(1, "a", "b", None, false);
    let mut form = TodoForm::edit(&record);
    form.focus_field(FormField::Deadline);
    type_str(&mut form, "tomorrow");

    let result = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert_eq!(result, KeyResult::Handled);
    assert_eq!(form.error(), Some("Deadline must be YYYY-MM-DD"));
  }

  #[test]
  fn test_blank_category_becomes_none() {
    let values = FormValues {
      title: "t".to_string(),
      body: "b".to_string(),
      category: non_blank("   "),
      deadline: None,
    };
    assert_eq!(values.into_new_todo().category, None);
  }
}
