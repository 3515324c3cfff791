//! Wire types shared by the HTTP client and the rest of the app.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single todo item as stored by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
  pub id: i64,
  pub title: String,
  pub body: String,
  pub category: Option<String>,
  #[serde(default)]
  pub done: bool,
  pub deadline: Option<DateTime<Utc>>,
}

impl TodoRecord {
  /// Deadline as a calendar date, if set
  pub fn deadline_date(&self) -> Option<NaiveDate> {
    self.deadline.map(|d| d.date_naive())
  }

  /// Category text, empty when unset
  pub fn category_label(&self) -> &str {
    self.category.as_deref().unwrap_or("")
  }
}

/// Payload for creating a todo. The id is assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
  pub title: String,
  pub body: String,
  pub category: Option<String>,
}

/// Map a free-text field to `None` when it is blank
pub fn non_blank(value: &str) -> Option<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_string())
  }
}
