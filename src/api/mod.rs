//! Access to the remote todo API.

pub mod client;
pub mod types;

use color_eyre::Result;
use std::future::Future;

pub use client::TodoClient;
pub use types::{NewTodo, TodoRecord};

/// Operations offered by the remote todo store.
///
/// `TodoClient` is the HTTP implementation. The trait exists so the cache and
/// views can be driven by an in-memory store in tests.
pub trait RemoteStore: Clone + Send + Sync + 'static {
  /// `GET /api/todos`
  fn list(&self) -> impl Future<Output = Result<Vec<TodoRecord>>> + Send;

  /// `GET /api/todos/{id}`
  fn get(&self, id: i64) -> impl Future<Output = Result<TodoRecord>> + Send;

  /// `POST /api/todos`, returns the record with its assigned id
  fn create(&self, todo: NewTodo) -> impl Future<Output = Result<TodoRecord>> + Send;

  /// `PUT /api/todos/{id}` with the full record
  fn update(&self, todo: TodoRecord) -> impl Future<Output = Result<()>> + Send;

  /// `PATCH /api/todos/{id}/done`. Servers may answer with the updated record
  /// or with an empty body.
  fn toggle_done(&self, id: i64) -> impl Future<Output = Result<Option<TodoRecord>>> + Send;

  /// `DELETE /api/todos/{id}`
  fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send;
}

pub fn todos_path() -> String {
  "api/todos".to_string()
}

pub fn todo_path(id: i64) -> String {
  format!("api/todos/{}", id)
}

pub fn done_path(id: i64) -> String {
  format!("api/todos/{}/done", id)
}
