//! Client-side cache of the todo list.
//!
//! `TodoStore` is the only owner of the cached list. Views read it through
//! `todos()` and change it only through the operations below. Network work
//! runs on spawned tasks; results are applied when the UI calls `poll()`.

use crate::api::{NewTodo, RemoteStore, TodoRecord};
use crate::query::Query;
use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Completion of a mutation issued against the remote store
#[derive(Debug)]
enum Outcome {
  Created(Result<TodoRecord>),
  Updated(i64, Result<()>),
  Toggled(i64, Result<Option<TodoRecord>>),
  Deleted(i64, Result<()>),
}

pub struct TodoStore<R: RemoteStore> {
  remote: R,
  query: Query<Vec<TodoRecord>>,
  outcome_tx: mpsc::UnboundedSender<Outcome>,
  outcome_rx: mpsc::UnboundedReceiver<Outcome>,
  /// Mutations spawned but not yet applied
  in_flight: usize,
  mutation_error: Option<String>,
}

impl<R: RemoteStore> TodoStore<R> {
  pub fn new(remote: R) -> Self {
    let fetch_remote = remote.clone();
    let query = Query::new(move || {
      let remote = fetch_remote.clone();
      async move { remote.list().await.map_err(|e| e.to_string()) }
    });
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

    Self {
      remote,
      query,
      outcome_tx,
      outcome_rx,
      in_flight: 0,
      mutation_error: None,
    }
  }

  /// Handle to the remote store, for views that fetch on their own
  pub fn remote(&self) -> &R {
    &self.remote
  }

  /// Cached list, `None` until the first successful load
  pub fn todos(&self) -> Option<&[TodoRecord]> {
    self.query.data().map(|v| v.as_slice())
  }

  pub fn get(&self, id: i64) -> Option<&TodoRecord> {
    self.todos()?.iter().find(|t| t.id == id)
  }

  /// True until the first list arrives
  pub fn is_loading(&self) -> bool {
    self.query.is_loading()
  }

  /// True while any network work is outstanding
  pub fn is_syncing(&self) -> bool {
    self.query.is_fetching() || self.in_flight > 0
  }

  /// Most recent failure: a failed mutation, else a failed list fetch
  pub fn last_error(&self) -> Option<&str> {
    self.mutation_error.as_deref().or_else(|| self.query.error())
  }

  /// Fetch the full list unless a fetch is already running
  pub fn load(&mut self) {
    self.query.fetch();
  }

  /// Replace the cached list immediately, without waiting on the network
  pub fn apply_optimistic(&mut self, todos: Vec<TodoRecord>) {
    debug!(count = todos.len(), "optimistic list update");
    self.query.set_data(todos);
  }

  /// Re-fetch the list and replace the cache with the server's answer
  pub fn revalidate(&mut self) {
    self.mutation_error = None;
    self.query.refetch();
  }

  /// Flip `done` locally, send the toggle, then revalidate once it completes
  pub fn toggle_done(&mut self, id: i64) -> Result<()> {
    let mut todos = self
      .todos()
      .ok_or_else(|| eyre!("Todos are not loaded yet"))?
      .to_vec();

    let todo = todos
      .iter_mut()
      .find(|t| t.id == id)
      .ok_or_else(|| eyre!("No todo with id {}", id))?;
    todo.done = !todo.done;

    self.apply_optimistic(todos);

    let remote = self.remote.clone();
    self.spawn(async move { Outcome::Toggled(id, remote.toggle_done(id).await) });
    Ok(())
  }

  /// Send the delete and drop the record locally without waiting for it
  pub fn delete(&mut self, id: i64) {
    let remote = self.remote.clone();
    self.spawn(async move { Outcome::Deleted(id, remote.delete(id).await) });

    if let Some(todos) = self.todos() {
      let remaining = todos.iter().filter(|t| t.id != id).cloned().collect();
      self.apply_optimistic(remaining);
    }
  }

  /// Send a new todo; the created record is appended when it comes back
  pub fn create(&mut self, todo: NewTodo) {
    let remote = self.remote.clone();
    self.spawn(async move { Outcome::Created(remote.create(todo).await) });
  }

  /// Replace a record remotely, then revalidate
  pub fn update(&mut self, todo: TodoRecord) {
    let remote = self.remote.clone();
    let id = todo.id;
    self.spawn(async move { Outcome::Updated(id, remote.update(todo).await) });
  }

  /// Apply finished list fetches and mutations.
  ///
  /// Returns `true` if anything visible changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = self.query.poll();

    while let Ok(outcome) = self.outcome_rx.try_recv() {
      self.in_flight = self.in_flight.saturating_sub(1);
      self.apply_outcome(outcome);
      changed = true;
    }

    changed
  }

  fn spawn<F>(&mut self, future: F)
  where
    F: Future<Output = Outcome> + Send + 'static,
  {
    self.mutation_error = None;
    self.in_flight += 1;

    let tx = self.outcome_tx.clone();
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }

  fn apply_outcome(&mut self, outcome: Outcome) {
    match outcome {
      Outcome::Created(Ok(created)) => {
        debug!(id = created.id, "appending created todo");
        match self.todos() {
          Some(todos) => {
            let mut todos = todos.to_vec();
            todos.push(created);
            self.apply_optimistic(todos);
          }
          // Nothing loaded yet, so there is no list to append to
          None => self.query.refetch(),
        }
      }
      Outcome::Created(Err(e)) => self.record_failure("create todo", e),

      Outcome::Updated(id, result) => {
        if let Err(e) = result {
          self.record_failure(&format!("update todo {}", id), e);
        }
        self.query.refetch();
      }

      Outcome::Toggled(id, result) => {
        if let Err(e) = result {
          self.record_failure(&format!("toggle todo {}", id), e);
        }
        self.query.refetch();
      }

      // No rollback: the record stays hidden even if the server kept it
      Outcome::Deleted(_, Ok(())) => {}
      Outcome::Deleted(id, Err(e)) => self.record_failure(&format!("delete todo {}", id), e),
    }
  }

  fn record_failure(&mut self, what: &str, error: color_eyre::Report) {
    warn!(error = %error, "{} failed", what);
    self.mutation_error = Some(error.to_string());
  }
}

#[cfg(test)]
pub mod tests {
  use super::*;
  use crate::api::fake::{todo, FakeRemote};
  use std::time::Duration;

  pub fn two_todos() -> Vec<TodoRecord> {
    vec![
      todo(1, "Test Todo 1", "Test Body 1", Some("Work"), false),
      todo(2, "Test Todo 2", "Test Body 2", Some("Personal"), true),
    ]
  }

  /// Poll until no network work is outstanding
  pub async fn settle<R: RemoteStore>(store: &mut TodoStore<R>) {
    for _ in 0..200 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      store.poll();
      if !store.is_syncing() {
        return;
      }
    }
    panic!("store did not settle");
  }

  async fn loaded_store() -> (TodoStore<FakeRemote>, FakeRemote) {
    let remote = FakeRemote::with_todos(two_todos());
    let mut store = TodoStore::new(remote.clone());
    store.load();
    settle(&mut store).await;
    (store, remote)
  }

  #[tokio::test]
  async fn test_no_data_until_first_load() {
    let remote = FakeRemote::with_todos(Vec::new());
    let mut store = TodoStore::new(remote);

    assert!(store.todos().is_none());
    store.load();
    assert!(store.is_loading());
    assert!(store.todos().is_none());

    settle(&mut store).await;
    assert_eq!(store.todos(), Some(&[][..]));
    assert!(!store.is_loading());
  }

  #[tokio::test]
  async fn test_load_keeps_server_order() {
    let (store, _) = loaded_store().await;
    let ids: Vec<i64> = store.todos().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2]);
  }

  #[tokio::test]
  async fn test_toggle_is_optimistic_then_revalidated() {
    let (mut store, remote) = loaded_store().await;

    store.toggle_done(1).unwrap();
    assert!(store.get(1).unwrap().done);

    settle(&mut store).await;
    assert!(store.get(1).unwrap().done);
    assert_eq!(remote.count_calls("PATCH /api/todos/1/done"), 1);
    assert_eq!(remote.count_calls("GET /api/todos"), 2);
  }

  #[tokio::test]
  async fn test_toggle_unknown_id_sends_nothing() {
    let (mut store, remote) = loaded_store().await;

    assert!(store.toggle_done(42).is_err());
    assert_eq!(remote.calls(), vec!["GET /api/todos"]);
  }

  #[tokio::test]
  async fn test_toggle_before_load_is_rejected() {
    let remote = FakeRemote::with_todos(two_todos());
    let mut store = TodoStore::new(remote.clone());
    assert!(store.toggle_done(1).is_err());
    assert!(remote.calls().is_empty());
  }

  #[tokio::test]
  async fn test_failed_toggle_is_corrected_by_revalidation() {
    let (mut store, remote) = loaded_store().await;
    remote.fail_mutations();

    store.toggle_done(1).unwrap();
    assert!(store.get(1).unwrap().done);

    settle(&mut store).await;
    assert!(!store.get(1).unwrap().done);
    assert!(store.last_error().unwrap().contains("PATCH /api/todos/1/done"));
  }

  #[tokio::test]
  async fn test_overlapping_toggles_end_at_server_state() {
    let (mut store, remote) = loaded_store().await;

    store.toggle_done(1).unwrap();
    store.toggle_done(1).unwrap();
    assert!(!store.get(1).unwrap().done);

    settle(&mut store).await;
    assert_eq!(remote.count_calls("PATCH /api/todos/1/done"), 2);
    assert_eq!(store.get(1).unwrap().done, remote.todos()[0].done);
  }

  #[tokio::test]
  async fn test_delete_removes_immediately() {
    let (mut store, remote) = loaded_store().await;

    store.delete(1);
    assert!(store.get(1).is_none());
    assert_eq!(store.todos().unwrap().len(), 1);

    settle(&mut store).await;
    assert!(store.get(1).is_none());
    assert_eq!(remote.count_calls("DELETE /api/todos/1"), 1);
  }

  #[tokio::test]
  async fn test_failed_delete_is_not_rolled_back() {
    let (mut store, remote) = loaded_store().await;
    remote.fail_mutations();

    store.delete(1);
    settle(&mut store).await;

    assert!(store.get(1).is_none());
    assert_eq!(remote.todos().len(), 2);
    assert!(store.last_error().is_some());
  }

  #[tokio::test]
  async fn test_delete_during_revalidate_stays_deleted() {
    let (mut store, remote) = loaded_store().await;

    // The list fetch is answered before the delete reaches the server
    store.revalidate();
    store.delete(2);
    settle(&mut store).await;

    assert!(store.get(2).is_none());
    assert_eq!(store.todos().unwrap().len(), 1);
    assert!(remote.todos().iter().all(|t| t.id != 2));
    assert_eq!(remote.count_calls("GET /api/todos"), 2);
  }

  #[tokio::test]
  async fn test_create_appends_without_refetch() {
    let (mut store, remote) = loaded_store().await;

    store.create(NewTodo {
      title: "playwrighttest".to_string(),
      body: "test".to_string(),
      category: None,
    });
    settle(&mut store).await;

    let todos = store.todos().unwrap();
    assert_eq!(todos.len(), 3);
    assert_eq!(todos[2].id, 3);
    assert_eq!(todos[2].title, "playwrighttest");
    assert_eq!(remote.count_calls("POST /api/todos"), 1);
    assert_eq!(remote.count_calls("GET /api/todos"), 1);
  }

  #[tokio::test]
  async fn test_failed_create_leaves_list() {
    let (mut store, remote) = loaded_store().await;
    remote.fail_mutations();

    store.create(NewTodo {
      title: "x".to_string(),
      body: "y".to_string(),
      category: None,
    });
    settle(&mut store).await;

    assert_eq!(store.todos().unwrap().len(), 2);
    assert!(store.last_error().unwrap().contains("POST /api/todos"));
  }

  #[tokio::test]
  async fn test_update_revalidates() {
    let (mut store, remote) = loaded_store().await;

    let mut edited = store.get(2).unwrap().clone();
    edited.title = "Renamed".to_string();
    store.update(edited);

    // Not patched locally
    assert_eq!(store.get(2).unwrap().title, "Test Todo 2");

    settle(&mut store).await;
    assert_eq!(store.get(2).unwrap().title, "Renamed");
    assert_eq!(remote.count_calls("PUT /api/todos/2"), 1);
    assert_eq!(remote.count_calls("GET /api/todos"), 2);
  }

  #[tokio::test]
  async fn test_revalidate_clears_mutation_error() {
    let (mut store, remote) = loaded_store().await;
    remote.fail_mutations();
    store.delete(2);
    settle(&mut store).await;
    assert!(store.last_error().is_some());

    store.revalidate();
    settle(&mut store).await;
    assert!(store.last_error().is_none());
    assert!(store.get(2).is_some());
  }
}
