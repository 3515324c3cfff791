//! Async query abstraction with stale-while-revalidate semantics.
//!
//! A `Query<T>` owns the last successfully fetched value and a fetcher
//! closure. Refetching keeps the old value visible until the new one lands,
//! and the value can be overwritten locally for optimistic updates.
//!
//! # Example
//!
//! ```ignore
//! let api = client.clone();
//! let mut query = Query::new(move || {
//!     let api = api.clone();
//!     async move { api.list().await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! match query.data() {
//!     None => render_placeholder(),
//!     Some(data) => render_data(data),
//! }
//! ```

use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is fetching and has no data yet
  Loading,
  /// Query has data
  Success(T),
  /// Query failed before any data arrived
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }
}

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - The last known data, kept while a refetch is in flight
/// - The last fetch error
/// - Async result handling via channels
pub struct Query<T> {
  data: Option<T>,
  error: Option<String>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<(u64, Result<T, String>)>>,
  /// Bumped by every local write; fetches started before it are stale
  generation: u64,
}

impl<T: Clone + Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      data: None,
      error: None,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      generation: 0,
    }
  }

  /// Snapshot of the query state. Data wins over errors and in-flight fetches.
  pub fn state(&self) -> QueryState<T> {
    match (&self.data, &self.error) {
      (Some(data), _) => QueryState::Success(data.clone()),
      (None, _) if self.is_fetching() => QueryState::Loading,
      (None, Some(e)) => QueryState::Error(e.clone()),
      (None, None) => QueryState::Idle,
    }
  }

  /// The last known data, if any fetch ever succeeded or data was set
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  /// True while nothing has been loaded yet
  pub fn is_loading(&self) -> bool {
    self.data.is_none() && self.is_fetching()
  }

  /// True while a fetch is in flight, with or without data
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// Error from the most recent fetch, cleared by the next success
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Replace the data locally without touching the network.
  ///
  /// A fetch already in flight was started before this write, so its
  /// result is dropped when it lands.
  pub fn set_data(&mut self, data: T) {
    self.data = Some(data);
    self.generation += 1;
  }

  /// Start fetching data if not already fetching.
  pub fn fetch(&mut self) {
    if self.is_fetching() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch. A fetch already in flight is superseded and its
  /// result is dropped.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok((generation, _)) if generation != self.generation => {
        self.receiver = None;
        true
      }
      Ok((_, Ok(data))) => {
        self.data = Some(data);
        self.error = None;
        self.receiver = None;
        true
      }
      Ok((_, Err(error))) => {
        self.error = Some(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.error = Some("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    let generation = self.generation;
    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Receiver is gone when a refetch superseded this fetch
      let _ = tx.send((generation, result));
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("data", &self.data)
      .field("error", &self.error)
      .field("fetching", &self.receiver.is_some())
      .finish_non_exhaustive()
  }
}
