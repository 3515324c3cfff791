use crate::api::types::{NewTodo, TodoRecord};
use crate::api::{done_path, todo_path, todos_path, RemoteStore};
use crate::config::ApiConfig;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// HTTP client for the todo REST API
#[derive(Clone)]
pub struct TodoClient {
  http: reqwest::Client,
  base: Url,
}

impl TodoClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid API url {}: {}", config.url, e))?;

    // Url::join replaces the last path segment unless the base ends with '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    info!(base = %base, "todo client ready");

    Ok(Self { http, base })
  }

  fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
    let url = self
      .base
      .join(path)
      .map_err(|e| eyre!("Failed to build url for {}: {}", path, e))?;
    debug!(%method, %url, "sending request");
    Ok(self.http.request(method, url))
  }

  /// Send a request and turn transport errors and non-2xx statuses into errors
  async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", what, e))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(eyre!("Failed to {}: {} {}", what, status, body.trim()));
    }

    Ok(response)
  }
}

impl RemoteStore for TodoClient {
  async fn list(&self) -> Result<Vec<TodoRecord>> {
    let request = self.request(Method::GET, &todos_path())?;
    let todos: Vec<TodoRecord> = self
      .send(request, "list todos")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse todo list: {}", e))?;

    debug!(count = todos.len(), "fetched todos");
    Ok(todos)
  }

  async fn get(&self, id: i64) -> Result<TodoRecord> {
    let request = self.request(Method::GET, &todo_path(id))?;
    self
      .send(request, &format!("get todo {}", id))
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse todo {}: {}", id, e))
  }

  async fn create(&self, todo: NewTodo) -> Result<TodoRecord> {
    let request = self.request(Method::POST, &todos_path())?.json(&todo);
    let created: TodoRecord = self
      .send(request, "create todo")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse created todo: {}", e))?;

    info!(id = created.id, "created todo");
    Ok(created)
  }

  async fn update(&self, todo: TodoRecord) -> Result<()> {
    let request = self.request(Method::PUT, &todo_path(todo.id))?.json(&todo);
    self
      .send(request, &format!("update todo {}", todo.id))
      .await?;

    info!(id = todo.id, "updated todo");
    Ok(())
  }

  async fn toggle_done(&self, id: i64) -> Result<Option<TodoRecord>> {
    let request = self.request(Method::PATCH, &done_path(id))?;
    let response = self
      .send(request, &format!("toggle todo {}", id))
      .await?;

    if response.status() == StatusCode::NO_CONTENT {
      return Ok(None);
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read toggle response for todo {}: {}", id, e))?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
      return Ok(None);
    }

    let updated = serde_json::from_slice(&bytes)
      .map_err(|e| eyre!("Failed to parse toggled todo {}: {}", id, e))?;
    Ok(Some(updated))
  }

  async fn delete(&self, id: i64) -> Result<()> {
    let request = self.request(Method::DELETE, &todo_path(id))?;
    self
      .send(request, &format!("delete todo {}", id))
      .await?;

    info!(id, "deleted todo");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::extract::{Path, State};
  use axum::http::StatusCode as AxumStatus;
  use axum::routing::{get, patch};
  use axum::{Json, Router};
  use std::sync::{Arc, Mutex};

  #[derive(Clone, Default)]
  struct Server {
    todos: Arc<Mutex<Vec<TodoRecord>>>,
    calls: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
  }

  impl Server {
    fn log(&self, call: String) {
      self.calls.lock().unwrap().push(call);
    }
  }

  async fn list(State(s): State<Server>) -> Json<Vec<TodoRecord>> {
    s.log("GET /api/todos".to_string());
    Json(s.todos.lock().unwrap().clone())
  }

  async fn create(
    State(s): State<Server>,
    Json(body): Json<serde_json::Value>,
  ) -> (AxumStatus, Json<TodoRecord>) {
    s.log("POST /api/todos".to_string());
    s.bodies.lock().unwrap().push(body.clone());
    let mut todos = s.todos.lock().unwrap();
    let created = TodoRecord {
      id: todos.len() as i64 + 1,
      title: body["title"].as_str().unwrap_or_default().to_string(),
      body: body["body"].as_str().unwrap_or_default().to_string(),
      category: body["category"].as_str().map(String::from),
      done: false,
      deadline: None,
    };
    todos.push(created.clone());
    (AxumStatus::CREATED, Json(created))
  }

  async fn get_one(
    State(s): State<Server>,
    Path(id): Path<i64>,
  ) -> Result<Json<TodoRecord>, (AxumStatus, &'static str)> {
    s.log(format!("GET /api/todos/{}", id));
    s.todos
      .lock()
      .unwrap()
      .iter()
      .find(|t| t.id == id)
      .cloned()
      .map(Json)
      .ok_or((AxumStatus::BAD_REQUEST, "no todo with that id"))
  }

  async fn update(
    State(s): State<Server>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
  ) -> Json<serde_json::Value> {
    s.log(format!("PUT /api/todos/{}", id));
    s.bodies.lock().unwrap().push(body.clone());
    Json(body)
  }

  async fn toggle(State(s): State<Server>, Path(id): Path<i64>) -> AxumStatus {
    s.log(format!("PATCH /api/todos/{}/done", id));
    if let Some(t) = s.todos.lock().unwrap().iter_mut().find(|t| t.id == id) {
      t.done = !t.done;
    }
    AxumStatus::NO_CONTENT
  }

  async fn remove(State(s): State<Server>, Path(id): Path<i64>) -> AxumStatus {
    s.log(format!("DELETE /api/todos/{}", id));
    s.todos.lock().unwrap().retain(|t| t.id != id);
    AxumStatus::NO_CONTENT
  }

  async fn spawn_server(seed: Vec<TodoRecord>) -> (TodoClient, Server) {
    let server = Server::default();
    *server.todos.lock().unwrap() = seed;

    let app = Router::new()
      .route("/api/todos", get(list).post(create))
      .route("/api/todos/:id", get(get_one).put(update).delete(remove))
      .route("/api/todos/:id/done", patch(toggle))
      .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    let client = TodoClient::new(&ApiConfig {
      url: format!("http://{}", addr),
      timeout_secs: 5,
    })
    .unwrap();

    (client, server)
  }

  fn seed() -> Vec<TodoRecord> {
    vec![
      TodoRecord {
        id: 1,
        title: "Todo1".to_string(),
        body: "Body1".to_string(),
        category: None,
        done: false,
        deadline: None,
      },
      TodoRecord {
        id: 2,
        title: "Todo2".to_string(),
        body: "Body2".to_string(),
        category: Some("Work".to_string()),
        done: true,
        deadline: None,
      },
    ]
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let client = TodoClient::new(&ApiConfig {
      url: "http://localhost:4000/prefix".to_string(),
      timeout_secs: 1,
    })
    .unwrap();
    assert_eq!(
      client.base.join(&done_path(3)).unwrap().as_str(),
      "http://localhost:4000/prefix/api/todos/3/done"
    );
  }

  #[test]
  fn test_invalid_url_is_rejected() {
    let result = TodoClient::new(&ApiConfig {
      url: "not a url".to_string(),
      timeout_secs: 1,
    });
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_list_and_get() {
    let (client, server) = spawn_server(seed()).await;

    let todos = client.list().await.unwrap();
    assert_eq!(todos, seed());

    let todo = client.get(2).await.unwrap();
    assert_eq!(todo.title, "Todo2");

    let missing = client.get(99).await;
    assert!(missing.is_err());

    assert_eq!(
      *server.calls.lock().unwrap(),
      vec!["GET /api/todos", "GET /api/todos/2", "GET /api/todos/99"]
    );
  }

  #[tokio::test]
  async fn test_create_posts_title_body_category() {
    let (client, server) = spawn_server(Vec::new()).await;

    let created = client
      .create(NewTodo {
        title: "New".to_string(),
        body: "Description".to_string(),
        category: Some("Home".to_string()),
      })
      .await
      .unwrap();

    assert_eq!(created.id, 1);
    assert_eq!(created.category.as_deref(), Some("Home"));
    assert_eq!(
      server.bodies.lock().unwrap()[0],
      serde_json::json!({"title": "New", "body": "Description", "category": "Home"})
    );
  }

  #[tokio::test]
  async fn test_update_sends_full_record() {
    let (client, server) = spawn_server(seed()).await;

    let mut todo = seed().remove(0);
    todo.title = "Renamed".to_string();
    client.update(todo.clone()).await.unwrap();

    let sent: TodoRecord = serde_json::from_value(server.bodies.lock().unwrap()[0].clone()).unwrap();
    assert_eq!(sent, todo);
    assert_eq!(*server.calls.lock().unwrap(), vec!["PUT /api/todos/1"]);
  }

  #[tokio::test]
  async fn test_toggle_done_accepts_no_content() {
    let (client, server) = spawn_server(seed()).await;

    let updated = client.toggle_done(1).await.unwrap();
    assert_eq!(updated, None);
    assert!(server.todos.lock().unwrap()[0].done);
    assert_eq!(
      *server.calls.lock().unwrap(),
      vec!["PATCH /api/todos/1/done"]
    );
  }

  #[tokio::test]
  async fn test_delete() {
    let (client, server) = spawn_server(seed()).await;

    client.delete(1).await.unwrap();
    assert_eq!(server.todos.lock().unwrap().len(), 1);
    assert_eq!(*server.calls.lock().unwrap(), vec!["DELETE /api/todos/1"]);
  }

  #[tokio::test]
  async fn test_unreachable_server_is_an_error() {
    let client = TodoClient::new(&ApiConfig {
      url: "http://127.0.0.1:1".to_string(),
      timeout_secs: 1,
    })
    .unwrap();
    assert!(client.list().await.is_err());
  }
}
