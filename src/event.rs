use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal was resized; the next draw picks up the new size
  Resize,
  /// Periodic tick for draining finished network work
  Tick,
}

/// Turns terminal input and a tick timer into one event stream
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm's poll blocks, so the reader gets its own thread
    tokio::task::spawn_blocking(move || loop {
      let event = match event::poll(tick_rate) {
        Ok(true) => match event::read() {
          Ok(evt) => translate(evt),
          Err(e) => {
            warn!(error = %e, "failed to read terminal event");
            None
          }
        },
        Ok(false) => Some(Event::Tick),
        Err(e) => {
          warn!(error = %e, "failed to poll terminal");
          Some(Event::Tick)
        }
      };

      if let Some(event) = event {
        if tx.send(event).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Key presses and resizes; key releases and repeats from terminals that
/// report them are dropped
fn translate(event: CrosstermEvent) -> Option<Event> {
  match event {
    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
    CrosstermEvent::Resize(_, _) => Some(Event::Resize),
    _ => None,
  }
}
