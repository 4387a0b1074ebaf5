//! # Event Bus System
//!
//! Delivers narration notifications to the UI layer using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The queue manager reports everything observable about a session through
//! [`NarrationEvent`]s: chunk start/end, completion, errors, and the
//! "waiting for user interaction" condition raised when the platform blocks
//! autoplay. The UI subscribes and renders; it never inspects chunk state.
//!
//! ```text
//! ┌──────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ QueueManager ├──────────>│ EventBus  ├────────────>│ UI / CLI   │
//! └──────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, NarrationEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::default();
//! let mut stream = bus.subscribe();
//!
//! bus.emit(NarrationEvent::ChunkEnded { index: 0 });
//! assert_eq!(stream.recv().await.unwrap(), NarrationEvent::ChunkEnded { index: 0 });
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Non-fatal.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, TryRecvError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Notifications emitted by a narration session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum NarrationEvent {
    /// Chunk `index` became audible.
    ChunkStarted { index: usize, text: String },
    /// Chunk `index` played to its natural end.
    ChunkEnded { index: usize },
    /// The cursor ran past the last chunk.
    AllComplete,
    /// A chunk could not be fetched or played and was skipped.
    Error {
        index: Option<usize>,
        message: String,
    },
    /// The platform blocked playback pending a user gesture. The session is
    /// paused on `index`; `resume()` continues from there.
    WaitingForInteraction { index: usize },
    /// The session was stopped explicitly.
    Stopped,
}

impl NarrationEvent {
    /// Returns `true` for hard errors that the UI should surface as a message.
    pub fn is_error(&self) -> bool {
        matches!(self, NarrationEvent::Error { .. })
    }

    /// Returns `true` for events after which the session produces no more
    /// audio without a new control call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NarrationEvent::AllComplete | NarrationEvent::Stopped
        )
    }

    /// Chunk index the event refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            NarrationEvent::ChunkStarted { index, .. }
            | NarrationEvent::ChunkEnded { index }
            | NarrationEvent::WaitingForInteraction { index } => Some(*index),
            NarrationEvent::Error { index, .. } => *index,
            NarrationEvent::AllComplete | NarrationEvent::Stopped => None,
        }
    }

    pub fn description(&self) -> String {
        match self {
            NarrationEvent::ChunkStarted { index, text } => {
                format!("Chunk {} started ({} chars)", index, text.chars().count())
            }
            NarrationEvent::ChunkEnded { index } => format!("Chunk {} ended", index),
            NarrationEvent::AllComplete => "All chunks complete".to_string(),
            NarrationEvent::Error { index: Some(i), message } => {
                format!("Chunk {} failed: {}", i, message)
            }
            NarrationEvent::Error { index: None, message } => format!("Error: {}", message),
            NarrationEvent::WaitingForInteraction { index } => {
                format!("Waiting for user interaction at chunk {}", index)
            }
            NarrationEvent::Stopped => "Stopped".to_string(),
        }
    }
}

impl fmt::Display for NarrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for narration events.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NarrationEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers and returns how many received it.
    ///
    /// Emitting with no subscribers is not an error for the publisher: the
    /// session keeps running headless.
    pub fn emit(&self, event: NarrationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
type EventFilter = Box<dyn Fn(&NarrationEvent) -> bool + Send + Sync>;

#[cfg(target_arch = "wasm32")]
type EventFilter = Box<dyn Fn(&NarrationEvent) -> bool>;

/// A `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<NarrationEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<NarrationEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NarrationEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    #[cfg(target_arch = "wasm32")]
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&NarrationEvent) -> bool + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<NarrationEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Result<NarrationEvent, TryRecvError> {
        loop {
            let event = self.receiver.try_recv()?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Drains every event currently buffered.
    pub fn drain(&mut self) -> Vec<NarrationEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    fn matches(&self, event: &NarrationEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }
}
