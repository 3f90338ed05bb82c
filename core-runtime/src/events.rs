//! # Event Bus System
//!
//! Broadcasts push lifecycle events from the core to the host UI using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wrapping [`RegistrationEvent`] and [`MessageEvent`]
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────────────┐   emit    ┌───────────┐   subscribe   ┌────────────┐
//! │ RegistrationCoordinator  ├──────────>│           ├──────────────>│  Host UI   │
//! └──────────────────────────┘           │ EventBus  │               └────────────┘
//! ┌──────────────────────────┐   emit    │           │   subscribe   ┌────────────┐
//! │ SendCoordinator / inbox  ├──────────>│           ├──────────────>│ Analytics  │
//! └──────────────────────────┘           └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, RegistrationEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Registration(RegistrationEvent::Unregistered {
//!         device_id: "5b1f9e0c-2b51-4b5e-9a57-4b2c8a0f1d11".to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Device unregistered");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers returns `Err`; the core ignores that case.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Device registration lifecycle
    Registration(RegistrationEvent),
    /// Outgoing and incoming push messages
    Message(MessageEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Registration(e) => e.description(),
            CoreEvent::Message(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Registration(RegistrationEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Message(MessageEvent::PlatformError {
                recoverable: false, ..
            }) => EventSeverity::Error,
            CoreEvent::Registration(RegistrationEvent::Retrying { .. })
            | CoreEvent::Message(MessageEvent::PlatformError { .. }) => EventSeverity::Warning,
            CoreEvent::Registration(RegistrationEvent::Registered { .. })
            | CoreEvent::Registration(RegistrationEvent::Unregistered { .. })
            | CoreEvent::Message(MessageEvent::Sent { .. })
            | CoreEvent::Message(MessageEvent::Received { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Registration Events
// ============================================================================

/// Events describing the device registration with the push backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RegistrationEvent {
    /// The platform has no token yet; one was requested for `sender_id`.
    AwaitingToken { sender_id: String },
    /// A create-device attempt is starting.
    Registering { attempt: u32, max_attempts: u32 },
    /// An attempt failed with a retryable error; the next one follows after `delay_ms`.
    Retrying {
        attempt: u32,
        delay_ms: u64,
        /// Backend status code, `None` when no response was received.
        status_code: Option<u16>,
        message: String,
    },
    /// The backend accepted the device.
    Registered {
        device_id: String,
        tags: Vec<String>,
        username: Option<String>,
    },
    /// Registration was not needed (same user, same tags).
    Skipped { reason: String },
    /// Registration ended without a device.
    Failed {
        message: String,
        status_code: Option<u16>,
        /// Whether a later attempt may succeed.
        recoverable: bool,
    },
    /// The backend forgot the device and local state was cleared.
    Unregistered { device_id: String },
}

impl RegistrationEvent {
    fn description(&self) -> &str {
        match self {
            RegistrationEvent::AwaitingToken { .. } => "Waiting for platform push token",
            RegistrationEvent::Registering { .. } => "Registering device",
            RegistrationEvent::Retrying { .. } => "Retrying device registration",
            RegistrationEvent::Registered { .. } => "Device registered",
            RegistrationEvent::Skipped { .. } => "Device already registered",
            RegistrationEvent::Failed { .. } => "Device registration failed",
            RegistrationEvent::Unregistered { .. } => "Device unregistered",
        }
    }
}

// ============================================================================
// Message Events
// ============================================================================

/// Events about push messages flowing through the SDK.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum MessageEvent {
    /// The backend accepted an outgoing push.
    Sent {
        target: String,
        message_id: Option<String>,
    },
    /// A push notification arrived on this device.
    Received { body: String },
    /// The platform push SDK reported an error.
    PlatformError { code: String, recoverable: bool },
}

impl MessageEvent {
    fn description(&self) -> &str {
        match self {
            MessageEvent::Sent { .. } => "Push message sent",
            MessageEvent::Received { .. } => "Push message received",
            MessageEvent::PlatformError { .. } => "Platform push error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another sender on the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus; subscribers lagging by more than `capacity`
    /// events receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event; returns how many subscribers received it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` that skips events rejected by a filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let registrations = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Registration(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned from `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
