//! Push service façade.
//!
//! This crate wires a validated [`PushConfig`] into the push coordinators and
//! exposes one handle to host applications. Every operation comes in three
//! shapes:
//!
//! - async methods on [`PushService`];
//! - blocking methods on [`BlockingPushService`] for hosts without a runtime;
//! - `spawn_*` methods returning a [`BackgroundTask`] for fire-and-poll use.
//!
//! Desktop apps typically enable the `desktop-shims` feature, which supplies
//! `reqwest`/SQLite defaults for the HTTP and settings bridges.
//!
//! ```ignore
//! let config = PushConfig::builder()
//!     .api_endpoint(ApiEndpoint::new("https://api.example.com", "acme", "news"))
//!     .sender_id("123456789012")
//!     .push_provider(provider)
//!     .settings_path(data_dir.join("push.db"))
//!     .build()?;
//!
//! let service = PushService::new(config)?;
//! service.register_with_tags("news,sports").await?;
//! ```

pub mod background;
pub mod blocking;
pub mod error;

pub use background::BackgroundTask;
pub use blocking::BlockingPushService;
pub use error::{CoreError, Result};

pub use bridge_traits::{HttpClient, PushProvider, SessionProvider, SettingsStore};
pub use core_push::{
    PushError, PushMessage, RegisterOutcome, RegistrationState, UnregisterReceipt,
};
pub use core_runtime::config::{ApiEndpoint, PushConfig, RetryConfig};
pub use core_runtime::events::{CoreEvent, EventBus, MessageEvent, RegistrationEvent};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, StaticSessionProvider};

use core_push::{
    CancellationToken, IncomingNotification, JitterSource, RegistrationCoordinator,
    SendCoordinator,
};
use core_runtime::logging::token_fingerprint;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tracing::{info, instrument, warn};

/// Callbacks delivered by the platform push SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformPushEvent {
    /// The platform issued a registration token.
    Registered { token: String },
    /// The platform dropped its registration.
    Unregistered { token: String },
    /// A push message arrived.
    Message { payload: Option<String> },
    /// Unrecoverable platform error.
    Error { code: String },
    /// Platform error the SDK will retry on its own.
    RecoverableError { code: String },
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct PushService {
    pub(crate) registration: RegistrationCoordinator,
    pub(crate) sender: SendCoordinator,
    event_bus: EventBus,
    pub(crate) shutdown: CancellationToken,
}

impl PushService {
    /// Create a service from a built configuration.
    pub fn new(config: PushConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let registration = RegistrationCoordinator::new(&config, event_bus.clone());
        let sender = SendCoordinator::new(&config, event_bus.clone());

        info!(
            endpoint = %config.api_endpoint.base_url,
            push_enabled = config.push_enabled(),
            "Push service initialized"
        );

        Ok(Self {
            registration,
            sender,
            event_bus,
            shutdown: CancellationToken::new(),
        })
    }

    /// Replace the random source used for the first registration backoff.
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.registration = self.registration.with_jitter(jitter);
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Current persisted registration state.
    pub async fn registration_state(&self) -> Result<RegistrationState> {
        Ok(self.registration.state_store().load().await?)
    }

    pub async fn register(&self, token: &str) -> Result<RegisterOutcome> {
        Ok(self.registration.register(token, &self.shutdown).await?)
    }

    pub async fn register_with_tags(&self, raw_tags: &str) -> Result<RegisterOutcome> {
        Ok(self
            .registration
            .register_with_tags(raw_tags, &self.shutdown)
            .await?)
    }

    pub async fn register_current_device(&self) -> Result<RegisterOutcome> {
        Ok(self
            .registration
            .register_current_device(&self.shutdown)
            .await?)
    }

    pub async fn register_if_needed(&self, token: &str) -> Result<RegisterOutcome> {
        Ok(self
            .registration
            .register_if_needed(token, &self.shutdown)
            .await?)
    }

    pub async fn unregister(&self) -> Result<UnregisterReceipt> {
        Ok(self.registration.unregister().await?)
    }

    pub async fn send_push(&self, message: &PushMessage) -> Result<PushMessage> {
        Ok(self.sender.send_push(message).await?)
    }

    /// Route a platform SDK callback.
    #[instrument(skip(self, event))]
    pub async fn handle_platform_event(&self, event: PlatformPushEvent) -> Result<()> {
        match event {
            PlatformPushEvent::Registered { token } => {
                info!(token = %token_fingerprint(&token), "Platform issued a token");
                let outcome = self.register(&token).await?;
                if !outcome.is_registered() {
                    warn!(?outcome, "Platform token was not registered with the backend");
                }
                Ok(())
            }
            PlatformPushEvent::Unregistered { token } => {
                info!(token = %token_fingerprint(&token), "Platform dropped its registration");
                match self.unregister().await {
                    Ok(_) => Ok(()),
                    Err(CoreError::Push(PushError::NotRegistered)) => {
                        info!("Device was not registered with the backend");
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            PlatformPushEvent::Message { payload } => {
                if let Some(notification) = IncomingNotification::decode(payload.as_deref()) {
                    let _ = self
                        .event_bus
                        .emit(CoreEvent::Message(MessageEvent::Received {
                            body: notification.body,
                        }));
                }
                Ok(())
            }
            PlatformPushEvent::Error { code } => {
                warn!(%code, "Platform push error");
                self.emit_platform_error(code, false);
                Ok(())
            }
            PlatformPushEvent::RecoverableError { code } => {
                warn!(%code, "Recoverable platform push error");
                self.emit_platform_error(code, true);
                Ok(())
            }
        }
    }

    /// Blocking view over this service.
    pub fn blocking(&self) -> BlockingPushService {
        BlockingPushService::new(self.clone())
    }

    /// Cancel every in-flight and future registration retry loop.
    pub fn shutdown(&self) {
        info!("Push service shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn emit_platform_error(&self, code: String, recoverable: bool) {
        let _ = self
            .event_bus
            .emit(CoreEvent::Message(MessageEvent::PlatformError { code, recoverable }));
    }
}

impl std::fmt::Debug for PushService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushService")
            .field("event_bus", &self.event_bus)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
