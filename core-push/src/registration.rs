//! # Registration Coordinator
//!
//! Owns the device registration lifecycle with the push backend:
//!
//! - decides whether a (re-)registration is needed by comparing the stored
//!   username and tag string with the current ones;
//! - runs the create-device call through a bounded exponential backoff;
//! - persists the resulting state and mirrors it into the platform provider;
//! - unregisters the device on request.
//!
//! Every entry point that touches the registration state holds one
//! coordinator-wide lock for its whole duration, so concurrent callers are
//! serialized rather than racing on the preference store.
//!
//! ## Outcomes
//!
//! A registration that cannot complete because every attempt hit a
//! retryable failure is **not** an error: it yields
//! [`RegisterOutcome::Exhausted`] carrying the last error. Cancellation yields
//! [`RegisterOutcome::Cancelled`]. Only terminal failures (a non-5xx backend
//! status, invalid input, local storage failures) come back as `Err`.
//!
//! ## Example
//!
//! ```ignore
//! let coordinator = RegistrationCoordinator::new(&config, event_bus);
//! let cancel = CancellationToken::new();
//!
//! match coordinator.register_with_tags("news,sports", &cancel).await? {
//!     RegisterOutcome::Registered(device) => println!("registered {:?}", device.uuid),
//!     RegisterOutcome::AwaitingToken => println!("waiting for the platform token"),
//!     other => println!("no registration: {:?}", other),
//! }
//! ```

use crate::api::PushApi;
use crate::error::{PushError, Result};
use crate::retry::{sleep_or_cancel, Backoff, JitterSource, ThreadRngJitter};
use crate::state_store::RegistrationStateStore;
use crate::tags::{parse_tags, validate_tags};
use crate::types::{DeviceRegistration, RegisterOutcome, UnregisterReceipt};
use bridge_traits::{PushProvider, SessionProvider};
use core_runtime::config::{PushConfig, RetryConfig};
use core_runtime::events::{CoreEvent, EventBus, RegistrationEvent};
use core_runtime::logging::token_fingerprint;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct RegistrationCoordinator {
    api: PushApi,
    state: RegistrationStateStore,
    provider: Arc<dyn PushProvider>,
    session: Arc<dyn SessionProvider>,
    event_bus: EventBus,
    retry: RetryConfig,
    jitter: Arc<dyn JitterSource>,
    sender_id: Option<String>,
    enabled: bool,
    flight: Arc<Mutex<()>>,
}

impl RegistrationCoordinator {
    pub fn new(config: &PushConfig, event_bus: EventBus) -> Self {
        Self {
            api: PushApi::from_config(config),
            state: RegistrationStateStore::new(config.settings_store.clone()),
            provider: config.push_provider.clone(),
            session: config.session_provider.clone(),
            event_bus,
            retry: config.retry,
            jitter: Arc::new(ThreadRngJitter),
            sender_id: config.sender_id.clone(),
            enabled: config.push_enabled(),
            flight: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the random source used for the first backoff.
    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Read access to the persisted state.
    pub fn state_store(&self) -> &RegistrationStateStore {
        &self.state
    }

    /// Register `token` with the backend, retrying transient failures.
    #[instrument(skip(self, token, cancel), fields(token = %token_fingerprint(token)))]
    pub async fn register(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        self.ensure_enabled()?;
        let _flight = self.flight.lock().await;
        self.register_locked(token, cancel).await
    }

    /// Validate and store the requested tags, then register the current device.
    #[instrument(skip(self, cancel))]
    pub async fn register_with_tags(
        &self,
        raw_tags: &str,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        self.ensure_enabled()?;
        let tags = validate_tags(raw_tags)?;
        debug!(?tags, "Requested tags validated");

        let _flight = self.flight.lock().await;
        self.state.set_requested_tags(raw_tags).await?;
        self.register_current_device_locked(cancel).await
    }

    /// Register the platform's current token, or ask the platform for one.
    #[instrument(skip(self, cancel))]
    pub async fn register_current_device(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        self.ensure_enabled()?;
        let _flight = self.flight.lock().await;
        self.register_current_device_locked(cancel).await
    }

    /// Register `token` unless the backend already has it for this user and
    /// tag set, in which case [`PushError::AlreadyRegistered`] is returned
    /// without any network call.
    #[instrument(skip(self, token, cancel), fields(token = %token_fingerprint(token)))]
    pub async fn register_if_needed(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        self.ensure_enabled()?;
        let _flight = self.flight.lock().await;
        self.register_if_needed_locked(token, cancel).await
    }

    /// Ask the backend to forget this device and clear local state.
    ///
    /// Single attempt; never retried.
    #[instrument(skip(self))]
    pub async fn unregister(&self) -> Result<UnregisterReceipt> {
        self.ensure_enabled()?;
        let _flight = self.flight.lock().await;

        let state = self.state.load().await?;
        if !state.registered_on_server {
            return Err(PushError::NotRegistered);
        }

        let status_code = match state.device_uuid {
            Some(device_id) => Some(self.api.delete_device(&device_id).await?),
            None => {
                warn!("Registered without a stored device uuid; clearing local state only");
                None
            }
        };

        self.state.clear().await?;
        self.provider
            .mark_registered_locally(false)
            .await
            .map_err(PushError::platform)?;

        let device_id = state.device_uuid;
        info!(device_id = ?device_id, status = ?status_code, "Device unregistered");
        let _ = self
            .event_bus
            .emit(CoreEvent::Registration(RegistrationEvent::Unregistered {
                device_id: device_id.map(|id| id.to_string()).unwrap_or_default(),
            }));

        Ok(UnregisterReceipt {
            device_id,
            status_code,
        })
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(PushError::Config("push is disabled".to_string()))
        }
    }

    async fn register_current_device_locked(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        let token = self
            .provider
            .registration_token()
            .await
            .map_err(PushError::platform)?;

        if !token.trim().is_empty() {
            return self.register_if_needed_locked(&token, cancel).await;
        }

        let sender_id = self
            .sender_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PushError::Config("no sender id configured".to_string()))?;

        info!("No platform token yet; requesting one");
        self.provider
            .register(sender_id)
            .await
            .map_err(PushError::platform)?;

        let _ = self
            .event_bus
            .emit(CoreEvent::Registration(RegistrationEvent::AwaitingToken {
                sender_id: sender_id.to_string(),
            }));

        Ok(RegisterOutcome::AwaitingToken)
    }

    async fn register_if_needed_locked(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        ensure_token(token)?;

        let state = self.state.load().await?;
        let username = self.current_username().await;

        let Some(reason) = state.staleness_reason(&username) else {
            debug!("Backend already has this device for the current user and tags");
            self.sync_platform_flag().await;
            let _ = self
                .event_bus
                .emit(CoreEvent::Registration(RegistrationEvent::Skipped {
                    reason: "same user and tags".to_string(),
                }));
            return Err(PushError::AlreadyRegistered);
        };

        info!(reason, "Registration needed");
        let result = self.register_locked(token, cancel).await;

        if !matches!(result, Ok(RegisterOutcome::Registered(_))) {
            // The platform must not keep claiming a registration the backend never saw.
            if let Err(e) = self.provider.unregister().await {
                warn!(error = %e, "Failed to clear platform registration");
            }
        }

        result
    }

    async fn register_locked(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RegisterOutcome> {
        ensure_token(token)?;

        let raw_tags = self.state.requested_tags().await?;
        let device = DeviceRegistration::new(token, parse_tags(&raw_tags));

        let max_attempts = self.retry.max_attempts;
        let mut backoff = Backoff::new(&self.retry, self.jitter.as_ref());
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                info!(attempt, "Registration cancelled");
                return Ok(RegisterOutcome::Cancelled);
            }

            attempt += 1;
            debug!(attempt, max_attempts, "Registering device");
            let _ = self
                .event_bus
                .emit(CoreEvent::Registration(RegistrationEvent::Registering {
                    attempt,
                    max_attempts,
                }));

            let err = match self.api.create_device(&device).await {
                Ok(created) => {
                    let created = self.complete_registration(created, &raw_tags).await?;
                    return Ok(RegisterOutcome::Registered(created));
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                warn!(attempt, error = %err, "Registration rejected");
                self.emit_failed(&err, false);
                return Err(err);
            }

            if attempt >= max_attempts {
                warn!(attempts = attempt, error = %err, "Registration attempts exhausted");
                self.emit_failed(&err, true);
                return Ok(RegisterOutcome::Exhausted {
                    attempts: attempt,
                    last_error: err,
                });
            }

            let delay = backoff.advance();
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Registration failed; retrying"
            );
            let _ = self
                .event_bus
                .emit(CoreEvent::Registration(RegistrationEvent::Retrying {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                    status_code: err.status_code(),
                    message: err.to_string(),
                }));

            if !sleep_or_cancel(delay, cancel).await {
                info!(attempt, "Registration cancelled during backoff");
                return Ok(RegisterOutcome::Cancelled);
            }
        }
    }

    async fn complete_registration(
        &self,
        created: DeviceRegistration,
        raw_tags: &str,
    ) -> Result<DeviceRegistration> {
        let device_id = created.uuid.ok_or_else(|| {
            PushError::UnknownResult("device entity has no uuid".to_string())
        })?;
        let username = self.current_username().await;

        self.state
            .save_registration(&username, raw_tags, device_id)
            .await?;
        self.provider
            .mark_registered_locally(true)
            .await
            .map_err(PushError::platform)?;

        info!(device_id = %device_id, "Device registered");
        let _ = self
            .event_bus
            .emit(CoreEvent::Registration(RegistrationEvent::Registered {
                device_id: device_id.to_string(),
                tags: created.tags.clone(),
                username: (!username.is_empty()).then(|| username.clone()),
            }));

        Ok(created)
    }

    /// Bring the platform's local flag back in line with a current backend
    /// registration.
    async fn sync_platform_flag(&self) {
        match self.provider.is_registered_locally().await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Platform flag disagrees with stored registration; marking registered");
                if let Err(e) = self.provider.mark_registered_locally(true).await {
                    warn!(error = %e, "Failed to update platform registration flag");
                }
            }
            Err(e) => warn!(error = %e, "Failed to read platform registration flag"),
        }
    }

    async fn current_username(&self) -> String {
        self.session.signed_in_username().await.unwrap_or_default()
    }

    fn emit_failed(&self, err: &PushError, recoverable: bool) {
        let _ = self
            .event_bus
            .emit(CoreEvent::Registration(RegistrationEvent::Failed {
                message: err.to_string(),
                status_code: err.status_code(),
                recoverable,
            }));
    }
}

fn ensure_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(PushError::Validation(
            "registration token must not be empty".to_string(),
        ));
    }
    Ok(())
}
