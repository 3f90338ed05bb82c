//! Outgoing push messages.

use crate::api::PushApi;
use crate::error::{PushError, Result};
use crate::types::PushMessage;
use core_runtime::config::PushConfig;
use core_runtime::events::{CoreEvent, EventBus, MessageEvent};
use tracing::{info, instrument, warn};

/// Validates outgoing messages and submits each one exactly once.
#[derive(Clone)]
pub struct SendCoordinator {
    api: PushApi,
    event_bus: EventBus,
    enabled: bool,
}

impl SendCoordinator {
    pub fn new(config: &PushConfig, event_bus: EventBus) -> Self {
        Self {
            api: PushApi::from_config(config),
            event_bus,
            enabled: config.push_enabled(),
        }
    }

    /// Submit `message` and return the entity the backend created.
    ///
    /// Never retried: a blind resend could deliver the message twice.
    #[instrument(skip(self, message), fields(target = %message.target))]
    pub async fn send_push(&self, message: &PushMessage) -> Result<PushMessage> {
        if !self.enabled {
            return Err(PushError::Config("push is disabled".to_string()));
        }
        message.validate()?;

        let created = self.api.create_push(message).await.map_err(|e| {
            warn!(error = %e, "Push send failed");
            e
        })?;

        let message_id = created.uuid.map(|id| id.to_string());
        info!(message_id = ?message_id, "Push message accepted");
        let _ = self.event_bus.emit(CoreEvent::Message(MessageEvent::Sent {
            target: created.target.clone(),
            message_id,
        }));

        Ok(created)
    }
}
