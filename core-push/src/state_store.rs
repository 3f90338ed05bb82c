//! Registration State Persistence
//!
//! Keeps the registration state in the host [`SettingsStore`]. Each field
//! lives under its own key and is written independently; the store offers no
//! transactions, so `registered_on_server` is written last on save and first
//! on clear.

use crate::error::{PushError, Result};
use crate::types::{DeviceId, RegistrationState};
use bridge_traits::SettingsStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub const KEY_REQUESTED_TAGS: &str = "push.requested_tags";
pub const KEY_REGISTERED_TAGS: &str = "push.registered_tags";
pub const KEY_REGISTERED_USERNAME: &str = "push.registered_username";
pub const KEY_DEVICE_UUID: &str = "push.device_uuid";
pub const KEY_REGISTERED_ON_SERVER: &str = "push.registered_on_server";

#[derive(Clone)]
pub struct RegistrationStateStore {
    settings: Arc<dyn SettingsStore>,
}

impl RegistrationStateStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Read the full state; missing keys read as their empty value.
    pub async fn load(&self) -> Result<RegistrationState> {
        let registered_on_server = self
            .settings
            .get_bool(KEY_REGISTERED_ON_SERVER)
            .await
            .map_err(PushError::storage)?
            .unwrap_or(false);

        let device_uuid = match self.get(KEY_DEVICE_UUID).await? {
            raw if raw.is_empty() => None,
            raw => match DeviceId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(error = %e, "Ignoring unparseable stored device uuid");
                    None
                }
            },
        };

        Ok(RegistrationState {
            registered_on_server,
            registered_username: self.get(KEY_REGISTERED_USERNAME).await?,
            registered_tags: self.get(KEY_REGISTERED_TAGS).await?,
            device_uuid,
            requested_tags: self.get(KEY_REQUESTED_TAGS).await?,
        })
    }

    pub async fn requested_tags(&self) -> Result<String> {
        self.get(KEY_REQUESTED_TAGS).await
    }

    pub async fn set_requested_tags(&self, raw: &str) -> Result<()> {
        self.set(KEY_REQUESTED_TAGS, raw).await
    }

    /// Record a successful registration.
    pub async fn save_registration(
        &self,
        username: &str,
        registered_tags: &str,
        device_id: DeviceId,
    ) -> Result<()> {
        self.set(KEY_REGISTERED_TAGS, registered_tags).await?;
        self.set(KEY_REGISTERED_USERNAME, username).await?;
        self.set(KEY_DEVICE_UUID, &device_id.to_string()).await?;
        self.settings
            .set_bool(KEY_REGISTERED_ON_SERVER, true)
            .await
            .map_err(PushError::storage)?;

        debug!(device_id = %device_id, "Saved registration state");
        Ok(())
    }

    /// Forget the registration, including the requested tags.
    pub async fn clear(&self) -> Result<()> {
        self.settings
            .set_bool(KEY_REGISTERED_ON_SERVER, false)
            .await
            .map_err(PushError::storage)?;

        for key in [
            KEY_REQUESTED_TAGS,
            KEY_REGISTERED_TAGS,
            KEY_REGISTERED_USERNAME,
            KEY_DEVICE_UUID,
        ] {
            self.settings.delete(key).await.map_err(PushError::storage)?;
        }

        debug!("Cleared registration state");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<String> {
        Ok(self
            .settings
            .get_string(key)
            .await
            .map_err(PushError::storage)?
            .unwrap_or_default())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.settings
            .set_string(key, value)
            .await
            .map_err(PushError::storage)
    }
}
