//! Preference Storage Abstraction
//!
//! Durable key-value storage for small pieces of client state such as the
//! last registered tag set or the server-assigned device id.

use async_trait::async_trait;

use crate::error::Result;

/// Settings storage trait
///
/// Maps to the host's preference facility:
/// - **iOS**: UserDefaults
/// - **Android**: SharedPreferences / DataStore
/// - **Desktop**: SQLite-backed store in `bridge-desktop`
///
/// Each call stands on its own; no transactional guarantee is assumed across
/// keys.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember_device(store: &dyn SettingsStore, uuid: &str) -> Result<()> {
///     store.set_string("push.device_uuid", uuid).await?;
///     store.set_bool("push.registered_on_server", true).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
