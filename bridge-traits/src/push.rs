//! Platform Push Provider Abstraction
//!
//! Wraps the platform push-messaging SDK (FCM/GCM on Android, APNs on iOS).
//! The core never talks to the push network directly; it asks the provider
//! for the registration token and tells it when the backend registration
//! changed.

use async_trait::async_trait;

use crate::error::Result;

/// Platform push-messaging SDK.
///
/// Registration with the platform is asynchronous on every supported OS:
/// [`register`](PushProvider::register) only starts the request, and the host
/// reports the issued token back to the core through its platform callback
/// (see `core_service::PlatformPushEvent::Registered`).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::push::PushProvider;
///
/// async fn ensure_token(provider: &dyn PushProvider, sender_id: &str) -> Result<Option<String>> {
///     let token = provider.registration_token().await?;
///     if token.is_empty() {
///         provider.register(sender_id).await?;
///         return Ok(None);
///     }
///     Ok(Some(token))
/// }
/// ```
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Current platform registration token, empty when none was issued yet.
    async fn registration_token(&self) -> Result<String>;

    /// Ask the platform to issue a token for `sender_id`.
    async fn register(&self, sender_id: &str) -> Result<()>;

    /// Drop the platform registration and its local record.
    async fn unregister(&self) -> Result<()>;

    /// Whether the platform SDK believes the backend knows this device.
    async fn is_registered_locally(&self) -> Result<bool>;

    /// Record whether the backend knows this device.
    async fn mark_registered_locally(&self, registered: bool) -> Result<()>;
}
