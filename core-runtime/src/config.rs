//! # Push Configuration Module
//!
//! Configuration for the push core, built through [`PushConfigBuilder`].
//!
//! ## Overview
//!
//! [`PushConfig`] holds every bridge the push core talks to plus the backend
//! endpoint and retry policy. The builder validates eagerly so a host learns
//! about a missing capability at startup rather than on the first
//! registration attempt.
//!
//! ## Required Dependencies
//!
//! - `PushProvider` - the platform push SDK adapter
//! - `ApiEndpoint` - backend base URL, organization and application
//! - `sender_id` - when push is enabled
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - desktop default: reqwest
//! - `SettingsStore` - desktop default: SQLite at `settings_path`
//! - `SessionProvider` - default: anonymous (no user, no access token)
//!
//! Desktop defaults are only available with the `desktop-shims` feature.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ApiEndpoint, PushConfig};
//! use std::sync::Arc;
//!
//! let config = PushConfig::builder()
//!     .api_endpoint(ApiEndpoint::new("https://api.example.com", "acme", "news"))
//!     .sender_id("123456789012")
//!     .push_provider(Arc::new(MyFcmProvider::new()))
//!     .settings_path("/var/lib/news/settings.db")
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::PushConfig;
//!
//! // No push provider, no endpoint
//! let config = PushConfig::builder()
//!     .sender_id("123456789012")
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AnonymousSession, HttpClient, PushProvider, SessionProvider, SettingsStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default number of registration attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay before the first retry, before jitter.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(2000);
/// Default exclusive upper bound of the random jitter added to the first delay.
pub const DEFAULT_JITTER_BOUND: Duration = Duration::from_millis(1000);
/// Default per-request timeout applied by the desktop HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default capacity of the event broadcast channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Push core configuration.
///
/// Use [`PushConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct PushConfig {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub push_provider: Arc<dyn PushProvider>,
    pub session_provider: Arc<dyn SessionProvider>,
    pub api_endpoint: ApiEndpoint,
    /// Sender id handed to the platform SDK when no token exists yet
    pub sender_id: Option<String>,
    pub features: FeatureFlags,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("push_provider", &"PushProvider { ... }")
            .field("session_provider", &"SessionProvider { ... }")
            .field("api_endpoint", &self.api_endpoint)
            .field("sender_id", &self.sender_id)
            .field("features", &self.features)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Master switch; every push operation fails with a config error when off.
    pub enable_push: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { enable_push: true }
    }
}

/// Location of the push backend.
///
/// Requests go to `{base_url}/{organization}/{application}/{segments..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub organization: String,
    pub application: String,
}

impl ApiEndpoint {
    pub fn new(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            organization: organization.into(),
            application: application.into(),
        }
    }

    /// Join path segments onto the application root.
    ///
    /// ```
    /// use core_runtime::config::ApiEndpoint;
    ///
    /// let endpoint = ApiEndpoint::new("https://api.example.com/", "acme", "news");
    /// assert_eq!(
    ///     endpoint.url(&["pushes", "devices"]),
    ///     "https://api.example.com/acme/news/pushes/devices"
    /// );
    /// ```
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.organization.trim_matches('/'),
            self.application.trim_matches('/')
        );
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("API base URL cannot be empty".to_string()));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                base
            )));
        }
        if self.organization.trim().is_empty() {
            return Err(Error::Config("Organization cannot be empty".to_string()));
        }
        if self.application.trim().is_empty() {
            return Err(Error::Config("Application cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Registration retry policy.
///
/// The first retry waits `base_backoff` plus a random jitter in
/// `[0, jitter_bound)`; every later wait doubles the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub jitter_bound: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            jitter_bound: DEFAULT_JITTER_BOUND,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    pub fn with_jitter_bound(mut self, jitter_bound: Duration) -> Self {
        self.jitter_bound = jitter_bound;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl PushConfig {
    pub fn builder() -> PushConfigBuilder {
        PushConfigBuilder::default()
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.api_endpoint.validate()?;
        self.retry.validate()?;

        if self.features.enable_push
            && self
                .sender_id
                .as_deref()
                .map_or(true, |id| id.trim().is_empty())
        {
            return Err(Error::Config(
                "Push is enabled but no sender id was provided. \
                 Use .sender_id() or disable push with .enable_push(false)."
                    .to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn push_enabled(&self) -> bool {
        self.features.enable_push
    }
}

fn push_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PushProvider".to_string(),
        message: "PushProvider implementation is required to obtain registration tokens. \
                 Android: wrap Firebase Cloud Messaging. \
                 iOS: wrap APNs registration."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the push backend. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform HTTP stack."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required to persist registration state. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (SharedPreferences/UserDefaults)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(timeout)?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(settings_path: Option<PathBuf>) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = settings_path.ok_or_else(|| {
        Error::Config(
            "Settings path is required for the default SettingsStore. \
             Use .settings_path() or inject a SettingsStore."
                .to_string(),
        )
    })?;

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // Blocking on a runtime from inside another runtime panics, so hop threads.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(
    _settings_path: Option<PathBuf>,
) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for [`PushConfig`].
#[derive(Default)]
pub struct PushConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    push_provider: Option<Arc<dyn PushProvider>>,
    session_provider: Option<Arc<dyn SessionProvider>>,
    api_endpoint: Option<ApiEndpoint>,
    sender_id: Option<String>,
    settings_path: Option<PathBuf>,
    enable_push: Option<bool>,
    retry: Option<RetryConfig>,
    request_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl PushConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the preference store holding the registration state.
    ///
    /// If not provided, a SQLite store at [`settings_path`](Self::settings_path)
    /// is opened when the `desktop-shims` feature is enabled.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the platform push SDK adapter (required).
    pub fn push_provider(mut self, provider: Arc<dyn PushProvider>) -> Self {
        self.push_provider = Some(provider);
        self
    }

    /// Sets the session provider. Defaults to [`AnonymousSession`].
    pub fn session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.session_provider = Some(provider);
        self
    }

    /// Sets the backend endpoint (required).
    pub fn api_endpoint(mut self, endpoint: ApiEndpoint) -> Self {
        self.api_endpoint = Some(endpoint);
        self
    }

    pub fn sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Path of the SQLite file used by the desktop default settings store.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Enables or disables push entirely.
    ///
    /// Default: true
    pub fn enable_push(mut self, enabled: bool) -> Self {
        self.enable_push = Some(enabled);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `PushConfig`.
    ///
    /// Fails with [`Error::CapabilityMissing`] when a required bridge is absent
    /// and no platform default exists, and with [`Error::Config`] for invalid
    /// values.
    pub fn build(self) -> Result<PushConfig> {
        let api_endpoint = self.api_endpoint.ok_or_else(|| {
            Error::Config(
                "API endpoint is required. Use .api_endpoint() to set it.".to_string(),
            )
        })?;

        let push_provider = self.push_provider.ok_or_else(push_provider_missing_error)?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(self.settings_path)?,
        };

        let session_provider = self
            .session_provider
            .unwrap_or_else(|| Arc::new(AnonymousSession));

        let config = PushConfig {
            http_client,
            settings_store,
            push_provider,
            session_provider,
            api_endpoint,
            sender_id: self.sender_id,
            features: FeatureFlags {
                enable_push: self.enable_push.unwrap_or(true),
            },
            retry: self.retry.unwrap_or_default(),
            request_timeout,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn set_bool(&self, _key: &str, _value: bool) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_bool(&self, _key: &str) -> BridgeResult<Option<bool>> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct MockPushProvider;

    #[async_trait]
    impl PushProvider for MockPushProvider {
        async fn registration_token(&self) -> BridgeResult<String> {
            Ok(String::new())
        }

        async fn register(&self, _sender_id: &str) -> BridgeResult<()> {
            Ok(())
        }

        async fn unregister(&self) -> BridgeResult<()> {
            Ok(())
        }

        async fn is_registered_locally(&self) -> BridgeResult<bool> {
            Ok(false)
        }

        async fn mark_registered_locally(&self, _registered: bool) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn endpoint() -> ApiEndpoint {
        ApiEndpoint::new("https://api.example.com", "acme", "news")
    }

    fn complete_builder() -> PushConfigBuilder {
        PushConfig::builder()
            .api_endpoint(endpoint())
            .sender_id("123456789012")
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .push_provider(Arc::new(MockPushProvider))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();

        assert!(config.push_enabled());
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(config.sender_id.as_deref(), Some("123456789012"));
    }

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_backoff, Duration::from_millis(2000));
        assert_eq!(retry.jitter_bound, Duration::from_millis(1000));
    }

    #[test]
    fn test_builder_requires_push_provider() {
        let result = PushConfig::builder()
            .api_endpoint(endpoint())
            .sender_id("1")
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "PushProvider")
            }
            other => panic!("expected missing PushProvider, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_requires_endpoint() {
        let result = PushConfig::builder()
            .sender_id("1")
            .push_provider(Arc::new(MockPushProvider))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("API endpoint is required"));
    }

    #[test]
    fn test_enabled_push_requires_sender_id() {
        let result = PushConfig::builder()
            .api_endpoint(endpoint())
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .push_provider(Arc::new(MockPushProvider))
            .build();

        let err = result.unwrap_err().to_string();
        assert!(err.contains("sender id"));
    }

    #[test]
    fn test_disabled_push_needs_no_sender_id() {
        let config = PushConfig::builder()
            .api_endpoint(endpoint())
            .http_client(Arc::new(MockHttpClient))
            .settings_store(Arc::new(MockSettingsStore))
            .push_provider(Arc::new(MockPushProvider))
            .enable_push(false)
            .build()
            .unwrap();

        assert!(!config.push_enabled());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let result = complete_builder()
            .retry(RetryConfig::default().with_max_attempts(0))
            .build();

        assert!(result.unwrap_err().to_string().contains("max_attempts"));
    }

    #[test]
    fn test_rejects_zero_timeout_and_buffer() {
        assert!(complete_builder()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(complete_builder().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(endpoint().validate().is_ok());
        assert!(ApiEndpoint::new("", "acme", "news").validate().is_err());
        assert!(ApiEndpoint::new("ftp://x", "acme", "news").validate().is_err());
        assert!(ApiEndpoint::new("https://x", " ", "news").validate().is_err());
        assert!(ApiEndpoint::new("https://x", "acme", "").validate().is_err());
    }

    #[test]
    fn test_endpoint_url_joins_segments() {
        let endpoint = ApiEndpoint::new("https://api.example.com/", "/acme/", "news");
        assert_eq!(
            endpoint.url(&["pushes", "devices", "42"]),
            "https://api.example.com/acme/news/pushes/devices/42"
        );
        assert_eq!(endpoint.url(&[]), "https://api.example.com/acme/news");
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = complete_builder().build().unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("HttpClient { ... }"));
        assert!(rendered.contains("acme"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_shims() {
        let result = PushConfig::builder()
            .api_endpoint(endpoint())
            .sender_id("1")
            .settings_store(Arc::new(MockSettingsStore))
            .push_provider(Arc::new(MockPushProvider))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => assert_eq!(capability, "HttpClient"),
            other => panic!("expected missing HttpClient, got {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let base = std::env::temp_dir().join(format!(
            "core-runtime-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let path = base.join("settings.db");

        let config = PushConfig::builder()
            .api_endpoint(endpoint())
            .sender_id("1")
            .push_provider(Arc::new(MockPushProvider))
            .settings_path(&path)
            .build()
            .expect("desktop defaults should succeed");

        let settings = config.settings_store.clone();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            settings.set_string("push.requested_tags", "news").await.unwrap();
            let value = settings.get_string("push.requested_tags").await.unwrap();
            assert_eq!(value.as_deref(), Some("news"));
        });

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_settings_default_needs_path() {
        let result = PushConfig::builder()
            .api_endpoint(endpoint())
            .sender_id("1")
            .http_client(Arc::new(MockHttpClient))
            .push_provider(Arc::new(MockPushProvider))
            .build();

        assert!(result.unwrap_err().to_string().contains("Settings path"));
    }
}
