//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the push core and platform-specific
//! implementations. Each trait represents a capability that the core requires
//! but that must be implemented differently per platform (desktop, iOS,
//! Android).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-shot async HTTP round trips to the push backend
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences holding the registration state
//!
//! ### Platform Integration
//! - [`PushProvider`](push::PushProvider) - Platform push SDK (token issue, local registration record)
//! - [`SessionProvider`](session::SessionProvider) - Signed-in user and backend access token
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ HttpClient, SettingsStore, SessionProvider |
//! | Android  | host app            | 📋 PushProvider over FCM |
//! | iOS      | host app            | 📋 PushProvider over APNs |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let push_provider = builder.push_provider.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "PushProvider".to_string(),
//!     message: "Inject the platform push SDK adapter.".to_string(),
//! })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//! [`HttpClient`](http::HttpClient) reports `Err` only when no response was
//! received; HTTP error statuses travel inside `Ok(HttpResponse)`.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod http;
pub mod logging;
pub mod push;
pub mod session;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use push::PushProvider;
pub use session::{AnonymousSession, SessionProvider};
pub use storage::SettingsStore;
