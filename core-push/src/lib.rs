//! # Push Core
//!
//! Device registration and message sending against the push backend.
//!
//! ## Components
//!
//! - [`RegistrationCoordinator`] - decides whether a registration is needed,
//!   runs it with bounded exponential backoff and owns the persisted
//!   [`RegistrationState`]
//! - [`SendCoordinator`] - validates and submits outgoing [`PushMessage`]s
//! - [`PushApi`] - URL building, auth header and response mapping over the
//!   host `HttpClient`
//! - [`IncomingNotification`] - decoding of received push payloads
//!
//! All host interaction goes through the bridge traits injected via
//! [`core_runtime::config::PushConfig`].

pub mod api;
pub mod error;
pub mod incoming;
pub mod registration;
pub mod retry;
pub mod send;
pub mod state_store;
pub mod tags;
pub mod types;

#[cfg(test)]
mod test_support;

pub use api::{ApiResponse, PushApi};
pub use error::{PushError, Result};
pub use incoming::IncomingNotification;
pub use registration::RegistrationCoordinator;
pub use retry::{Backoff, FixedJitter, JitterSource, ThreadRngJitter};
pub use send::SendCoordinator;
pub use state_store::RegistrationStateStore;
pub use tags::{parse_tags, validate_tag, validate_tags, MAX_TAG_LENGTH};
pub use types::{
    DeviceId, DeviceRegistration, PushMessage, RegisterOutcome, RegistrationState,
    UnregisterReceipt, PLATFORM_GCM,
};

pub use tokio_util::sync::CancellationToken;
