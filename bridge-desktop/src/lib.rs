//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `SessionProvider` holding the identity the host signed in with
//!
//! Desktop has no platform push SDK, so hosts still inject their own
//! `PushProvider`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new(Duration::from_secs(30))?;
//!     let settings = SqliteSettingsStore::new("prefs.db".into()).await?;
//!     // Use in PushConfig
//!     Ok(())
//! }
//! ```

mod http;
mod session;
mod settings;

pub use http::ReqwestHttpClient;
pub use session::StaticSessionProvider;
pub use settings::SqliteSettingsStore;
