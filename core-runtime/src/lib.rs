//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the push core:
//! - Logging and tracing infrastructure
//! - Configuration management (`PushConfig`, `RetryConfig`)
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one. It fixes the logging
//! conventions, validates the injected host bridges once at startup, and
//! carries the broadcast channel that registration and message events travel
//! on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
