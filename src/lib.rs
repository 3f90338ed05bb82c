//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `pushlink-workspace` and
//! enable `desktop-shims` to get the push service with `reqwest` and SQLite
//! bridge defaults without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
