//! Trekbase Core - Shared types library.
//!
//! This crate provides common types used across all Trekbase components:
//! - `admin` - Back-office service (local mirror, access gate, migration)
//! - `cli` - Command-line tools for migration and mirror management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, roles, trip records and migration results
//! - [`permission`] - The fixed role to permission mapping and permission checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod permission;
pub mod types;

pub use permission::*;
pub use types::*;
