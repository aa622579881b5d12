//! Core types for Trekbase.
//!
//! This module provides type-safe wrappers for the back office's domain concepts.

pub mod admin_status;
pub mod content;
pub mod id;
pub mod migration;
pub mod price;
pub mod record;
pub mod records;
pub mod role;
pub mod trip;

pub use admin_status::AdminStatus;
pub use content::ContentBlock;
pub use id::*;
pub use migration::*;
pub use price::{CurrencyCode, Price};
pub use record::Record;
pub use records::*;
pub use role::{ParseRoleError, Permission, Role};
pub use trip::*;
