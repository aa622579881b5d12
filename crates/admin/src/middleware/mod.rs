//! HTTP middleware and extractors for the admin service.
//!
//! # Layer Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing with status and latency)
//! 3. Permission extractors on individual handlers (see [`auth`])

pub mod auth;

pub use auth::{
    CanAdmin, CanDelete, CanManageTrips, CanViewAnalytics, CanWrite, GateRejection,
    RequirePermission, RequiredPermission,
};
