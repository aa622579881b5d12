//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Health check
//!
//! # Session
//! GET    /api/admin/status               - Current admin status
//! PUT    /api/admin/status               - Toggle the admin flag (admin)
//!
//! # Trips (local mirror)
//! GET    /api/trips                      - List trips
//! DELETE /api/trips                      - Clear trips (manage_trips)
//! GET    /api/trips/{id}                 - Show trip
//! PUT    /api/trips/{id}                 - Upsert trip (manage_trips)
//! DELETE /api/trips/{id}                 - Remove trip (manage_trips)
//!
//! # Parallel collections
//! GET    /api/reviews                    - List reviews
//! POST   /api/reviews                    - Upsert review (write)
//! DELETE /api/reviews/{id}               - Remove review (delete)
//! GET    /api/ratings                    - List ratings
//! POST   /api/ratings                    - Upsert rating (write)
//! GET    /api/featured                   - Featured strip
//! PUT    /api/featured                   - Replace featured strip (manage_trips)
//! GET    /api/group-sizes                - List group-size overrides
//! PUT    /api/group-sizes/{trip_id}      - Set group-size override (manage_trips)
//! POST   /api/analytics/events           - Record event (open)
//! GET    /api/analytics/events           - List events (view_analytics)
//!
//! # Migration
//! POST   /api/admin/migrate              - Copy local trips to the remote store (admin)
//! POST   /api/admin/clear-remote         - Delete every remote trip (admin)
//! GET    /api/admin/verify               - Compare local and remote counts (admin)
//! POST   /api/admin/upload/{bucket}/{*path} - Upload an image (manage_trips)
//! ```
//!
//! Gated routes answer 503 with `Retry-After` while the session is loading
//! and 403 with a reason and a way back when the permission is missing.

pub mod admin;
pub mod collections;
pub mod trips;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Every admin route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(admin::router())
        .merge(trips::router())
        .merge(collections::router())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
