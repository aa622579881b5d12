//! Integration tests for Trekbase.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p trekbase-integration-tests
//! ```
//!
//! No external services are needed: the remote store is played by
//! [`MemoryRemoteStore`] and the mirror lives in memory or in a temp dir.
//!
//! # Test Categories
//!
//! - `migration` - Migration routine against the in-memory remote store
//! - `access_gate` - Session store and gate decisions
//! - `mirror_store` - File-backed mirror and typed collections
//! - `http_api` - Admin routes end to end

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use trekbase_admin::config::DEFAULT_MAX_ANALYTICS_EVENTS;
use trekbase_admin::migration::MigrationOptions;
use trekbase_admin::mirror::LocalMirror;
use trekbase_admin::remote::MemoryRemoteStore;
use trekbase_admin::routes;
use trekbase_admin::state::AppState;
use trekbase_core::LocalTripRecord;

/// Everything a test needs: state, router, and a handle on the fake remote.
pub struct TestContext {
    pub state: AppState,
    pub remote: Arc<MemoryRemoteStore>,
    pub app: Router,
}

impl TestContext {
    /// In-memory mirror, no pause between migrated records, session
    /// still loading.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mirror(LocalMirror::in_memory())
    }

    #[must_use]
    pub fn with_mirror(mirror: LocalMirror) -> Self {
        let remote = Arc::new(MemoryRemoteStore::new());
        let state = AppState::new(
            mirror,
            remote.clone(),
            MigrationOptions {
                delay: Duration::ZERO,
                ..MigrationOptions::default()
            },
            DEFAULT_MAX_ANALYTICS_EVENTS,
        );
        let app = routes::routes().with_state(state.clone());
        Self { state, remote, app }
    }

    /// Write the admin flag and resolve the session.
    ///
    /// # Panics
    ///
    /// Panics if the mirror cannot be written.
    pub async fn sign_in(&self, is_admin: bool) {
        self.state
            .session()
            .set_admin_flag(is_admin)
            .await
            .expect("admin flag written");
    }

    /// Store trips with ids `1..=n` under the given titles.
    ///
    /// # Panics
    ///
    /// Panics if the mirror cannot be written.
    pub async fn seed_trips(&self, titles: &[&str]) {
        let trips = self.state.trips();
        for (i, title) in titles.iter().enumerate() {
            trips
                .upsert(LocalTripRecord::new((i + 1).to_string(), *title))
                .await
                .expect("trip stored");
        }
    }

    /// Rows currently in the remote trips table.
    #[must_use]
    pub fn remote_trips(&self) -> Vec<serde_json::Value> {
        self.remote.rows(&self.state.migrator().options().table)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
