//! Application state shared across handlers.

use std::sync::Arc;

use trekbase_core::{
    AnalyticsEvent, CustomerReview, FeaturedTrip, GroupSizeOverride, LocalTripRecord, TripRating,
};

use crate::migration::{MigrationOptions, Migrator};
use crate::mirror::{Collection, LocalMirror, keys};
use crate::remote::RemoteStore;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    mirror: LocalMirror,
    session: SessionStore,
    remote: Arc<dyn RemoteStore>,
    migrator: Migrator,
    max_analytics_events: usize,
}

impl AppState {
    /// Build the state. The session starts out loading until
    /// [`SessionStore::start`] or [`SessionStore::refresh`] runs.
    ///
    /// At most `max_analytics_events` analytics events are kept.
    #[must_use]
    pub fn new(
        mirror: LocalMirror,
        remote: Arc<dyn RemoteStore>,
        migration: MigrationOptions,
        max_analytics_events: usize,
    ) -> Self {
        let session = SessionStore::new(mirror.clone());
        let trips = Collection::new(mirror.clone(), keys::ADMIN_TRIPS);
        let migrator = Migrator::new(Arc::clone(&remote), trips, migration);

        Self {
            inner: Arc::new(AppStateInner {
                mirror,
                session,
                remote,
                migrator,
                max_analytics_events,
            }),
        }
    }

    #[must_use]
    pub fn mirror(&self) -> &LocalMirror {
        &self.inner.mirror
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.inner.remote
    }

    #[must_use]
    pub fn migrator(&self) -> &Migrator {
        &self.inner.migrator
    }

    #[must_use]
    pub fn max_analytics_events(&self) -> usize {
        self.inner.max_analytics_events
    }

    /// Trips edited in the admin panel.
    #[must_use]
    pub fn trips(&self) -> Collection<LocalTripRecord> {
        Collection::new(self.inner.mirror.clone(), keys::ADMIN_TRIPS)
    }

    #[must_use]
    pub fn reviews(&self) -> Collection<CustomerReview> {
        Collection::new(self.inner.mirror.clone(), keys::CUSTOMER_REVIEWS)
    }

    #[must_use]
    pub fn ratings(&self) -> Collection<TripRating> {
        Collection::new(self.inner.mirror.clone(), keys::TRIP_RATINGS)
    }

    #[must_use]
    pub fn group_sizes(&self) -> Collection<GroupSizeOverride> {
        Collection::new(self.inner.mirror.clone(), keys::GROUP_SIZES)
    }

    #[must_use]
    pub fn featured(&self) -> Collection<FeaturedTrip> {
        Collection::new(self.inner.mirror.clone(), keys::FEATURED_TRIPS)
    }

    #[must_use]
    pub fn analytics(&self) -> Collection<AnalyticsEvent> {
        Collection::new(self.inner.mirror.clone(), keys::ANALYTICS_EVENTS)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("mirror", &self.inner.mirror.path())
            .field("migrator", &self.inner.migrator)
            .field("max_analytics_events", &self.inner.max_analytics_events)
            .finish_non_exhaustive()
    }
}
