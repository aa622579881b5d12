//! One-shot copy of the mirror's trips into the remote store.
//!
//! A run clears the remote trips table, then inserts every local trip in
//! order, one insert per record with a fixed pause in between. Nothing here
//! returns an error: every remote failure is folded into the returned
//! [`MigrationResult`], [`ClearOutcome`] or [`VerifyReport`].
//!
//! The clear and the inserts are separate requests. If the clear fails the
//! run still inserts, so existing remote rows are kept and may be
//! duplicated by the new ones.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};
use trekbase_core::{
    ClearOutcome, LocalTripRecord, MigrationResult, RemoteTripRecord, SuccessPolicy, VerifyReport,
};

use crate::mirror::Collection;
use crate::remote::{Filter, RemoteStore};

/// Id that no remote row carries. Deleting `id <> CLEAR_SENTINEL_ID`
/// deletes every row, since the store refuses unfiltered deletes.
pub const CLEAR_SENTINEL_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Tuning for a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Remote table receiving the trips.
    pub table: String,
    /// Pause between two inserts.
    pub delay: Duration,
    pub success_policy: SuccessPolicy,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            table: "trips".to_owned(),
            delay: Duration::from_millis(100),
            success_policy: SuccessPolicy::AnyMigrated,
        }
    }
}

/// Runs migrations from a trips collection into a remote store.
#[derive(Clone)]
pub struct Migrator {
    remote: Arc<dyn RemoteStore>,
    trips: Collection<LocalTripRecord>,
    options: MigrationOptions,
}

impl Migrator {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        trips: Collection<LocalTripRecord>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            remote,
            trips,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Copy every local trip into the remote table.
    ///
    /// With no local trips this returns a successful empty result without
    /// touching the remote store. Stored trips that cannot be read are not
    /// migrated and each one is reported in `errors`; if none can be read
    /// the remote store is left alone.
    #[instrument(skip(self), fields(table = %self.options.table))]
    pub async fn migrate(&self) -> MigrationResult {
        let loaded = self.trips.load().await;
        if loaded.records.is_empty() && loaded.skipped.is_empty() {
            info!("No local trips to migrate");
            return MigrationResult::nothing_to_migrate();
        }

        let mut result = MigrationResult::default();
        for skipped in &loaded.skipped {
            warn!(trip = %skipped.label(), error = %skipped.error, "Unreadable local trip not migrated");
            result.errors.push(format!(
                "Skipped unreadable local trip {}: {}",
                skipped.label(),
                skipped.error
            ));
        }

        let local = loaded.records;
        if local.is_empty() {
            warn!(skipped = result.errors.len(), "No readable local trips, remote left untouched");
            result.finish(self.options.success_policy);
            return result;
        }

        let table = self.options.table.as_str();
        info!(count = local.len(), skipped = loaded.skipped.len(), "Starting trip migration");

        match self
            .remote
            .delete(table, &Filter::neq("id", CLEAR_SENTINEL_ID))
            .await
        {
            Ok(()) => result
                .details
                .push(format!("Cleared existing rows from {table}")),
            Err(e) => {
                warn!(error = %e, "Could not clear remote trips, continuing");
                result
                    .errors
                    .push(format!("Failed to clear existing trips: {e}"));
            }
        }

        let total = local.len();
        for (index, trip) in local.iter().enumerate() {
            let position = index + 1;
            let row = RemoteTripRecord::from_local(trip, position, Utc::now());

            match self.insert_row(table, &row).await {
                Ok(()) => {
                    result.migrated += 1;
                    result
                        .details
                        .push(format!("Migrated \"{}\" as {}", trip.title, row.slug));
                    info!(position, slug = %row.slug, "Trip migrated");
                }
                Err(message) => {
                    warn!(position, title = %trip.title, error = %message, "Trip migration failed");
                    result
                        .errors
                        .push(format!("Failed to migrate \"{}\": {message}", trip.title));
                }
            }

            if position < total && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        result.finish(self.options.success_policy);
        info!(
            migrated = result.migrated,
            errors = result.errors.len(),
            success = result.success,
            "Trip migration finished"
        );
        result
    }

    async fn insert_row(&self, table: &str, row: &RemoteTripRecord) -> Result<(), String> {
        let value = serde_json::to_value(row).map_err(|e| e.to_string())?;
        self.remote
            .insert(table, vec![value])
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Delete every row of the remote trips table.
    #[instrument(skip(self), fields(table = %self.options.table))]
    pub async fn clear_remote(&self) -> ClearOutcome {
        let table = self.options.table.as_str();
        match self
            .remote
            .delete(table, &Filter::neq("id", CLEAR_SENTINEL_ID))
            .await
        {
            Ok(()) => {
                info!("Remote trips cleared");
                ClearOutcome {
                    success: true,
                    message: format!("All rows deleted from {table}"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Clearing remote trips failed");
                ClearOutcome {
                    success: false,
                    message: format!("Failed to clear {table}: {e}"),
                }
            }
        }
    }

    /// Compare the number of local trips with the number of remote rows.
    ///
    /// Equal counts do not mean equal content. Unreadable local trips are
    /// counted, since they are stored but were never migrated.
    #[instrument(skip(self), fields(table = %self.options.table))]
    pub async fn verify(&self) -> VerifyReport {
        let loaded = self.trips.load().await;
        let local_count = loaded.records.len() + loaded.skipped.len();
        match self.remote.count(&self.options.table).await {
            Ok(remote_count) => {
                let report = VerifyReport::compare(local_count, remote_count);
                info!(local_count, remote_count, matches = report.matches, "Verified migration");
                report
            }
            Err(e) => {
                warn!(error = %e, "Remote count failed");
                VerifyReport::remote_unavailable(local_count, &e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mirror::{LocalMirror, keys};
    use crate::remote::MemoryRemoteStore;

    fn setup(
        options: MigrationOptions,
    ) -> (Arc<MemoryRemoteStore>, Collection<LocalTripRecord>, Migrator) {
        let remote = Arc::new(MemoryRemoteStore::new());
        let trips = Collection::new(LocalMirror::in_memory(), keys::ADMIN_TRIPS);
        let migrator = Migrator::new(remote.clone(), trips.clone(), options);
        (remote, trips, migrator)
    }

    fn fast() -> MigrationOptions {
        MigrationOptions {
            delay: Duration::ZERO,
            ..MigrationOptions::default()
        }
    }

    #[tokio::test]
    async fn test_empty_mirror_makes_no_remote_calls() {
        let (remote, _, migrator) = setup(fast());
        let result = migrator.migrate().await;

        assert!(result.success);
        assert_eq!(result.migrated, 0);
        assert_eq!(remote.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_migrates_in_order_with_positional_slugs() {
        let (remote, trips, migrator) = setup(fast());
        trips.upsert(LocalTripRecord::new("a", "Hampta Pass")).await.unwrap();
        trips.upsert(LocalTripRecord::new("b", "Hampta Pass")).await.unwrap();

        let result = migrator.migrate().await;
        assert!(result.success);
        assert_eq!(result.migrated, 2);

        let rows = remote.rows("trips");
        assert_eq!(rows[0]["slug"], json!("hampta-pass-1"));
        assert_eq!(rows[1]["slug"], json!("hampta-pass-2"));
        assert_eq!(rows[0]["base_price"], json!(1000));
        assert_eq!(rows[0]["duration"], json!("1 Day"));
        assert_eq!(rows[0]["is_active"], json!(true));
    }

    #[tokio::test]
    async fn test_replaces_existing_remote_rows() {
        let (remote, trips, migrator) = setup(fast());
        remote.seed("trips", [json!({"id": 90, "slug": "old-1"})]);
        trips.upsert(LocalTripRecord::new("a", "Valley of Flowers")).await.unwrap();

        migrator.migrate().await;
        assert_eq!(remote.rows("trips").len(), 1);
        assert_eq!(remote.calls().delete, 1);
    }

    #[tokio::test]
    async fn test_failed_record_is_reported_and_skipped() {
        let (remote, trips, migrator) = setup(fast());
        for (id, title) in [("1", "Roopkund"), ("2", "Brahmatal"), ("3", "Kuari Pass")] {
            trips.upsert(LocalTripRecord::new(id, title)).await.unwrap();
        }
        remote.fail_insert_for_title("Brahmatal");

        let result = migrator.migrate().await;
        assert!(result.success);
        assert_eq!(result.migrated, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Failed to migrate \"Brahmatal\""));
    }

    #[tokio::test]
    async fn test_strict_policy_fails_on_any_error() {
        let (remote, trips, migrator) = setup(MigrationOptions {
            success_policy: SuccessPolicy::NoErrors,
            ..fast()
        });
        trips.upsert(LocalTripRecord::new("1", "Roopkund")).await.unwrap();
        trips.upsert(LocalTripRecord::new("2", "Brahmatal")).await.unwrap();
        remote.fail_insert_for_title("Roopkund");

        let result = migrator.migrate().await;
        assert!(!result.success);
        assert_eq!(result.migrated, 1);
    }

    #[tokio::test]
    async fn test_clear_failure_does_not_abort_run() {
        let (remote, trips, migrator) = setup(fast());
        trips.upsert(LocalTripRecord::new("1", "Sandakphu")).await.unwrap();
        remote.fail_delete("permission denied");

        let result = migrator.migrate().await;
        assert!(result.success);
        assert_eq!(result.migrated, 1);
        assert!(result.errors[0].contains("permission denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_between_records_only() {
        let (_, trips, migrator) = setup(MigrationOptions::default());
        for id in ["1", "2", "3"] {
            trips.upsert(LocalTripRecord::new(id, id)).await.unwrap();
        }

        let started = tokio::time::Instant::now();
        migrator.migrate().await;
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_clear_remote_reports_outcome() {
        let (remote, _, migrator) = setup(fast());
        remote.seed("trips", [json!({"id": 1}), json!({"id": 2})]);

        let outcome = migrator.clear_remote().await;
        assert!(outcome.success);
        assert!(remote.rows("trips").is_empty());

        remote.fail_delete("offline");
        let outcome = migrator.clear_remote().await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("offline"));
    }

    #[tokio::test]
    async fn test_verify_compares_counts_only() {
        let (remote, trips, migrator) = setup(fast());
        trips.upsert(LocalTripRecord::new("1", "Chadar")).await.unwrap();
        remote.seed("trips", [json!({"id": 7, "title": "Something else"})]);

        let report = migrator.verify().await;
        assert!(report.matches);
        assert_eq!(report.remote_count, Some(1));

        remote.fail_count("unreachable");
        let report = migrator.verify().await;
        assert!(!report.matches);
        assert_eq!(report.remote_count, None);
    }

    const MIXED_TRIPS: &str = r#"[{"id":1,"title":"Roopkund","duration":"8 Days"},{"id":2,"title":"Brahmatal","duration":6}]"#;

    async fn setup_raw(raw: &str) -> (Arc<MemoryRemoteStore>, LocalMirror, Migrator) {
        let mirror = LocalMirror::in_memory();
        let remote = Arc::new(MemoryRemoteStore::new());
        let migrator = Migrator::new(
            remote.clone(),
            Collection::new(mirror.clone(), keys::ADMIN_TRIPS),
            fast(),
        );
        mirror.set(keys::ADMIN_TRIPS, raw).await.unwrap();
        (remote, mirror, migrator)
    }

    #[tokio::test]
    async fn test_unreadable_trip_is_reported_not_dropped() {
        let (remote, mirror, migrator) = setup_raw(MIXED_TRIPS).await;

        let result = migrator.migrate().await;
        assert_eq!(result.migrated, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Skipped unreadable local trip 2:"));
        assert_eq!(remote.rows("trips").len(), 1);

        let stored = mirror.get(keys::ADMIN_TRIPS).await.unwrap();
        assert!(stored.contains("Brahmatal"));
    }

    #[tokio::test]
    async fn test_only_unreadable_trips_leaves_remote_alone() {
        let (remote, _, migrator) = setup_raw(r#"[{"id":2,"title":"Brahmatal","duration":6}]"#).await;

        let result = migrator.migrate().await;
        assert!(!result.success);
        assert_eq!(result.migrated, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(remote.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_verify_counts_unreadable_trips() {
        let (remote, _, migrator) = setup_raw(MIXED_TRIPS).await;
        remote.seed("trips", [json!({"id": 1})]);

        let report = migrator.verify().await;
        assert_eq!(report.local_count, 2);
        assert!(!report.matches);
    }
}
