//! Integration tests for the file-backed local mirror.

#![allow(clippy::unwrap_used)]

use trekbase_admin::mirror::{Collection, LocalMirror, keys};
use trekbase_core::{CustomerReview, LocalTripRecord, Price};
use trekbase_integration_tests::TestContext;

#[tokio::test]
async fn test_trips_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("mirror.json");

    let mirror = LocalMirror::open(&path).await.unwrap();
    let trips = Collection::<LocalTripRecord>::new(mirror, keys::ADMIN_TRIPS);
    let mut trek = LocalTripRecord::new("kedar", "Kedarkantha");
    trek.base_price = Some(Price::from_units(8500));
    trips.upsert(trek.clone()).await.unwrap();

    let reopened = LocalMirror::open(&path).await.unwrap();
    let trips = Collection::<LocalTripRecord>::new(reopened, keys::ADMIN_TRIPS);
    assert_eq!(trips.list().await, vec![trek]);
}

#[tokio::test]
async fn test_truncated_file_opens_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.json");
    tokio::fs::write(&path, br#"{"adminTrips": "[{\"id\":"#)
        .await
        .unwrap();

    let mirror = LocalMirror::open(&path).await.unwrap();
    assert!(mirror.keys().await.is_empty());

    mirror.set(keys::IS_ADMIN, "false").await.unwrap();
    let reopened = LocalMirror::open(&path).await.unwrap();
    assert_eq!(reopened.get(keys::IS_ADMIN).await.as_deref(), Some("false"));
}

#[tokio::test]
async fn test_malformed_collection_value_reads_as_empty() {
    let mirror = LocalMirror::in_memory();
    mirror.set(keys::CUSTOMER_REVIEWS, "not json").await.unwrap();

    let reviews = Collection::<CustomerReview>::new(mirror, keys::CUSTOMER_REVIEWS);
    assert!(reviews.list().await.is_empty());
}

#[tokio::test]
async fn test_upsert_replaces_and_remove_is_idempotent() {
    let ctx = TestContext::new();
    ctx.seed_trips(&["Brahmatal", "Dayara Bugyal"]).await;

    let mut renamed = ctx.state.trips().get("1").await.unwrap();
    renamed.title = "Brahmatal Winter".to_owned();
    ctx.state.trips().upsert(renamed).await.unwrap();

    let trips = ctx.state.trips().list().await;
    assert_eq!(trips.len(), 2);
    assert_eq!(trips[0].title, "Brahmatal Winter");

    ctx.state.trips().remove("2").await.unwrap();
    ctx.state.trips().remove("2").await.unwrap();
    assert_eq!(ctx.state.trips().list().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_trip_fields_survive_rewrite() {
    let mirror = LocalMirror::in_memory();
    mirror
        .set(
            keys::ADMIN_TRIPS,
            r#"[{"id":"7","title":"Chadar","season":"winter"}]"#,
        )
        .await
        .unwrap();
    let trips = Collection::<LocalTripRecord>::new(mirror.clone(), keys::ADMIN_TRIPS);

    let mut trek = trips.get("7").await.unwrap();
    trek.duration = Some("9 Days".to_owned());
    trips.upsert(trek).await.unwrap();

    let raw = mirror.get(keys::ADMIN_TRIPS).await.unwrap();
    assert!(raw.contains("\"season\":\"winter\""));
    assert!(raw.contains("9 Days"));
}

#[tokio::test]
async fn test_editing_next_to_unreadable_trip_keeps_it_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.json");
    let mirror = LocalMirror::open(&path).await.unwrap();
    mirror
        .set(
            keys::ADMIN_TRIPS,
            r#"[{"id":"1","title":"Roopkund","duration":8},{"id":"2","title":"Ali Bedni"}]"#,
        )
        .await
        .unwrap();
    let trips = Collection::<LocalTripRecord>::new(mirror, keys::ADMIN_TRIPS);

    let loaded = trips.load().await;
    assert_eq!(loaded.records.len(), 1);
    assert_eq!(loaded.skipped.len(), 1);
    assert_eq!(loaded.skipped[0].label(), "1");

    trips.upsert(LocalTripRecord::new("3", "Bagini")).await.unwrap();

    let reopened = LocalMirror::open(&path).await.unwrap();
    let raw = reopened.get(keys::ADMIN_TRIPS).await.unwrap();
    assert!(raw.contains("Roopkund"));
    assert!(raw.contains("Bagini"));
}
