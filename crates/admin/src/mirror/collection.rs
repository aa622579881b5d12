//! Typed record collections stored under one mirror key.

use std::marker::PhantomData;

use serde_json::Value as JsonValue;
use trekbase_core::Record;

use super::{LocalMirror, MirrorError};

/// A JSON array of `T` stored under a fixed mirror key.
///
/// Reads never fail. A missing key, or a value that is not a JSON array,
/// reads as an empty collection. Elements that do not convert to `T` are
/// skipped on read and logged, and writes leave them in place.
pub struct Collection<T> {
    mirror: LocalMirror,
    key: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            mirror: self.mirror.clone(),
            key: self.key,
            _record: PhantomData,
        }
    }
}

/// A stored element that did not convert to the collection's record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position in the stored array.
    pub index: usize,
    /// Id read from the raw element, when it has one.
    pub id: Option<String>,
    pub error: String,
}

impl SkippedRecord {
    /// `"7"` or `"#2"` when the element has no readable id.
    #[must_use]
    pub fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

/// Result of reading a collection with its unreadable elements.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T: Record> Collection<T> {
    /// Collection over `key` in `mirror`.
    #[must_use]
    pub const fn new(mirror: LocalMirror, key: &'static str) -> Self {
        Self {
            mirror,
            key,
            _record: PhantomData,
        }
    }

    /// The mirror key backing this collection.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// All readable records, in stored order.
    pub async fn list(&self) -> Vec<T> {
        self.load().await.records
    }

    /// Readable records plus the elements that were skipped.
    pub async fn load(&self) -> Loaded<T> {
        let raw = self.mirror.get(self.key).await;
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for (index, value) in parse_elements(self.key, raw.as_deref())
            .into_iter()
            .enumerate()
        {
            let id = T::raw_id(&value);
            match serde_json::from_value::<T>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(key = self.key, index, id = ?id, error = %e, "Skipping unreadable record");
                    skipped.push(SkippedRecord {
                        index,
                        id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Loaded { records, skipped }
    }

    /// The record with `id`, if present and readable.
    pub async fn get(&self, id: &str) -> Option<T> {
        self.list().await.into_iter().find(|r| r.record_id() == id)
    }

    /// Replace the element with the same id, or append the record.
    ///
    /// An unreadable element with the same id is replaced too.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized or persisted.
    pub async fn upsert(&self, record: T) -> Result<(), MirrorError> {
        let key = self.key;
        self.mirror
            .update(key, move |raw| {
                let mut elements = parse_elements(key, raw);
                let value = serde_json::to_value(&record)?;
                match elements
                    .iter_mut()
                    .find(|e| T::raw_id(e).as_deref() == Some(record.record_id()))
                {
                    Some(existing) => *existing = value,
                    None => elements.push(value),
                }
                Ok(Some(serde_json::to_string(&elements)?))
            })
            .await
    }

    /// Append `record` and drop the oldest elements beyond `max`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized or persisted.
    pub async fn append_capped(&self, record: T, max: usize) -> Result<(), MirrorError> {
        let key = self.key;
        self.mirror
            .update(key, move |raw| {
                let mut elements = parse_elements(key, raw);
                elements.push(serde_json::to_value(&record)?);
                let excess = elements.len().saturating_sub(max);
                if excess > 0 {
                    elements.drain(..excess);
                    tracing::debug!(key, dropped = excess, "Trimmed capped collection");
                }
                Ok(Some(serde_json::to_string(&elements)?))
            })
            .await
    }

    /// Remove every element with `id`. Removing a missing id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized or persisted.
    pub async fn remove(&self, id: &str) -> Result<(), MirrorError> {
        let key = self.key;
        self.mirror
            .update(key, move |raw| {
                let mut elements = parse_elements(key, raw);
                elements.retain(|e| T::raw_id(e).as_deref() != Some(id));
                Ok(Some(serde_json::to_string(&elements)?))
            })
            .await
    }

    /// Replace the whole collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be serialized or persisted.
    pub async fn replace_all(&self, records: Vec<T>) -> Result<(), MirrorError> {
        let json = serde_json::to_string(&records)?;
        self.mirror.set(self.key, json).await
    }

    /// Delete the key outright.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror cannot be persisted.
    pub async fn clear_all(&self) -> Result<(), MirrorError> {
        self.mirror.remove(self.key).await
    }
}

/// Raw array elements; anything but a JSON array reads as empty.
fn parse_elements(key: &str, raw: Option<&str>) -> Vec<JsonValue> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(elements)) => elements,
        Ok(_) => {
            tracing::warn!(key, "Stored collection is not an array, treating as empty");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored collection is malformed, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trekbase_core::{LocalTripRecord, TripRating};

    use super::*;
    use crate::mirror::keys;

    fn trips(mirror: &LocalMirror) -> Collection<LocalTripRecord> {
        Collection::new(mirror.clone(), keys::ADMIN_TRIPS)
    }

    #[tokio::test]
    async fn test_missing_key_lists_empty() {
        let mirror = LocalMirror::in_memory();
        assert!(trips(&mirror).list().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_then_list_contains_record_once() {
        let mirror = LocalMirror::in_memory();
        let trips = trips(&mirror);
        let trip = LocalTripRecord::new("1", "Kedarkantha");

        trips.upsert(trip.clone()).await.unwrap();
        let listed = trips.list().await;
        assert_eq!(listed, vec![trip]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id_in_place() {
        let mirror = LocalMirror::in_memory();
        let trips = trips(&mirror);
        trips.upsert(LocalTripRecord::new("1", "A")).await.unwrap();
        trips.upsert(LocalTripRecord::new("2", "B")).await.unwrap();
        trips.upsert(LocalTripRecord::new("1", "A2")).await.unwrap();

        let titles: Vec<String> = trips.list().await.into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["A2", "B"]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let mirror = LocalMirror::in_memory();
        let trips = trips(&mirror);
        trips.upsert(LocalTripRecord::new("1", "A")).await.unwrap();
        trips.upsert(LocalTripRecord::new("2", "B")).await.unwrap();

        trips.remove("1").await.unwrap();
        let once = trips.list().await;
        trips.remove("1").await.unwrap();
        assert_eq!(trips.list().await, once);
        assert_eq!(once.len(), 1);

        trips.remove("does-not-exist").await.unwrap();
        assert_eq!(trips.list().await, once);
    }

    #[tokio::test]
    async fn test_truncated_json_lists_empty() {
        let mirror = LocalMirror::in_memory();
        let trips = trips(&mirror);
        trips.upsert(LocalTripRecord::new("1", "A")).await.unwrap();

        let stored = mirror.get(keys::ADMIN_TRIPS).await.unwrap();
        let truncated = &stored[..stored.len() / 2];
        mirror.set(keys::ADMIN_TRIPS, truncated).await.unwrap();

        assert!(trips.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_over_malformed_value_starts_fresh() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::ADMIN_TRIPS, "not json").await.unwrap();

        let trips = trips(&mirror);
        trips.upsert(LocalTripRecord::new("9", "Fresh")).await.unwrap();
        assert_eq!(trips.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_deletes_key() {
        let mirror = LocalMirror::in_memory();
        let trips = trips(&mirror);
        trips.upsert(LocalTripRecord::new("1", "A")).await.unwrap();

        trips.clear_all().await.unwrap();
        assert_eq!(mirror.get(keys::ADMIN_TRIPS).await, None);
        assert!(trips.list().await.is_empty());
    }

    const MIXED: &str = r#"[{"id":1,"title":"Roopkund","duration":"8 Days"},{"id":2,"title":"Brahmatal","duration":6}]"#;

    #[tokio::test]
    async fn test_one_unreadable_element_does_not_hide_the_rest() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::ADMIN_TRIPS, MIXED).await.unwrap();
        let trips = trips(&mirror);

        let loaded = trips.load().await;
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].title, "Roopkund");
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].index, 1);
        assert_eq!(loaded.skipped[0].label(), "2");
    }

    #[tokio::test]
    async fn test_writes_keep_unreadable_elements() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::ADMIN_TRIPS, MIXED).await.unwrap();
        let trips = trips(&mirror);

        trips.upsert(LocalTripRecord::new("3", "Kuari")).await.unwrap();
        trips.remove("1").await.unwrap();

        let stored: JsonValue =
            serde_json::from_str(&mirror.get(keys::ADMIN_TRIPS).await.unwrap()).unwrap();
        assert_eq!(
            stored,
            serde_json::json!([
                {"id": 2, "title": "Brahmatal", "duration": 6},
                {"id": "3", "title": "Kuari"}
            ])
        );
    }

    #[tokio::test]
    async fn test_upsert_replaces_unreadable_element_with_same_id() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::ADMIN_TRIPS, MIXED).await.unwrap();
        let trips = trips(&mirror);

        let mut fixed = LocalTripRecord::new("2", "Brahmatal");
        fixed.duration = Some("6 Days".to_owned());
        trips.upsert(fixed).await.unwrap();

        let loaded = trips.load().await;
        assert_eq!(loaded.records.len(), 2);
        assert!(loaded.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_non_array_value_lists_empty() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::ADMIN_TRIPS, r#"{"id":"1"}"#).await.unwrap();
        assert!(trips(&mirror).list().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_capped_keeps_newest() {
        let mirror = LocalMirror::in_memory();
        let ratings: Collection<TripRating> = Collection::new(mirror.clone(), keys::TRIP_RATINGS);

        for i in 0..5 {
            ratings
                .append_capped(
                    TripRating {
                        trip_id: i.to_string().into(),
                        average: 4.0,
                        count: 1,
                    },
                    3,
                )
                .await
                .unwrap();
        }

        let ids: Vec<String> = ratings
            .list()
            .await
            .into_iter()
            .map(|r| r.trip_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_every_record() {
        let mirror = LocalMirror::in_memory();
        let ratings: Collection<TripRating> = Collection::new(mirror.clone(), keys::TRIP_RATINGS);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let ratings = ratings.clone();
                tokio::spawn(async move {
                    ratings
                        .upsert(TripRating {
                            trip_id: i.to_string().into(),
                            average: 4.0,
                            count: 1,
                        })
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ratings.list().await.len(), 20);
    }
}
