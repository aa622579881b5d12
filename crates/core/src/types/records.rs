//! Record shapes of the mirror's parallel collections.
//!
//! Reviews, ratings, group-size overrides, featured-trip ordering and
//! analytics events are all small JSON records keyed by id (or by trip id
//! where there is at most one record per trip).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::id::{EventId, ReviewId, TripId};
use super::record::Record;

/// A customer review of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReview {
    pub id: ReviewId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<TripId>,
    #[serde(default)]
    pub name: String,
    /// 1 to 5 stars.
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Record for CustomerReview {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Aggregate star rating shown on a trip card. One per trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRating {
    pub trip_id: TripId,
    pub average: f64,
    #[serde(default)]
    pub count: u32,
}

impl Record for TripRating {
    const ID_FIELD: &'static str = "tripId";

    fn record_id(&self) -> &str {
        self.trip_id.as_str()
    }
}

/// Group-size limits that override a trip's defaults. One per trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSizeOverride {
    pub trip_id: TripId,
    pub min: u32,
    pub max: u32,
}

impl Record for GroupSizeOverride {
    const ID_FIELD: &'static str = "tripId";

    fn record_id(&self) -> &str {
        self.trip_id.as_str()
    }
}

/// Position of a trip on the home page's featured strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedTrip {
    pub trip_id: TripId,
    pub position: u32,
}

impl Record for FeaturedTrip {
    const ID_FIELD: &'static str = "tripId";

    fn record_id(&self) -> &str {
        self.trip_id.as_str()
    }
}

/// A client-side analytics event (page view, booking click, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: EventId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<TripId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, JsonValue>,
}

impl AnalyticsEvent {
    /// A new event stamped with a fresh id and the current time.
    #[must_use]
    pub fn now(name: impl Into<String>, trip_id: Option<TripId>) -> Self {
        Self {
            id: EventId::generate(),
            name: name.into(),
            trip_id,
            timestamp: Utc::now(),
            properties: Map::new(),
        }
    }
}

impl Record for AnalyticsEvent {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_keyed_by_trip() {
        let rating: TripRating =
            serde_json::from_str(r#"{"tripId": 9, "average": 4.6, "count": 31}"#).unwrap();
        assert_eq!(rating.record_id(), "9");
    }

    #[test]
    fn test_review_preserves_extra_fields() {
        let json = r#"{"id": "r1", "name": "Asha", "rating": 5, "comment": "Loved it", "avatar": "a.png"}"#;
        let review: CustomerReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.extra["avatar"], "a.png");
        assert!(review.trip_id.is_none());
    }

    #[test]
    fn test_event_now_has_unique_id() {
        let a = AnalyticsEvent::now("page_view", None);
        let b = AnalyticsEvent::now("page_view", None);
        assert_ne!(a.record_id(), b.record_id());
    }
}
