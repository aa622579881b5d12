//! Mirror inspection commands.
//!
//! # Usage
//!
//! ```bash
//! tb-cli trips list
//! tb-cli trips list --collection featured_trips
//! ```

use serde_json::Value as JsonValue;
use trekbase_admin::mirror::{Collection, LocalMirror, keys};
use trekbase_core::{
    AnalyticsEvent, CustomerReview, FeaturedTrip, GroupSizeOverride, LocalTripRecord, Record,
    TripRating,
};

use super::{CommandError, open_mirror, print_json};

/// Print every record of `collection`.
///
/// # Errors
///
/// Returns an error for an unknown collection key or if output fails.
pub async fn list(collection: &str) -> Result<(), CommandError> {
    let mirror = open_mirror().await?;

    let records = match collection {
        keys::ADMIN_TRIPS => list_as::<LocalTripRecord>(&mirror, keys::ADMIN_TRIPS).await?,
        keys::TRIPS => list_as::<LocalTripRecord>(&mirror, keys::TRIPS).await?,
        keys::CUSTOMER_REVIEWS => list_as::<CustomerReview>(&mirror, keys::CUSTOMER_REVIEWS).await?,
        keys::TRIP_RATINGS => list_as::<TripRating>(&mirror, keys::TRIP_RATINGS).await?,
        keys::GROUP_SIZES => list_as::<GroupSizeOverride>(&mirror, keys::GROUP_SIZES).await?,
        keys::FEATURED_TRIPS => list_as::<FeaturedTrip>(&mirror, keys::FEATURED_TRIPS).await?,
        keys::ANALYTICS_EVENTS => {
            list_as::<AnalyticsEvent>(&mirror, keys::ANALYTICS_EVENTS).await?
        }
        other => {
            return Err(CommandError::Failed(format!(
                "unknown collection '{other}', expected one of: {}",
                keys::COLLECTIONS.join(", ")
            )));
        }
    };

    tracing::info!(collection, count = records.len(), "Listed collection");
    print_json(&records)
}

async fn list_as<T: Record>(
    mirror: &LocalMirror,
    key: &'static str,
) -> Result<Vec<JsonValue>, CommandError> {
    let records = Collection::<T>::new(mirror.clone(), key).list().await;
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(CommandError::from))
        .collect()
}
