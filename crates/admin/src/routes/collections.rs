//! Handlers for the mirror's parallel collections: reviews, ratings,
//! featured trips, group sizes and analytics events.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use trekbase_core::{
    AnalyticsEvent, CustomerReview, FeaturedTrip, GroupSizeOverride, TripId, TripRating,
};

use crate::{
    error::AppError,
    middleware::{CanDelete, CanManageTrips, CanViewAnalytics, CanWrite, RequirePermission},
    state::AppState,
};

/// Build the collections router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_reviews).post(save_review))
        .route("/api/reviews/{id}", delete(remove_review))
        .route("/api/ratings", get(list_ratings).post(save_rating))
        .route("/api/featured", get(list_featured).put(replace_featured))
        .route("/api/group-sizes", get(list_group_sizes))
        .route("/api/group-sizes/{trip_id}", put(save_group_size))
        .route(
            "/api/analytics/events",
            get(list_events).post(record_event),
        )
}

// =============================================================================
// Reviews
// =============================================================================

pub async fn list_reviews(State(state): State<AppState>) -> Json<Vec<CustomerReview>> {
    Json(state.reviews().list().await)
}

/// Insert or replace a review.
///
/// # Errors
///
/// Returns `BadRequest` for a rating outside 1 to 5.
pub async fn save_review(
    _: RequirePermission<CanWrite>,
    State(state): State<AppState>,
    Json(review): Json<CustomerReview>,
) -> Result<(StatusCode, Json<CustomerReview>), AppError> {
    if !(1..=5).contains(&review.rating) {
        return Err(AppError::BadRequest(format!(
            "rating must be between 1 and 5, got {}",
            review.rating
        )));
    }

    state.reviews().upsert(review.clone()).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Remove a review.
///
/// # Errors
///
/// Returns an error if the mirror cannot be written.
pub async fn remove_review(
    _: RequirePermission<CanDelete>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.reviews().remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Ratings
// =============================================================================

pub async fn list_ratings(State(state): State<AppState>) -> Json<Vec<TripRating>> {
    Json(state.ratings().list().await)
}

/// Set the aggregate rating of a trip.
///
/// # Errors
///
/// Returns `BadRequest` for an average outside 0 to 5.
pub async fn save_rating(
    _: RequirePermission<CanWrite>,
    State(state): State<AppState>,
    Json(rating): Json<TripRating>,
) -> Result<Json<TripRating>, AppError> {
    if !(0.0..=5.0).contains(&rating.average) {
        return Err(AppError::BadRequest(format!(
            "average must be between 0 and 5, got {}",
            rating.average
        )));
    }

    state.ratings().upsert(rating.clone()).await?;
    Ok(Json(rating))
}

// =============================================================================
// Featured trips
// =============================================================================

/// Featured trips, ordered by position.
pub async fn list_featured(State(state): State<AppState>) -> Json<Vec<FeaturedTrip>> {
    let mut featured = state.featured().list().await;
    featured.sort_by_key(|f| f.position);
    Json(featured)
}

/// Replace the featured strip.
///
/// # Errors
///
/// Returns `BadRequest` if a trip appears twice.
pub async fn replace_featured(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
    Json(mut featured): Json<Vec<FeaturedTrip>>,
) -> Result<Json<Vec<FeaturedTrip>>, AppError> {
    featured.sort_by_key(|f| f.position);
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = featured.iter().find(|f| !seen.insert(f.trip_id.clone())) {
        return Err(AppError::BadRequest(format!(
            "trip {} is featured more than once",
            dup.trip_id
        )));
    }

    state.featured().replace_all(featured.clone()).await?;
    Ok(Json(featured))
}

// =============================================================================
// Group sizes
// =============================================================================

pub async fn list_group_sizes(State(state): State<AppState>) -> Json<Vec<GroupSizeOverride>> {
    Json(state.group_sizes().list().await)
}

/// Set the group-size limits of one trip.
///
/// # Errors
///
/// Returns `BadRequest` if the body names another trip or `min > max`.
pub async fn save_group_size(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Json(limits): Json<GroupSizeOverride>,
) -> Result<Json<GroupSizeOverride>, AppError> {
    if limits.trip_id.as_str() != trip_id {
        return Err(AppError::BadRequest(format!(
            "trip id {} does not match path id {trip_id}",
            limits.trip_id
        )));
    }
    if limits.min > limits.max {
        return Err(AppError::BadRequest(format!(
            "min ({}) exceeds max ({})",
            limits.min, limits.max
        )));
    }

    state.group_sizes().upsert(limits.clone()).await?;
    Ok(Json(limits))
}

// =============================================================================
// Analytics
// =============================================================================

/// Event posted by the booking site.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub trip_id: Option<TripId>,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

/// Record an analytics event. Open to every visitor; only the newest
/// events up to the configured cap are kept.
///
/// # Errors
///
/// Returns `BadRequest` for an empty name.
pub async fn record_event(
    State(state): State<AppState>,
    Json(event): Json<NewEvent>,
) -> Result<(StatusCode, Json<AnalyticsEvent>), AppError> {
    if event.name.trim().is_empty() {
        return Err(AppError::BadRequest("event name is required".to_string()));
    }

    let mut stored = AnalyticsEvent::now(event.name, event.trip_id);
    stored.properties = event.properties;
    state
        .analytics()
        .append_capped(stored.clone(), state.max_analytics_events())
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_events(
    _: RequirePermission<CanViewAnalytics>,
    State(state): State<AppState>,
) -> Json<Vec<AnalyticsEvent>> {
    Json(state.analytics().list().await)
}
