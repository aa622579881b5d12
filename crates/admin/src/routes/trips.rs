//! Trip collection handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use trekbase_core::LocalTripRecord;

use crate::{
    error::AppError,
    middleware::{CanManageTrips, RequirePermission},
    state::AppState,
};

/// Build the trips router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trips", get(list_trips).delete(clear_trips))
        .route(
            "/api/trips/{id}",
            get(show_trip).put(upsert_trip).delete(remove_trip),
        )
}

/// List the trips edited in the admin panel.
pub async fn list_trips(State(state): State<AppState>) -> Json<Vec<LocalTripRecord>> {
    Json(state.trips().list().await)
}

/// Show one trip.
///
/// # Errors
///
/// Returns `NotFound` if no trip has this id.
pub async fn show_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocalTripRecord>, AppError> {
    state
        .trips()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("trip {id}")))
}

/// Insert or replace a trip.
///
/// # Errors
///
/// Returns `BadRequest` if the body's id differs from the path, or an error
/// if the mirror cannot be written.
pub async fn upsert_trip(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(trip): Json<LocalTripRecord>,
) -> Result<Json<LocalTripRecord>, AppError> {
    if trip.id.as_str() != id {
        return Err(AppError::BadRequest(format!(
            "trip id {} does not match path id {id}",
            trip.id
        )));
    }

    state.trips().upsert(trip.clone()).await?;
    tracing::info!(trip_id = %id, title = %trip.title, "Trip saved");
    Ok(Json(trip))
}

/// Remove a trip. Removing a missing trip succeeds.
///
/// # Errors
///
/// Returns an error if the mirror cannot be written.
pub async fn remove_trip(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.trips().remove(&id).await?;
    tracing::info!(trip_id = %id, "Trip removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every local trip.
///
/// # Errors
///
/// Returns an error if the mirror cannot be written.
pub async fn clear_trips(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.trips().clear_all().await?;
    tracing::warn!("All local trips cleared");
    Ok(StatusCode::NO_CONTENT)
}
