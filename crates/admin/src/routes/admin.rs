//! Admin session, migration and upload handlers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use trekbase_core::{AdminStatus, ClearOutcome, MigrationResult, VerifyReport};

use crate::{
    error::AppError,
    middleware::{CanAdmin, CanManageTrips, RequirePermission},
    state::AppState,
};

/// Content type assumed for uploads that do not declare one.
const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/status", get(status).put(set_status))
        .route("/api/admin/migrate", post(migrate))
        .route("/api/admin/clear-remote", post(clear_remote))
        .route("/api/admin/verify", get(verify))
        .route("/api/admin/upload/{bucket}/{*path}", post(upload))
}

/// Current admin status, including while it is still loading.
pub async fn status(State(state): State<AppState>) -> Json<AdminStatus> {
    Json(state.session().current())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub is_admin: bool,
}

/// Toggle the admin flag. Revoking your own flag locks you out until it is
/// granted again from the CLI.
///
/// # Errors
///
/// Returns an error if the mirror cannot be written.
pub async fn set_status(
    _: RequirePermission<CanAdmin>,
    State(state): State<AppState>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<AdminStatus>, AppError> {
    let status = state.session().set_admin_flag(body.is_admin).await?;
    tracing::info!(is_admin = body.is_admin, "Admin flag changed over HTTP");
    Ok(Json(status))
}

/// Run a migration. Remote failures are reported in the result body.
pub async fn migrate(
    _: RequirePermission<CanAdmin>,
    State(state): State<AppState>,
) -> Json<MigrationResult> {
    Json(state.migrator().migrate().await)
}

pub async fn clear_remote(
    _: RequirePermission<CanAdmin>,
    State(state): State<AppState>,
) -> Json<ClearOutcome> {
    Json(state.migrator().clear_remote().await)
}

pub async fn verify(
    _: RequirePermission<CanAdmin>,
    State(state): State<AppState>,
) -> Json<VerifyReport> {
    Json(state.migrator().verify().await)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Store an image in the remote object storage.
///
/// # Errors
///
/// Returns `BadRequest` for an empty body, or `Remote` if the upload fails.
pub async fn upload(
    _: RequirePermission<CanManageTrips>,
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("upload body is empty".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_UPLOAD_CONTENT_TYPE);

    let url = state
        .remote()
        .upload(&bucket, &path, body.to_vec(), content_type)
        .await?;
    tracing::info!(bucket = %bucket, path = %path, "Image uploaded");

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
