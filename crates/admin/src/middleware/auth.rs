//! Permission extractors for admin routes.
//!
//! Each protected handler takes a [`RequirePermission`] parameterized by a
//! marker type naming the permission it needs. The gate is evaluated against
//! the live session on every request, so toggling the admin flag takes
//! effect on the next request without a restart.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn delete_trip(
//!     _: RequirePermission<CanManageTrips>,
//!     Path(id): Path<String>,
//! ) -> impl IntoResponse {
//!     // only reached with manage_trips
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use trekbase_core::{AdminStatus, Permission};

use crate::gate::{self, Denial, GateDecision};
use crate::state::AppState;

/// Seconds a client should wait before retrying while the session loads.
const LOADING_RETRY_AFTER_SECS: &str = "1";

/// Marker naming the permission a route requires.
pub trait RequiredPermission: Send + Sync + 'static {
    const PERMISSION: Permission;
}

macro_rules! permission_marker {
    ($(#[$doc:meta])* $name:ident => $permission:ident) => {
        $(#[$doc])*
        pub struct $name;

        impl RequiredPermission for $name {
            const PERMISSION: Permission = Permission::$permission;
        }
    };
}

permission_marker!(
    /// Requires `write`.
    CanWrite => Write
);
permission_marker!(
    /// Requires `delete`.
    CanDelete => Delete
);
permission_marker!(
    /// Requires `admin`.
    CanAdmin => Admin
);
permission_marker!(
    /// Requires `manage_trips`.
    CanManageTrips => ManageTrips
);
permission_marker!(
    /// Requires `view_analytics`.
    CanViewAnalytics => ViewAnalytics
);

/// Extractor that lets the request through only if the gate allows it.
///
/// Carries the status snapshot the decision was made on.
pub struct RequirePermission<P>(pub AdminStatus, PhantomData<P>);

/// Rejection produced by a closed gate.
#[derive(Debug)]
pub enum GateRejection {
    /// The session has not resolved yet (503 with `Retry-After`).
    Loading,
    /// The permission is missing (403 with reason and a way back).
    Denied(Denial),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Loading => {
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Checking access, please retry shortly",
                )
                    .into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from_static(LOADING_RETRY_AFTER_SECS),
                );
                response
            }
            Self::Denied(denial) => (StatusCode::FORBIDDEN, Json(denial)).into_response(),
        }
    }
}

impl<P: RequiredPermission> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = GateRejection;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let status = state.session().current();

        match gate::evaluate(P::PERMISSION, Some(&status)) {
            GateDecision::Allowed => Ok(Self(status, PhantomData)),
            GateDecision::Loading => Err(GateRejection::Loading),
            GateDecision::Denied(denial) => {
                tracing::info!(
                    required = %P::PERMISSION,
                    is_admin = status.is_admin,
                    "Access denied"
                );
                Err(GateRejection::Denied(denial))
            }
        }
    }
}
