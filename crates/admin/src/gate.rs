//! Access gate for protected admin views and actions.
//!
//! A gate answers one question for one required permission: render a
//! loading placeholder, render a denial with a way back, or let the caller
//! through. It never errors; a missing status is a denial.
//!
//! ```text
//!  Loading ──resolved──▶ Allowed ◀──flag toggled──▶ Denied
//! ```
//!
//! There is no timeout on `Loading`.

use futures::Stream;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use trekbase_core::{AdminStatus, Permission};

/// Where a denied visitor is sent back to.
pub const GO_BACK_PATH: &str = "/";

/// Outcome of evaluating a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Status not resolved yet.
    Loading,
    /// Status resolved and the permission is missing.
    Denied(Denial),
    /// Status resolved and the permission is granted.
    Allowed,
}

/// User-facing explanation of a denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denial {
    pub reason: String,
    /// Recovery link ("go back").
    pub back: String,
}

impl Denial {
    fn new(reason: String) -> Self {
        Self {
            reason,
            back: GO_BACK_PATH.to_owned(),
        }
    }
}

/// Decide whether `status` may access something that needs `required`.
#[must_use]
pub fn evaluate(required: Permission, status: Option<&AdminStatus>) -> GateDecision {
    let Some(status) = status else {
        return GateDecision::Denied(Denial::new(
            "Your access could not be verified.".to_owned(),
        ));
    };

    if !status.is_loaded {
        return GateDecision::Loading;
    }

    if status.can(required) {
        GateDecision::Allowed
    } else {
        GateDecision::Denied(Denial::new(format!(
            "You don't have permission to access this page (requires `{required}`)."
        )))
    }
}

/// Decisions for `required`, starting with the current status and
/// re-evaluated on every session change.
///
/// The stream ends when the session store is dropped.
pub fn watch_gate(
    required: Permission,
    mut status: watch::Receiver<AdminStatus>,
) -> impl Stream<Item = GateDecision> + Send {
    let current = status.borrow_and_update().clone();
    let first = evaluate(required, Some(&current));

    stream::once(async move { first }).chain(stream::unfold(status, move |mut status| async move {
        status.changed().await.ok()?;
        let next = status.borrow_and_update().clone();
        Some((evaluate(required, Some(&next)), status))
    }))
}
