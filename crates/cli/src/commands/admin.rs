//! Admin flag commands.
//!
//! The back office trusts the `isAdmin` flag in the local mirror. These
//! commands write it directly, which is how the first admin is created.
//!
//! # Usage
//!
//! ```bash
//! tb-cli admin grant
//! tb-cli admin revoke
//! tb-cli admin status
//! ```

use trekbase_admin::session::SessionStore;

use super::{CommandError, open_mirror, print_json};

/// Set or clear the admin flag and print the resulting status.
///
/// # Errors
///
/// Returns an error if the mirror cannot be opened or written.
pub async fn set_flag(is_admin: bool) -> Result<(), CommandError> {
    let session = SessionStore::new(open_mirror().await?);
    let status = session.set_admin_flag(is_admin).await?;

    tracing::info!(
        is_admin = status.is_admin,
        permissions = status.permissions.len(),
        "Admin flag updated"
    );
    print_json(&status)
}

/// Print the resolved admin status.
///
/// # Errors
///
/// Returns an error if the mirror cannot be opened.
pub async fn status() -> Result<(), CommandError> {
    let session = SessionStore::new(open_mirror().await?);
    let status = session.refresh().await;
    print_json(&status)
}
