//! Observable admin session.
//!
//! The session's [`AdminStatus`] is derived from the mirror's `isAdmin` flag
//! and published on a `watch` channel. It starts out as loading, is resolved
//! once [`SessionStore::start`] runs, and is recomputed whenever the flag is
//! written or someone calls [`LocalMirror::notify_admin_status_changed`].
//! Subscribers unsubscribe by dropping their receiver.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trekbase_core::AdminStatus;

use crate::mirror::{LocalMirror, MirrorError, MirrorEvent, keys};

/// Shared, reactive admin status.
#[derive(Clone)]
pub struct SessionStore {
    mirror: LocalMirror,
    status: Arc<watch::Sender<AdminStatus>>,
}

impl SessionStore {
    /// A session over `mirror`, still loading.
    #[must_use]
    pub fn new(mirror: LocalMirror) -> Self {
        let (status, _) = watch::channel(AdminStatus::loading());
        Self {
            mirror,
            status: Arc::new(status),
        }
    }

    /// Snapshot of the current status.
    #[must_use]
    pub fn current(&self) -> AdminStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AdminStatus> {
        self.status.subscribe()
    }

    /// Resolve the status from the mirror now and publish it.
    pub async fn refresh(&self) -> AdminStatus {
        let flag = self.mirror.get(keys::IS_ADMIN).await;
        let status = AdminStatus::from_flag(flag.as_deref());
        let previous = self.status.send_replace(status.clone());
        if previous.is_admin != status.is_admin || !previous.is_loaded {
            info!(is_admin = status.is_admin, "Admin status resolved");
        }
        status
    }

    /// Resolve once, then keep the status in step with the mirror.
    ///
    /// The returned task keeps running until it is aborted.
    pub fn start(&self) -> JoinHandle<()> {
        let mut events = self.mirror.subscribe();
        let session = self.clone();

        tokio::spawn(async move {
            session.refresh().await;
            loop {
                match events.recv().await {
                    Ok(MirrorEvent::KeyChanged(key)) if key == keys::IS_ADMIN => {
                        session.refresh().await;
                    }
                    Ok(MirrorEvent::AdminStatusChanged) => {
                        session.refresh().await;
                    }
                    Ok(MirrorEvent::KeyChanged(key)) => {
                        debug!(key = %key, "Ignoring mirror change");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session watcher lagged, re-resolving");
                        session.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Write the admin flag and re-resolve the status.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror cannot be written.
    pub async fn set_admin_flag(&self, is_admin: bool) -> Result<AdminStatus, MirrorError> {
        let value = if is_admin { "true" } else { "false" };
        self.mirror.set(keys::IS_ADMIN, value).await?;
        self.mirror.notify_admin_status_changed();
        Ok(self.refresh().await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use trekbase_core::{Permission, Role};

    use super::*;

    async fn next_status(rx: &mut watch::Receiver<AdminStatus>) -> AdminStatus {
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let session = SessionStore::new(LocalMirror::in_memory());
        assert!(!session.current().is_loaded);
    }

    #[tokio::test]
    async fn test_start_resolves_from_flag() {
        let mirror = LocalMirror::in_memory();
        mirror.set(keys::IS_ADMIN, "true").await.unwrap();
        let session = SessionStore::new(mirror);
        let mut rx = session.subscribe();

        session.start();
        let status = next_status(&mut rx).await;
        assert!(status.is_loaded);
        assert_eq!(status.role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_external_flag_write_is_observed() {
        let mirror = LocalMirror::in_memory();
        let session = SessionStore::new(mirror.clone());
        let mut rx = session.subscribe();
        session.start();
        assert!(!next_status(&mut rx).await.is_admin);

        mirror.set(keys::IS_ADMIN, "true").await.unwrap();
        let status = next_status(&mut rx).await;
        assert!(status.can(Permission::Admin));

        mirror.set(keys::IS_ADMIN, "false").await.unwrap();
        assert!(!next_status(&mut rx).await.is_admin);
    }

    #[tokio::test]
    async fn test_set_admin_flag_updates_immediately() {
        let session = SessionStore::new(LocalMirror::in_memory());
        let status = session.set_admin_flag(true).await.unwrap();
        assert!(status.is_admin);
        assert!(session.current().is_admin);

        session.set_admin_flag(false).await.unwrap();
        assert!(!session.current().is_admin);
    }
}
