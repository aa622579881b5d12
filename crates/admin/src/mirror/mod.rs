//! Local mirror: the back office's key/value persistence.
//!
//! # Keys
//!
//! - `isAdmin` - `"true"` / `"false"` flag that drives the admin session
//! - `adminTrips` - trips edited in the admin panel (migration source)
//! - `trips` - legacy trip collection, same shape
//! - `customerReviews`, `tripRatings`, `groupSizes`, `featured_trips`,
//!   `analytics_events` - parallel collections
//!
//! # Storage
//!
//! One owned map of string values behind an async lock, optionally persisted
//! as a single JSON object file. Writes hold the lock for the whole
//! read-modify-write, so two handlers editing the same collection cannot
//! lose each other's updates. Every write publishes a [`MirrorEvent`].
//!
//! Several processes may share one file (the server and `tb-cli`). Writes
//! take an OS file lock and merge with the file's current contents;
//! [`LocalMirror::reload`] and [`LocalMirror::watch_file`] bring in writes
//! made elsewhere.

mod collection;

pub use collection::{Collection, Loaded, SkippedRecord};

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Well-known mirror keys.
pub mod keys {
    /// Admin flag (`"true"` grants the admin role).
    pub const IS_ADMIN: &str = "isAdmin";
    /// Trips edited in the admin panel.
    pub const ADMIN_TRIPS: &str = "adminTrips";
    /// Legacy trip collection.
    pub const TRIPS: &str = "trips";
    /// Customer reviews.
    pub const CUSTOMER_REVIEWS: &str = "customerReviews";
    /// Aggregate trip ratings.
    pub const TRIP_RATINGS: &str = "tripRatings";
    /// Group-size overrides.
    pub const GROUP_SIZES: &str = "groupSizes";
    /// Featured-trip ordering.
    pub const FEATURED_TRIPS: &str = "featured_trips";
    /// Client analytics events.
    pub const ANALYTICS_EVENTS: &str = "analytics_events";

    /// Every collection key, for inspection tools.
    pub const COLLECTIONS: &[&str] = &[
        ADMIN_TRIPS,
        TRIPS,
        CUSTOMER_REVIEWS,
        TRIP_RATINGS,
        GROUP_SIZES,
        FEATURED_TRIPS,
        ANALYTICS_EVENTS,
    ];
}

/// Capacity of the change notification channel.
const EVENT_CAPACITY: usize = 64;

/// Errors that can occur when writing to the mirror.
///
/// Reads never fail; see [`Collection::list`].
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Reading or writing the backing file failed.
    #[error("mirror I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Change notification published by the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    /// The value under this key was written or removed.
    KeyChanged(String),
    /// Same-process request to re-resolve the admin status without a
    /// storage change.
    AdminStatusChanged,
}

/// Handle to the local mirror. Cheap to clone.
#[derive(Clone)]
pub struct LocalMirror {
    inner: Arc<MirrorInner>,
}

struct MirrorInner {
    entries: RwLock<HashMap<String, String>>,
    path: Option<PathBuf>,
    events: broadcast::Sender<MirrorEvent>,
}

impl LocalMirror {
    /// A mirror that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_entries(HashMap::new(), None)
    }

    /// Open a file-backed mirror.
    ///
    /// A missing file starts an empty mirror. A file that is not a JSON
    /// object of strings is logged and ignored; it is overwritten on the
    /// next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MirrorError> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path).await?.unwrap_or_default();

        tracing::info!(path = %path.display(), keys = entries.len(), "Local mirror opened");
        Ok(Self::with_entries(entries, Some(path)))
    }

    fn with_entries(entries: HashMap<String, String>, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(MirrorInner {
                entries: RwLock::new(entries),
                path,
                events,
            }),
        }
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Raw value stored under `key`.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.read().await.get(key).cloned()
    }

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn set(&self, key: &str, value: impl Into<String>) -> Result<(), MirrorError> {
        let value = value.into();
        self.update(key, move |_| Ok(Some(value))).await
    }

    /// Delete `key`. Deleting a missing key is a no-op write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be written.
    pub async fn remove(&self, key: &str) -> Result<(), MirrorError> {
        self.update(key, |_| Ok(None)).await
    }

    /// Read-modify-write of one key.
    ///
    /// `f` receives the current value and returns the new one; `None`
    /// deletes the key. For a file-backed mirror the whole step runs under
    /// an exclusive lock on `<file>.lock` and starts from the file's current
    /// contents, so writes from other processes sharing the file are merged
    /// rather than overwritten. Memory only changes once the file write has
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or an I/O error from locking,
    /// reading or persisting.
    pub async fn update<F>(&self, key: &str, f: F) -> Result<(), MirrorError>
    where
        F: FnOnce(Option<&str>) -> Result<Option<String>, MirrorError>,
    {
        let mut entries = self.inner.entries.write().await;

        let (lock, mut next) = match &self.inner.path {
            Some(path) => {
                let lock = lock_file(path).await?;
                let on_disk = read_entries(path).await?;
                (Some(lock), on_disk.unwrap_or_else(|| entries.clone()))
            }
            None => (None, entries.clone()),
        };

        match f(next.get(key).map(String::as_str))? {
            Some(value) => {
                next.insert(key.to_owned(), value);
            }
            None => {
                next.remove(key);
            }
        }

        if let Some(path) = &self.inner.path {
            persist(path, &next).await?;
        }
        drop(lock);

        let outside = changed_keys(&entries, &next);
        *entries = next;
        drop(entries);

        self.publish(MirrorEvent::KeyChanged(key.to_owned()));
        for changed in outside.into_iter().filter(|k| k != key) {
            self.publish(MirrorEvent::KeyChanged(changed));
        }
        Ok(())
    }

    /// Pick up writes made to the backing file by other processes.
    ///
    /// Publishes a [`MirrorEvent::KeyChanged`] for every key whose value
    /// differs and returns those keys. A missing or malformed file leaves
    /// the mirror as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn reload(&self) -> Result<Vec<String>, MirrorError> {
        let Some(path) = &self.inner.path else {
            return Ok(Vec::new());
        };
        let Some(on_disk) = read_entries(path).await? else {
            return Ok(Vec::new());
        };

        let mut entries = self.inner.entries.write().await;
        let changed = changed_keys(&entries, &on_disk);
        if !changed.is_empty() {
            *entries = on_disk;
        }
        drop(entries);

        for key in &changed {
            self.publish(MirrorEvent::KeyChanged(key.clone()));
        }
        Ok(changed)
    }

    /// Reload the backing file every `period`.
    ///
    /// Returns `None` for an in-memory mirror. The task runs until aborted.
    #[must_use]
    pub fn watch_file(&self, period: Duration) -> Option<JoinHandle<()>> {
        self.inner.path.as_ref()?;
        let mirror = self.clone();

        Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                match mirror.reload().await {
                    Ok(changed) if !changed.is_empty() => {
                        tracing::info!(keys = ?changed, "Mirror file changed on disk");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Failed to reload mirror file"),
                }
            }
        }))
    }

    /// Keys currently present.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.inner.events.subscribe()
    }

    /// Ask subscribers to re-resolve the admin status.
    pub fn notify_admin_status_changed(&self) {
        self.publish(MirrorEvent::AdminStatusChanged);
    }

    fn publish(&self, event: MirrorEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

/// Keys whose values differ between `old` and `new`, sorted.
fn changed_keys(old: &HashMap<String, String>, new: &HashMap<String, String>) -> Vec<String> {
    let mut changed: Vec<String> = old
        .keys()
        .chain(new.keys())
        .filter(|k| old.get(*k) != new.get(*k))
        .cloned()
        .collect();
    changed.sort();
    changed.dedup();
    changed
}

/// Entries stored in the file at `path`.
///
/// `None` when the file is missing or is not a JSON object of strings.
async fn read_entries(path: &Path) -> Result<Option<HashMap<String, String>>, MirrorError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Mirror file is malformed, ignoring its contents");
                Ok(None)
            }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(MirrorError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

async fn ensure_parent(path: &Path) -> Result<(), MirrorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| MirrorError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

/// Take the exclusive advisory lock guarding writes to `path`.
///
/// The lock is released when the returned file is dropped.
async fn lock_file(path: &Path) -> Result<std::fs::File, MirrorError> {
    ensure_parent(path).await?;
    let lock_path = sibling(path, ".lock");

    let blocking_path = lock_path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&blocking_path)?;
        file.lock()?;
        Ok(file)
    })
    .await
    .map_err(std::io::Error::other)
    .and_then(|locked| locked)
    .map_err(|source| MirrorError::Io {
        path: lock_path,
        source,
    })
}

/// Write the whole map next to `path` and rename it into place.
async fn persist(path: &Path, entries: &HashMap<String, String>) -> Result<(), MirrorError> {
    let json = serde_json::to_vec_pretty(entries)?;
    let tmp = sibling(path, ".tmp");

    ensure_parent(path).await?;
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|source| MirrorError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| MirrorError::Io {
            path: path.to_path_buf(),
            source,
        })
}
