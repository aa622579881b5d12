//! In-memory remote store for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{Filter, RemoteError, RemoteStore};

/// Number of calls made to each remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCalls {
    pub select: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub count: usize,
    pub upload: usize,
}

impl RemoteCalls {
    /// Total number of calls.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.select + self.insert + self.update + self.delete + self.count + self.upload
    }
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<JsonValue>>,
    objects: HashMap<String, (Vec<u8>, String)>,
    next_id: u64,
    calls: RemoteCalls,
    failing_titles: HashSet<String>,
    fail_delete: Option<String>,
    fail_count: Option<String>,
}

/// Remote store backed by in-process tables.
///
/// Assigns numeric ids to inserted rows without one and rejects duplicate
/// slugs with a 409, like the hosted schema does. Failures can be injected
/// per inserted title and for delete and count.
#[derive(Default)]
pub struct MemoryRemoteStore {
    state: Mutex<State>,
}

impl MemoryRemoteStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject inserts of rows whose `title` is `title`.
    pub fn fail_insert_for_title(&self, title: impl Into<String>) {
        self.lock().failing_titles.insert(title.into());
    }

    /// Make every delete fail with `message`.
    pub fn fail_delete(&self, message: impl Into<String>) {
        self.lock().fail_delete = Some(message.into());
    }

    /// Make every count fail with `message`.
    pub fn fail_count(&self, message: impl Into<String>) {
        self.lock().fail_count = Some(message.into());
    }

    /// Put rows into `table` without going through `insert`.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = JsonValue>) {
        self.lock()
            .tables
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
    }

    /// Current rows of `table`.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<JsonValue> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Stored object bytes at `bucket/path`.
    #[must_use]
    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&format!("{bucket}/{path}"))
            .map(|(bytes, _)| bytes.clone())
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> RemoteCalls {
        self.lock().calls
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<JsonValue>, RemoteError> {
        let mut state = self.lock();
        state.calls.select += 1;
        Ok(state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, RemoteError> {
        let mut state = self.lock();
        state.calls.insert += 1;

        for row in &rows {
            let title = row.get("title").and_then(JsonValue::as_str).unwrap_or_default();
            if state.failing_titles.contains(title) {
                return Err(RemoteError::Api {
                    status: 400,
                    message: format!("insert rejected for \"{title}\""),
                });
            }
            if let Some(slug) = row.get("slug").and_then(JsonValue::as_str) {
                let taken = state.tables.get(table).is_some_and(|existing| {
                    existing
                        .iter()
                        .any(|r| r.get("slug").and_then(JsonValue::as_str) == Some(slug))
                });
                if taken {
                    return Err(RemoteError::Api {
                        status: 409,
                        message: format!(
                            "duplicate key value violates unique constraint on slug \"{slug}\""
                        ),
                    });
                }
            }
        }

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if row.get("id").is_none_or(JsonValue::is_null) {
                state.next_id += 1;
                if let Some(fields) = row.as_object_mut() {
                    fields.insert("id".to_owned(), JsonValue::from(state.next_id));
                }
            }
            stored.push(row);
        }
        state
            .tables
            .entry(table.to_owned())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        patch: JsonValue,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, RemoteError> {
        let mut state = self.lock();
        state.calls.update += 1;

        let Some(fields) = patch.as_object() else {
            return Err(RemoteError::Api {
                status: 400,
                message: "patch must be a JSON object".to_owned(),
            });
        };

        let mut updated = Vec::new();
        for row in state.tables.entry(table.to_owned()).or_default() {
            if !filter.matches(row) {
                continue;
            }
            if let Some(target) = row.as_object_mut() {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.calls.delete += 1;
        if let Some(message) = state.fail_delete.clone() {
            return Err(RemoteError::Api { status: 500, message });
        }
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<usize, RemoteError> {
        let mut state = self.lock();
        state.calls.count += 1;
        if let Some(message) = state.fail_count.clone() {
            return Err(RemoteError::Api { status: 503, message });
        }
        Ok(state.tables.get(table).map_or(0, Vec::len))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let mut state = self.lock();
        state.calls.upload += 1;
        state
            .objects
            .insert(format!("{bucket}/{path}"), (bytes, content_type.to_owned()));
        Ok(format!("memory://storage/v1/object/public/{bucket}/{path}"))
    }
}
