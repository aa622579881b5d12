//! Remote store client (hosted database + object storage).
//!
//! # Architecture
//!
//! The authoritative trip data lives in a hosted backend-as-a-service that
//! exposes a PostgREST-style REST interface for tables and an object storage
//! API for images. This module only consumes that contract:
//!
//! - `select(table, filter)` - rows matching a filter
//! - `insert(table, rows)` - inserted rows, as returned by the store
//! - `update(table, patch, filter)` - updated rows
//! - `delete(table, filter)`
//! - `count(table)` - exact row count
//! - `upload(bucket, path, bytes)` - public URL of the stored object
//!
//! Every call is async and reports failure as a [`RemoteError`] carrying a
//! message. There are no timeouts and no retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use trekbase_admin::remote::{Filter, RemoteStore, RestRemoteStore};
//!
//! let store = RestRemoteStore::new(&config.remote)?;
//! let active = store.select("trips", &Filter::eq("is_active", "true")).await?;
//! ```

#[cfg(any(test, feature = "test-support"))]
mod memory;
mod rest;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryRemoteStore, RemoteCalls};
pub use rest::RestRemoteStore;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors that can occur when talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The client could not be built from its configuration.
    #[error("Invalid remote store configuration: {0}")]
    Config(String),
}

/// Row filter understood by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every row.
    All,
    /// `column = value`.
    Eq(String, String),
    /// `column <> value`.
    Neq(String, String),
}

impl Filter {
    /// `column = value`.
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    /// `column <> value`.
    #[must_use]
    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Neq(column.into(), value.into())
    }

    /// PostgREST query parameter for this filter, if it has one.
    #[must_use]
    pub fn query_pair(&self) -> Option<(String, String)> {
        match self {
            Self::All => None,
            Self::Eq(column, value) => Some((column.clone(), format!("eq.{value}"))),
            Self::Neq(column, value) => Some((column.clone(), format!("neq.{value}"))),
        }
    }

    /// Whether `row` satisfies the filter, comparing values as text.
    #[must_use]
    pub fn matches(&self, row: &JsonValue) -> bool {
        match self {
            Self::All => true,
            Self::Eq(column, value) => column_text(row, column).as_deref() == Some(value.as_str()),
            Self::Neq(column, value) => column_text(row, column).as_deref() != Some(value.as_str()),
        }
    }
}

fn column_text(row: &JsonValue, column: &str) -> Option<String> {
    match row.get(column)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The remote store contract consumed by the back office.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows of `table` matching `filter`.
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<JsonValue>, RemoteError>;

    /// Insert `rows` into `table`, returning the stored rows.
    async fn insert(&self, table: &str, rows: Vec<JsonValue>)
    -> Result<Vec<JsonValue>, RemoteError>;

    /// Apply `patch` to the rows of `table` matching `filter`.
    async fn update(
        &self,
        table: &str,
        patch: JsonValue,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, RemoteError>;

    /// Delete the rows of `table` matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError>;

    /// Exact number of rows in `table`.
    async fn count(&self, table: &str) -> Result<usize, RemoteError>;

    /// Store an object and return its public URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_query_pairs() {
        assert_eq!(Filter::All.query_pair(), None);
        assert_eq!(
            Filter::eq("slug", "roopkund-1").query_pair(),
            Some(("slug".to_owned(), "eq.roopkund-1".to_owned()))
        );
        assert_eq!(
            Filter::neq("id", "0").query_pair(),
            Some(("id".to_owned(), "neq.0".to_owned()))
        );
    }

    #[test]
    fn test_filter_matches_as_text() {
        let row = json!({"id": 7, "slug": "a-1", "region": null});
        assert!(Filter::All.matches(&row));
        assert!(Filter::eq("id", "7").matches(&row));
        assert!(Filter::eq("slug", "a-1").matches(&row));
        assert!(!Filter::eq("slug", "b-1").matches(&row));
        assert!(Filter::neq("id", "00000000-0000-0000-0000-000000000000").matches(&row));
        assert!(Filter::neq("region", "north").matches(&row));
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::Api {
            status: 409,
            message: "duplicate key".to_owned(),
        };
        assert_eq!(err.to_string(), "API error: 409 - duplicate key");
    }
}
