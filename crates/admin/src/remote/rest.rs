//! REST client for the hosted remote store.
//!
//! Tables are served by a PostgREST-style API under `/rest/v1/{table}` and
//! objects by the storage API under `/storage/v1/object/{bucket}/{path}`.
//! Both authenticate with the same key, sent as `apikey` and as a bearer
//! token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;
use tracing::instrument;
use url::Url;

use super::{Filter, RemoteError, RemoteStore};
use crate::config::RemoteStoreConfig;

/// PostgREST header selecting what a write returns.
const PREFER: &str = "Prefer";

/// Remote store client over HTTP.
///
/// Built without a request timeout; a hung request hangs its caller.
#[derive(Clone)]
pub struct RestRemoteStore {
    inner: Arc<RestRemoteStoreInner>,
}

struct RestRemoteStoreInner {
    client: reqwest::Client,
    base_url: Url,
}

impl RestRemoteStore {
    /// Create a new remote store client.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or API key is unusable, or if the HTTP
    /// client fails to build.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| RemoteError::Config(format!("Invalid base URL: {e}")))?;

        let key = config.api_key.expose_secret();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestRemoteStoreInner { client, base_url }),
        })
    }

    /// Base URL of the remote store.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// `{base}/rest/v1/{table}` with the filter applied.
    fn table_url(&self, table: &str, filter: &Filter) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(&["rest", "v1", table])?;
        if let Some((column, condition)) = filter.query_pair() {
            url.query_pairs_mut().append_pair(&column, &condition);
        }
        Ok(url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Config("Base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Handle API response and parse JSON.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<Vec<JsonValue>, RemoteError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| RemoteError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse an error response, preferring the store's `message` field.
    async fn parse_error(&self, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<JsonValue>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(JsonValue::as_str).map(str::to_owned))
            .unwrap_or(body);

        RemoteError::Api { status, message }
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    #[instrument(skip(self))]
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<JsonValue>, RemoteError> {
        let mut url = self.table_url(table, filter)?;
        url.query_pairs_mut().append_pair("select", "*");
        let response = self.inner.client.get(url).send().await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, RemoteError> {
        let url = self.table_url(table, &Filter::All)?;
        let response = self
            .inner
            .client
            .post(url)
            .header(PREFER, "return=representation")
            .json(&rows)
            .send()
            .await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        table: &str,
        patch: JsonValue,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, RemoteError> {
        let url = self.table_url(table, filter)?;
        let response = self
            .inner
            .client
            .patch(url)
            .header(PREFER, "return=representation")
            .json(&patch)
            .send()
            .await?;
        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), RemoteError> {
        let url = self.table_url(table, filter)?;
        let response = self.inner.client.delete(url).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(self.parse_error(response).await)
    }

    #[instrument(skip(self))]
    async fn count(&self, table: &str) -> Result<usize, RemoteError> {
        let url = self.table_url(table, &Filter::All)?;
        let response = self
            .inner
            .client
            .head(url)
            .header(PREFER, "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RemoteError::Parse("Missing Content-Range header".to_string()))?;

        parse_content_range_total(range)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let mut segments = vec!["storage", "v1", "object", bucket];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;

        let response = self
            .inner
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.parse_error(response).await);
        }

        let mut public = vec!["storage", "v1", "object", "public", bucket];
        public.extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(self.endpoint(&public)?.to_string())
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(range: &str) -> Result<usize, RemoteError> {
    range
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
        .ok_or_else(|| RemoteError::Parse(format!("Unrecognized Content-Range: {range}")))
}

impl std::fmt::Debug for RestRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemoteStore")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
