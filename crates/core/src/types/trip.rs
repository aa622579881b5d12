//! Trip records as stored in the local mirror and in the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::content::ContentBlock;
use super::id::TripId;
use super::price::Price;
use super::record::Record;

/// Base price used when a local trip has none.
pub const DEFAULT_BASE_PRICE: i64 = 1000;

/// Duration used when a local trip has none.
pub const DEFAULT_DURATION: &str = "1 Day";

/// A trip as edited in the admin panel and kept in the local mirror.
///
/// Fields the back office does not interpret are kept in `extra` so that a
/// read-modify-write through the mirror never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTripRecord {
    pub id: TripId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl LocalTripRecord {
    /// A trip with only an id and a title.
    #[must_use]
    pub fn new(id: impl Into<TripId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            region: None,
            difficulty: None,
            base_price: None,
            duration: None,
            description: None,
            highlights: None,
            image: None,
            extra: Map::new(),
        }
    }
}

impl Record for LocalTripRecord {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A trip row in the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTripRecord {
    /// Assigned by the remote store; absent on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TripId>,
    pub slug: String,
    pub title: String,
    pub category: Option<String>,
    pub region: Option<String>,
    pub difficulty: Option<String>,
    pub base_price: Price,
    pub duration: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteTripRecord {
    /// Build the remote row for the local trip at 1-based `position` in a batch.
    ///
    /// The slug carries the position so identically titled trips stay unique
    /// within one batch. Missing price, duration and description are filled
    /// with defaults.
    #[must_use]
    pub fn from_local(local: &LocalTripRecord, position: usize, now: DateTime<Utc>) -> Self {
        let description = match &local.description {
            Some(block) if !block.is_empty() => block.to_text(),
            _ => synthesize_description(&local.title, local.category.as_deref()),
        };

        Self {
            id: None,
            slug: batch_slug(&local.title, position),
            title: local.title.clone(),
            category: local.category.clone(),
            region: local.region.clone(),
            difficulty: local.difficulty.clone(),
            base_price: local
                .base_price
                .unwrap_or_else(|| Price::from_units(DEFAULT_BASE_PRICE)),
            duration: local
                .duration
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DURATION.to_owned()),
            description,
            image: local.image.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

fn synthesize_description(title: &str, category: Option<&str>) -> String {
    match category {
        Some(category) if !category.trim().is_empty() => format!("{title} - {category} trek"),
        _ => format!("{title} trek"),
    }
}

/// Lowercase, ASCII-alphanumeric slug with single dashes between words.
///
/// Returns `"trip"` when nothing usable remains.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("trip");
    }
    slug
}

/// Slug for the trip at 1-based `position` in a migration batch.
#[must_use]
pub fn batch_slug(title: &str, position: usize) -> String {
    format!("{}-{position}", slugify(title))
}
