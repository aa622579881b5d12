//! Common behaviour of records kept in mirror collections.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A record that lives in a keyed collection of the local mirror.
///
/// Collections replace records by id on upsert and filter by id on removal.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// JSON field holding the id in the stored form.
    const ID_FIELD: &'static str = "id";

    /// The id used to match this record within its collection.
    fn record_id(&self) -> &str;

    /// The id of a stored element that may not parse as `Self`.
    ///
    /// Numeric ids are normalized to their decimal text, as ID types do.
    fn raw_id(value: &JsonValue) -> Option<String> {
        match value.get(Self::ID_FIELD)? {
            JsonValue::String(id) => Some(id.clone()),
            JsonValue::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}
