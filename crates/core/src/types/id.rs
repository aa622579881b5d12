//! Newtype IDs for type-safe record references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different collections.
//!
//! Records written by the booking site use either numeric ids (timestamps)
//! or string ids, so every generated ID accepts both on input and is stored
//! as a string.

use serde::Deserialize;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` with `#[serde(transparent)]`
/// - `Deserialize` from either a JSON string or a JSON integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use trekbase_core::define_id;
/// define_id!(BookingId);
/// define_id!(GuideId);
///
/// let booking_id = BookingId::new("42");
/// let guide_id = GuideId::new("42");
///
/// // These are different types, so this won't compile:
/// // let _: BookingId = guide_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <$crate::types::id::RawId as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Ok(Self(raw.into_string()))
            }
        }
    };
}

/// Wire form of an ID before normalization.
///
/// Public only so `define_id!` can name it from other crates.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Int(i64),
}

impl RawId {
    /// Normalize to the string form used everywhere else.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
        }
    }
}

// Define standard record IDs
define_id!(TripId);
define_id!(ReviewId);
define_id!(EventId);

impl EventId {
    /// Generate a fresh random event ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
