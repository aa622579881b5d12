//! Editable content blocks.

use serde::{Deserialize, Serialize};

/// A block of editable text that is either a paragraph or a list of lines.
///
/// The booking site stores descriptions, highlights and itineraries in
/// whichever shape the editor produced, so both forms are accepted on the
/// wire without a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    Text(String),
    List(Vec<String>),
}

impl ContentBlock {
    /// The block as display lines.
    #[must_use]
    pub fn as_lines(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => text.lines().collect(),
            Self::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Returns `true` if the block has no visible content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }

    /// Flatten to a single string, joining list items with newlines.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::List(items) => items.join("\n"),
        }
    }
}

impl From<&str> for ContentBlock {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<String>> for ContentBlock {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}
