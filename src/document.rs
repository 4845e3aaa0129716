//! Decoded documents.
//!
//! A [`Document`] is one decoded record: an ordered mapping from string keys
//! to [`Value`]s. Keys are kept in the order they appear in the payload.
//!
//! # Examples
//!
//! ```
//! use bsonrec::{Document, Value};
//!
//! let doc = Document::builder()
//!     .field("_id", "c")
//!     .field(
//!         "dc",
//!         Document::builder()
//!             .field("title", "X")
//!             .field("creator", vec!["Y", "Z"])
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(doc.get_str("_id"), Some("c"));
//! assert_eq!(doc.get_path("dc.title").and_then(Value::as_str), Some("X"));
//! ```

use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An ordered, string-keyed document.
///
/// Fields are stored in insertion order using `IndexMap`. Inserting an
/// existing key replaces its value and keeps the key's original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Document {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Start building a document.
    #[must_use]
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Insert a field, returning the previous value for the key if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field, preserving the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a string field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Get an embedded document field.
    #[must_use]
    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Value::as_document)
    }

    /// Get an array field.
    #[must_use]
    pub fn get_array(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_array)
    }

    /// Get a value by dotted path, descending through embedded documents and
    /// array indices (`"dc.creator.0"`).
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Whether the document has a field with this key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Document {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Builder for [`Document`].
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Add a field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.document.insert(key, value);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edition() -> Document {
        Document::builder()
            .field("_id", "c")
            .field(
                "dc",
                Document::builder()
                    .field("title", "X")
                    .field("creator", vec!["Y", "Z"])
                    .build(),
            )
            .field("published", true)
            .build()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let doc = edition();
        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["_id", "dc", "published"]);
    }

    #[test]
    fn test_duplicate_key_keeps_position() {
        let mut doc = edition();
        let previous = doc.insert("_id", "d");
        assert_eq!(previous, Some(Value::from("c")));
        assert_eq!(doc.keys().next(), Some("_id"));
        assert_eq!(doc.get_str("_id"), Some("d"));
    }

    #[test]
    fn test_get_path() {
        let doc = edition();
        assert_eq!(doc.get_path("dc.title").and_then(Value::as_str), Some("X"));
        assert_eq!(
            doc.get_path("dc.creator.1").and_then(Value::as_str),
            Some("Z")
        );
        assert!(doc.get_path("dc.creator.9").is_none());
        assert!(doc.get_path("dc.title.x").is_none());
        assert!(doc.get_path("missing").is_none());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut doc = edition();
        doc.remove("dc");
        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, vec!["_id", "published"]);
    }

    #[test]
    fn test_from_iterator() {
        let doc: Document = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("b"), Some(&Value::Int32(2)));
    }
}
