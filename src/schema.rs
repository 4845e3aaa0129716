//! Structural sketches of documents.
//!
//! A sketch replaces every leaf of a document with the name of its type and
//! keeps only the first element of each array, giving a compact picture of a
//! collection's shape from a single sample document:
//!
//! ```
//! use bsonrec::schema::document_schema;
//! use bsonrec::Document;
//! use serde_json::json;
//!
//! let doc = Document::builder()
//!     .field("_id", "u1")
//!     .field("age", 42)
//!     .field("tags", vec!["a", "b"])
//!     .build();
//!
//! assert_eq!(
//!     document_schema(&doc, 3),
//!     json!({"_id": "string", "age": "number", "tags": ["string"]})
//! );
//! ```

use crate::document::Document;
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};

/// Depth below which nested structure is collapsed to a type name.
pub const DEFAULT_SCHEMA_DEPTH: usize = 3;

/// Sketch the shape of `value`.
///
/// Documents map each key to the sketch of its value, arrays become a
/// one-element array holding the sketch of their first element (or an empty
/// array), and scalars become a type name: `"string"`, `"number"`,
/// `"boolean"`, `"object"` for null, `"undefined"`, or the element type name
/// (`"objectId"`, `"date"`, `"binData"`, ...) for the rest. Anything nested
/// deeper than `max_depth` is collapsed to its type name, with documents and
/// arrays both reported as `"object"`.
#[must_use]
pub fn extract_schema(value: &Value, max_depth: usize) -> JsonValue {
    sketch(value, 0, max_depth)
}

/// Sketch a whole document (the root counts as depth 0).
#[must_use]
pub fn document_schema(document: &Document, max_depth: usize) -> JsonValue {
    sketch_document(document, 0, max_depth)
}

fn sketch(value: &Value, depth: usize, max_depth: usize) -> JsonValue {
    if depth > max_depth {
        return JsonValue::from(type_name(value));
    }
    match value {
        Value::Document(doc) => sketch_document(doc, depth, max_depth),
        Value::Array(items) => JsonValue::Array(
            items
                .first()
                .map(|first| sketch(first, depth + 1, max_depth))
                .into_iter()
                .collect(),
        ),
        other => JsonValue::from(type_name(other)),
    }
}

fn sketch_document(document: &Document, depth: usize, max_depth: usize) -> JsonValue {
    if depth > max_depth {
        return JsonValue::from("object");
    }
    let fields: Map<String, JsonValue> = document
        .iter()
        .map(|(key, value)| (key.to_string(), sketch(value, depth + 1, max_depth)))
        .collect();
    JsonValue::Object(fields)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) | Value::Symbol(_) => "string",
        Value::Double(_) | Value::Int32(_) | Value::Int64(_) | Value::Decimal128(_) => "number",
        Value::Boolean(_) => "boolean",
        Value::Null | Value::Document(_) | Value::Array(_) => "object",
        other => other.element_type().name(),
    }
}
