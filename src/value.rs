//! Dynamically typed element values.
//!
//! Every field of a [`Document`](crate::document::Document) holds a [`Value`].
//! The variants cover the complete element type table of the dump format,
//! including the deprecated types older exports still contain.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type tags of the binary document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    /// 64-bit IEEE 754 floating point
    Double = 0x01,
    /// UTF-8 string
    String = 0x02,
    /// Embedded document
    Document = 0x03,
    /// Array (a document with keys "0", "1", ...)
    Array = 0x04,
    /// Binary data with a subtype byte
    Binary = 0x05,
    /// Undefined (deprecated)
    Undefined = 0x06,
    /// 12-byte object identifier
    ObjectId = 0x07,
    /// Boolean
    Boolean = 0x08,
    /// UTC datetime, milliseconds since the Unix epoch
    DateTime = 0x09,
    /// Null
    Null = 0x0A,
    /// Regular expression (pattern + options)
    RegularExpression = 0x0B,
    /// `DBPointer` (deprecated)
    DbPointer = 0x0C,
    /// JavaScript code
    JavaScriptCode = 0x0D,
    /// Symbol (deprecated)
    Symbol = 0x0E,
    /// JavaScript code with scope (deprecated)
    JavaScriptCodeWithScope = 0x0F,
    /// 32-bit signed integer
    Int32 = 0x10,
    /// Replication timestamp
    Timestamp = 0x11,
    /// 64-bit signed integer
    Int64 = 0x12,
    /// 128-bit IEEE 754 decimal
    Decimal128 = 0x13,
    /// Max key sentinel
    MaxKey = 0x7F,
    /// Min key sentinel
    MinKey = 0xFF,
}

impl ElementType {
    /// Map a tag byte to its element type.
    ///
    /// Returns `None` for bytes the format does not define (including the
    /// 0x00 document terminator).
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x06 => Self::Undefined,
            0x07 => Self::ObjectId,
            0x08 => Self::Boolean,
            0x09 => Self::DateTime,
            0x0A => Self::Null,
            0x0B => Self::RegularExpression,
            0x0C => Self::DbPointer,
            0x0D => Self::JavaScriptCode,
            0x0E => Self::Symbol,
            0x0F => Self::JavaScriptCodeWithScope,
            0x10 => Self::Int32,
            0x11 => Self::Timestamp,
            0x12 => Self::Int64,
            0x13 => Self::Decimal128,
            0x7F => Self::MaxKey,
            0xFF => Self::MinKey,
            _ => return None,
        })
    }

    /// The tag byte written before the element's key.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Short lower-camel-case name, as used in schema sketches.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "object",
            Self::Array => "array",
            Self::Binary => "binData",
            Self::Undefined => "undefined",
            Self::ObjectId => "objectId",
            Self::Boolean => "bool",
            Self::DateTime => "date",
            Self::Null => "null",
            Self::RegularExpression => "regex",
            Self::DbPointer => "dbPointer",
            Self::JavaScriptCode => "javascript",
            Self::Symbol => "symbol",
            Self::JavaScriptCodeWithScope => "javascriptWithScope",
            Self::Int32 => "int",
            Self::Timestamp => "timestamp",
            Self::Int64 => "long",
            Self::Decimal128 => "decimal",
            Self::MaxKey => "maxKey",
            Self::MinKey => "minKey",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 12-byte object identifier.
///
/// The first four bytes are a big-endian creation time in seconds since the
/// Unix epoch; the rest is opaque.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Wrap raw identifier bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        ObjectId(bytes)
    }

    /// Parse a 24-character hexadecimal identifier.
    ///
    /// Returns `None` if the string has the wrong length or a non-hex digit.
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(text, &mut bytes).ok()?;
        Some(ObjectId(bytes))
    }

    /// Raw identifier bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Creation time embedded in the identifier, in seconds since the epoch.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Lowercase 24-character hexadecimal form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

/// Binary payload with its subtype byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    /// Subtype (0x00 generic, 0x04 UUID, 0x80+ user defined, ...)
    pub subtype: u8,
    /// Payload bytes
    pub bytes: Vec<u8>,
}

/// A dynamically typed element value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Embedded document
    Document(Document),
    /// Ordered list
    Array(Vec<Value>),
    /// Binary sub-blob
    Binary(Binary),
    /// Undefined (deprecated)
    Undefined,
    /// Object identifier
    ObjectId(ObjectId),
    /// Boolean
    Boolean(bool),
    /// UTC datetime in milliseconds since the Unix epoch
    DateTime(i64),
    /// Null
    Null,
    /// Regular expression
    RegularExpression {
        /// Pattern source
        pattern: String,
        /// Option letters, stored as written
        options: String,
    },
    /// `DBPointer` (deprecated)
    DbPointer {
        /// Target namespace
        namespace: String,
        /// Target identifier
        id: ObjectId,
    },
    /// JavaScript code
    JavaScriptCode(String),
    /// Symbol (deprecated)
    Symbol(String),
    /// JavaScript code with a scope document (deprecated)
    JavaScriptCodeWithScope {
        /// Code source
        code: String,
        /// Variable scope
        scope: Document,
    },
    /// 32-bit signed integer
    Int32(i32),
    /// Replication timestamp
    Timestamp {
        /// Seconds since the epoch
        time: u32,
        /// Ordinal within the second
        increment: u32,
    },
    /// 64-bit signed integer
    Int64(i64),
    /// 128-bit decimal, kept as its raw little-endian bytes
    Decimal128([u8; 16]),
    /// Max key sentinel
    MaxKey,
    /// Min key sentinel
    MinKey,
}

impl Value {
    /// The element type this value encodes as.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) => ElementType::Document,
            Value::Array(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::Undefined => ElementType::Undefined,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Boolean(_) => ElementType::Boolean,
            Value::DateTime(_) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::RegularExpression { .. } => ElementType::RegularExpression,
            Value::DbPointer { .. } => ElementType::DbPointer,
            Value::JavaScriptCode(_) => ElementType::JavaScriptCode,
            Value::Symbol(_) => ElementType::Symbol,
            Value::JavaScriptCodeWithScope { .. } => ElementType::JavaScriptCodeWithScope,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp { .. } => ElementType::Timestamp,
            Value::Int64(_) => ElementType::Int64,
            Value::Decimal128(_) => ElementType::Decimal128,
            Value::MaxKey => ElementType::MaxKey,
            Value::MinKey => ElementType::MinKey,
        }
    }

    /// Borrow the string content of a `String` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow an embedded document.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Borrow the elements of an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get an integer value, widening `Int32` to `i64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(*n as i64),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get any numeric value as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Int32(n) => Some(*n as f64),
            Value::Int64(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get an object identifier.
    #[must_use]
    pub const fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Get a datetime in milliseconds since the epoch.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<i64> {
        match self {
            Value::DateTime(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Whether this is `Null` (or the deprecated `Undefined`).
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
