//! JSON rendering of decoded documents.
//!
//! Documents are converted to [`serde_json::Value`] with field order
//! preserved. Two shapes are available through [`JsonMode`]:
//!
//! - [`JsonMode::Relaxed`] (default) keeps plain JSON where it is natural:
//!   numbers stay numbers, object ids become their hex string and datetimes
//!   become RFC 3339 strings. Types with no JSON counterpart use Extended JSON
//!   wrappers (`{"$binary": ...}`, `{"$timestamp": ...}`, ...).
//! - [`JsonMode::Canonical`] wraps every typed number and date
//!   (`{"$numberInt": "1"}`, `{"$date": {"$numberLong": "0"}}`,
//!   `{"$oid": "..."}`) so the output can be read back without loss.
//!
//! # Examples
//!
//! ```
//! use bsonrec::json::{to_json, JsonMode};
//! use bsonrec::{Document, Value};
//! use serde_json::json;
//!
//! let doc = Document::builder()
//!     .field("_id", "u1")
//!     .field("visits", 3)
//!     .field("joined", Value::DateTime(1_577_836_800_000))
//!     .build();
//!
//! assert_eq!(
//!     to_json(&doc, JsonMode::Relaxed),
//!     json!({"_id": "u1", "visits": 3, "joined": "2020-01-01T00:00:00.000Z"})
//! );
//! assert_eq!(
//!     to_json(&doc, JsonMode::Canonical)["visits"],
//!     json!({"$numberInt": "3"})
//! );
//! ```

use crate::document::Document;
use crate::error::Result;
use crate::formats::FormatWriter;
use crate::value::{Binary, ObjectId, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde_json::{json, Map, Number, Value as JsonValue};
use std::fmt;
use std::io::Write;

/// Shape of the rendered JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonMode {
    /// Plain JSON where lossless enough for reading (default)
    #[default]
    Relaxed,
    /// Extended JSON canonical wrappers for every typed value
    Canonical,
}

impl fmt::Display for JsonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relaxed => write!(f, "relaxed"),
            Self::Canonical => write!(f, "canonical"),
        }
    }
}

/// Convert a document to a JSON object.
#[must_use]
pub fn to_json(document: &Document, mode: JsonMode) -> JsonValue {
    let fields: Map<String, JsonValue> = document
        .iter()
        .map(|(key, value)| (key.to_string(), value_to_json(value, mode)))
        .collect();
    JsonValue::Object(fields)
}

/// Convert a single value.
#[must_use]
pub fn value_to_json(value: &Value, mode: JsonMode) -> JsonValue {
    let canonical = mode == JsonMode::Canonical;
    match value {
        Value::Double(n) => double_to_json(*n, canonical),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Document(doc) => to_json(doc, mode),
        Value::Array(items) => {
            JsonValue::Array(items.iter().map(|v| value_to_json(v, mode)).collect())
        },
        Value::Binary(binary) => binary_to_json(binary),
        Value::Undefined => json!({"$undefined": true}),
        Value::ObjectId(id) => object_id_to_json(*id, canonical),
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::DateTime(ms) => datetime_to_json(*ms, canonical),
        Value::Null => JsonValue::Null,
        Value::RegularExpression { pattern, options } => json!({
            "$regularExpression": {"pattern": pattern, "options": options}
        }),
        Value::DbPointer { namespace, id } => json!({
            "$dbPointer": {"$ref": namespace, "$id": {"$oid": id.to_hex()}}
        }),
        Value::JavaScriptCode(code) => json!({"$code": code}),
        Value::Symbol(s) => json!({"$symbol": s}),
        Value::JavaScriptCodeWithScope { code, scope } => json!({
            "$code": code,
            "$scope": to_json(scope, mode),
        }),
        Value::Int32(n) => {
            if canonical {
                json!({"$numberInt": n.to_string()})
            } else {
                JsonValue::from(*n)
            }
        },
        Value::Timestamp { time, increment } => json!({
            "$timestamp": {"t": time, "i": increment}
        }),
        Value::Int64(n) => {
            if canonical {
                json!({"$numberLong": n.to_string()})
            } else {
                JsonValue::from(*n)
            }
        },
        Value::Decimal128(bytes) => json!({"$numberDecimal": decimal128_to_string(bytes)}),
        Value::MaxKey => json!({"$maxKey": 1}),
        Value::MinKey => json!({"$minKey": 1}),
    }
}

fn double_to_json(n: f64, canonical: bool) -> JsonValue {
    if !canonical {
        if let Some(number) = Number::from_f64(n) {
            return JsonValue::Number(number);
        }
    }
    json!({"$numberDouble": format_double(n)})
}

/// Extended JSON spelling of a double: non-finite values by name, integral
/// values with a trailing `.0`, very large or small magnitudes in exponent
/// form (`1e+20`, `1e-7`).
fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n != 0.0 && !(1e-6..1e16).contains(&n.abs()) {
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            },
            _ => text,
        }
    } else if n.fract() == 0.0 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

fn object_id_to_json(id: ObjectId, canonical: bool) -> JsonValue {
    if canonical {
        json!({"$oid": id.to_hex()})
    } else {
        JsonValue::String(id.to_hex())
    }
}

/// Render milliseconds since the epoch as an RFC 3339 UTC string.
///
/// Returns `None` outside years 0 through 9999.
#[must_use]
pub fn format_datetime(ms: i64) -> Option<String> {
    let datetime = DateTime::<Utc>::from_timestamp_millis(ms)?;
    (0..=9999)
        .contains(&datetime.year())
        .then(|| datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn datetime_to_json(ms: i64, canonical: bool) -> JsonValue {
    if !canonical {
        if let Some(text) = format_datetime(ms) {
            return JsonValue::String(text);
        }
    }
    json!({"$date": {"$numberLong": ms.to_string()}})
}

fn binary_to_json(binary: &Binary) -> JsonValue {
    json!({
        "$binary": {
            "base64": STANDARD.encode(&binary.bytes),
            "subType": format!("{:02x}", binary.subtype),
        }
    })
}

/// Bias applied to the stored decimal128 exponent.
const DECIMAL128_EXPONENT_BIAS: i32 = 6176;

/// Render an IEEE 754-2008 decimal128 (BID encoding) as a decimal string.
fn decimal128_to_string(bytes: &[u8; 16]) -> String {
    let bits = u128::from_le_bytes(*bytes);
    let negative = bits >> 127 == 1;
    let sign = if negative { "-" } else { "" };

    let combination = (bits >> 122) & 0x1F;
    if combination == 0x1F {
        return "NaN".to_string();
    }
    if combination == 0x1E {
        return format!("{sign}Infinity");
    }

    let (biased_exponent, coefficient) = if (bits >> 125) & 0b11 == 0b11 {
        // large-coefficient form; always above the maximum, so zero
        ((bits >> 111) & 0x3FFF, 0)
    } else {
        ((bits >> 113) & 0x3FFF, bits & ((1u128 << 113) - 1))
    };
    let coefficient = if coefficient >= 10u128.pow(34) {
        0
    } else {
        coefficient
    };
    // 14-bit field, fits in i32
    let exponent = i32::try_from(biased_exponent).unwrap_or(0) - DECIMAL128_EXPONENT_BIAS;

    let digits = coefficient.to_string();
    let digit_count = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let adjusted = exponent + digit_count - 1;

    if exponent <= 0 && adjusted >= -6 {
        if exponent == 0 {
            return format!("{sign}{digits}");
        }
        let scale = exponent.unsigned_abs() as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            format!("{sign}{int_part}.{frac_part}")
        } else {
            let zeros = "0".repeat(scale - digits.len());
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            first.to_string()
        } else {
            format!("{first}.{rest}")
        };
        format!("{sign}{mantissa}E{adjusted:+}")
    }
}

/// Serialize a document as pretty-printed JSON text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_string(document: &Document, mode: JsonMode) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json(document, mode))?)
}

/// Writer producing one pretty-printed JSON array of documents.
///
/// Output is identical to pretty-printing the whole array at once, with
/// two-space indentation, but documents are streamed as they arrive. The
/// array is closed by [`finish`](Self::finish).
///
/// ```
/// use bsonrec::json::{JsonArrayWriter, JsonMode};
/// use bsonrec::Document;
///
/// let mut out = Vec::new();
/// let mut writer = JsonArrayWriter::new(&mut out, JsonMode::Relaxed);
/// writer.write_document(&Document::builder().field("n", 1).build())?;
/// writer.finish()?;
/// drop(writer);
///
/// assert_eq!(String::from_utf8(out).unwrap(), "[\n  {\n    \"n\": 1\n  }\n]");
/// # Ok::<(), bsonrec::BsonError>(())
/// ```
#[derive(Debug)]
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    mode: JsonMode,
    records_written: usize,
    finished: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a writer rendering documents in `mode`.
    pub fn new(writer: W, mode: JsonMode) -> Self {
        JsonArrayWriter {
            writer,
            mode,
            records_written: 0,
            finished: false,
        }
    }

    /// Append one document to the array.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer was finished, or on I/O failure.
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        if self.finished {
            return Err(crate::BsonError::InvalidRecord(
                "Cannot write to a finished writer".to_string(),
            ));
        }
        let text = to_json_string(document, self.mode)?;
        let separator = if self.records_written == 0 { "[\n  " } else { ",\n  " };
        self.writer.write_all(separator.as_bytes())?;
        // JSON strings never hold raw newlines, so this only re-indents structure
        self.writer.write_all(text.replace('\n', "\n  ").as_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Close the array and flush.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn finish(&mut self) -> Result<()> {
        if !self.finished {
            let closing: &[u8] = if self.records_written == 0 { b"[]" } else { b"\n]" };
            self.writer.write_all(closing)?;
            self.finished = true;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Number of documents written.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Consume the writer and return the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + fmt::Debug> FormatWriter for JsonArrayWriter<W> {
    fn write_record(&mut self, document: &Document) -> Result<()> {
        self.write_document(document)
    }

    fn finish(&mut self) -> Result<()> {
        JsonArrayWriter::finish(self)
    }

    fn records_written(&self) -> Option<usize> {
        Some(self.records_written)
    }
}
