//! Writing documents in the dump's binary layout.
//!
//! This module provides [`encode_document`] for serializing a single
//! [`Document`] and [`BsonWriter`] for writing length-prefixed documents
//! back-to-back to any destination implementing [`std::io::Write`], which is
//! exactly the layout the stream decoder reads.
//!
//! # Examples
//!
//! ```
//! use bsonrec::{decode, BsonWriter, Document};
//!
//! let mut buffer = Vec::new();
//! {
//!     let mut writer = BsonWriter::new(&mut buffer);
//!     writer.write_document(&Document::builder().field("_id", "a").build())?;
//!     writer.write_document(&Document::builder().field("_id", "b").build())?;
//!     writer.finish()?;
//! }
//!
//! assert_eq!(decode(&buffer).len(), 2);
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::formats::FormatWriter;
use crate::value::{ObjectId, Value};
use std::io::Write;

/// Binary subtype whose payload repeats its own length ("old binary").
const BINARY_SUBTYPE_OLD: u8 = 0x02;

/// Encode one document to its binary form.
///
/// # Errors
///
/// Returns an error if a key contains a NUL byte, or if a document, string
/// or binary value is too large for an int32 length prefix.
pub fn encode_document(document: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    write_document(&mut buf, document.iter())?;
    Ok(buf)
}

fn write_document<'a>(
    buf: &mut Vec<u8>,
    fields: impl Iterator<Item = (&'a str, &'a Value)>,
) -> Result<()> {
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    for (key, value) in fields {
        write_element(buf, key, value)?;
    }
    buf.push(0);
    patch_length(buf, start)
}

fn write_array(buf: &mut Vec<u8>, items: &[Value]) -> Result<()> {
    let start = buf.len();
    buf.extend_from_slice(&[0; 4]);
    for (index, item) in items.iter().enumerate() {
        write_element(buf, &index.to_string(), item)?;
    }
    buf.push(0);
    patch_length(buf, start)
}

/// Fill in the int32 length placeholder at `start` with the bytes written since.
fn patch_length(buf: &mut [u8], start: usize) -> Result<()> {
    let length = to_i32(buf.len() - start, "document")?;
    buf[start..start + 4].copy_from_slice(&length.to_le_bytes());
    Ok(())
}

fn write_element(buf: &mut Vec<u8>, key: &str, value: &Value) -> Result<()> {
    buf.push(value.element_type().tag());
    write_cstring(buf, key)?;

    match value {
        Value::Double(n) => buf.extend_from_slice(&n.to_le_bytes()),
        Value::String(s) | Value::JavaScriptCode(s) | Value::Symbol(s) => write_string(buf, s)?,
        Value::Document(doc) => write_document(buf, doc.iter())?,
        Value::Array(items) => write_array(buf, items)?,
        Value::Binary(binary) => {
            if binary.subtype == BINARY_SUBTYPE_OLD {
                let inner = to_i32(binary.bytes.len(), "binary")?;
                let outer = to_i32(binary.bytes.len() + 4, "binary")?;
                buf.extend_from_slice(&outer.to_le_bytes());
                buf.push(binary.subtype);
                buf.extend_from_slice(&inner.to_le_bytes());
            } else {
                let length = to_i32(binary.bytes.len(), "binary")?;
                buf.extend_from_slice(&length.to_le_bytes());
                buf.push(binary.subtype);
            }
            buf.extend_from_slice(&binary.bytes);
        },
        Value::Undefined | Value::Null | Value::MaxKey | Value::MinKey => {},
        Value::ObjectId(id) => write_object_id(buf, *id),
        Value::Boolean(b) => buf.push(u8::from(*b)),
        Value::DateTime(ms) | Value::Int64(ms) => buf.extend_from_slice(&ms.to_le_bytes()),
        Value::RegularExpression { pattern, options } => {
            write_cstring(buf, pattern)?;
            write_cstring(buf, options)?;
        },
        Value::DbPointer { namespace, id } => {
            write_string(buf, namespace)?;
            write_object_id(buf, *id);
        },
        Value::JavaScriptCodeWithScope { code, scope } => {
            let start = buf.len();
            buf.extend_from_slice(&[0; 4]);
            write_string(buf, code)?;
            write_document(buf, scope.iter())?;
            patch_length(buf, start)?;
        },
        Value::Int32(n) => buf.extend_from_slice(&n.to_le_bytes()),
        Value::Timestamp { time, increment } => {
            buf.extend_from_slice(&increment.to_le_bytes());
            buf.extend_from_slice(&time.to_le_bytes());
        },
        Value::Decimal128(bytes) => buf.extend_from_slice(bytes),
    }
    Ok(())
}

fn write_cstring(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if memchr::memchr(0, s.as_bytes()).is_some() {
        return Err(BsonError::InvalidKey(s.to_string()));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    let length = to_i32(s.len() + 1, "string")?;
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

fn write_object_id(buf: &mut Vec<u8>, id: ObjectId) {
    buf.extend_from_slice(&id.bytes());
}

fn to_i32(length: usize, what: &str) -> Result<i32> {
    i32::try_from(length)
        .map_err(|_| BsonError::InvalidLength(format!("{what} of {length} bytes is too large")))
}

/// Writer for length-prefixed document streams.
///
/// `BsonWriter` serializes [`Document`] instances one after another to any
/// destination implementing [`std::io::Write`]. The output has no header or
/// footer; each document's own length prefix is its frame.
#[derive(Debug)]
pub struct BsonWriter<W: Write> {
    writer: W,
    records_written: usize,
    finished: bool,
}

impl<W: Write> BsonWriter<W> {
    /// Create a new writer.
    pub fn new(writer: W) -> Self {
        BsonWriter {
            writer,
            records_written: 0,
            finished: false,
        }
    }

    /// Write a single document.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer was already finished, the document
    /// cannot be encoded, or an I/O error occurs.
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        if self.finished {
            return Err(BsonError::InvalidRecord(
                "Cannot write to a finished writer".to_string(),
            ));
        }
        let bytes = encode_document(document)?;
        self.writer.write_all(&bytes)?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush the destination and refuse further writes.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Number of documents written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Consume the writer and return the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + std::fmt::Debug> FormatWriter for BsonWriter<W> {
    fn write_record(&mut self, document: &Document) -> Result<()> {
        self.write_document(document)
    }

    fn finish(&mut self) -> Result<()> {
        BsonWriter::finish(self)
    }

    fn records_written(&self) -> Option<usize> {
        Some(self.records_written)
    }
}
