//! Parsing a single self-describing document payload.
//!
//! A payload is laid out as
//!
//! ```text
//! int32 total_length | element* | 0x00
//! element = tag:u8 | key:cstring | value
//! ```
//!
//! All integers are little-endian. Embedded documents and arrays carry their
//! own length prefix and are parsed from exactly that many bytes, so a bad
//! inner length is caught at the boundary of the enclosing document rather
//! than spilling into the next record.
//!
//! [`parse_document`] is the only entry point; the stream decoder in
//! [`crate::stream`] hands it one framed slice at a time.

use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::value::{Binary, ElementType, ObjectId, Value};

/// Maximum depth of embedded documents and arrays accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Smallest possible document: a length prefix and the terminator.
pub const MIN_DOCUMENT_SIZE: usize = 5;

/// Binary subtype whose payload repeats its own length ("old binary").
const BINARY_SUBTYPE_OLD: u8 = 0x02;

/// Parse one complete document.
///
/// The slice must hold exactly one document: its declared length has to
/// equal `bytes.len()` and the last byte has to be the 0x00 terminator.
///
/// # Examples
///
/// ```
/// use bsonrec::decoder::parse_document;
///
/// // {"a": 1} as int32
/// let bytes = [12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0];
/// let doc = parse_document(&bytes)?;
/// assert_eq!(doc.get("a").and_then(|v| v.as_i64()), Some(1));
/// # Ok::<(), bsonrec::BsonError>(())
/// ```
///
/// # Errors
///
/// Returns an error if the payload is truncated, has inconsistent lengths,
/// contains an unknown element type, invalid UTF-8, a bad boolean byte, or
/// nests deeper than [`MAX_NESTING_DEPTH`].
pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    DocumentParser::new(bytes, 0, 0).parse()
}

/// Cursor over the bytes of one (possibly embedded) document.
struct DocumentParser<'a> {
    data: &'a [u8],
    pos: usize,
    /// Offset of `data` within the outermost payload, for error positions
    base: usize,
    depth: usize,
}

impl<'a> DocumentParser<'a> {
    fn new(data: &'a [u8], base: usize, depth: usize) -> Self {
        DocumentParser {
            data,
            pos: 0,
            base,
            depth,
        }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn parse(mut self) -> Result<Document> {
        if self.depth > MAX_NESTING_DEPTH {
            return Err(BsonError::NestingTooDeep(MAX_NESTING_DEPTH));
        }

        let declared = self.read_i32()?;
        let len = self.data.len();
        if usize::try_from(declared).ok() != Some(len) || len < MIN_DOCUMENT_SIZE {
            return Err(BsonError::InvalidLength(format!(
                "document at byte {} declares {declared} bytes but spans {len}",
                self.base
            )));
        }

        let body_end = len - 1;
        if self.data[body_end] != 0 {
            return Err(BsonError::MissingTerminator(format!(
                "document at byte {} does not end with 0x00",
                self.base
            )));
        }

        let mut document = Document::new();
        while self.pos < body_end {
            let tag = self.read_u8()?;
            if tag == 0 {
                return Err(BsonError::InvalidLength(format!(
                    "terminator at byte {} before declared end {}",
                    self.offset() - 1,
                    self.base + body_end
                )));
            }
            let key = self.read_cstring(body_end)?;
            let Some(element_type) = ElementType::from_tag(tag) else {
                return Err(BsonError::InvalidElementType { tag, key });
            };
            let value = self.read_value(element_type)?;
            document.insert(key, value);
        }

        if self.pos != body_end {
            return Err(BsonError::InvalidLength(format!(
                "last element of document at byte {} overruns its terminator",
                self.base
            )));
        }

        Ok(document)
    }

    fn read_value(&mut self, element_type: ElementType) -> Result<Value> {
        Ok(match element_type {
            ElementType::Double => Value::Double(f64::from_le_bytes(self.read_array()?)),
            ElementType::String => Value::String(self.read_string()?),
            ElementType::Document => Value::Document(self.read_embedded()?),
            ElementType::Array => {
                let items = self.read_embedded()?;
                Value::Array(items.into_iter().map(|(_, v)| v).collect())
            },
            ElementType::Binary => Value::Binary(self.read_binary()?),
            ElementType::Undefined => Value::Undefined,
            ElementType::ObjectId => Value::ObjectId(ObjectId::from_bytes(self.read_array()?)),
            ElementType::Boolean => match self.read_u8()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => return Err(BsonError::InvalidBoolean(other)),
            },
            ElementType::DateTime => Value::DateTime(i64::from_le_bytes(self.read_array()?)),
            ElementType::Null => Value::Null,
            ElementType::RegularExpression => {
                let limit = self.data.len();
                let pattern = self.read_cstring(limit)?;
                let options = self.read_cstring(limit)?;
                Value::RegularExpression { pattern, options }
            },
            ElementType::DbPointer => {
                let namespace = self.read_string()?;
                let id = ObjectId::from_bytes(self.read_array()?);
                Value::DbPointer { namespace, id }
            },
            ElementType::JavaScriptCode => Value::JavaScriptCode(self.read_string()?),
            ElementType::Symbol => Value::Symbol(self.read_string()?),
            ElementType::JavaScriptCodeWithScope => self.read_code_with_scope()?,
            ElementType::Int32 => Value::Int32(self.read_i32()?),
            ElementType::Timestamp => {
                let increment = u32::from_le_bytes(self.read_array()?);
                let time = u32::from_le_bytes(self.read_array()?);
                Value::Timestamp { time, increment }
            },
            ElementType::Int64 => Value::Int64(i64::from_le_bytes(self.read_array()?)),
            ElementType::Decimal128 => Value::Decimal128(self.read_array()?),
            ElementType::MaxKey => Value::MaxKey,
            ElementType::MinKey => Value::MinKey,
        })
    }

    /// Parse an embedded document from exactly the bytes its prefix declares.
    fn read_embedded(&mut self) -> Result<Document> {
        let start = self.pos;
        let declared = i32::from_le_bytes(self.peek_array()?);
        let size = usize::try_from(declared)
            .ok()
            .filter(|&n| n >= MIN_DOCUMENT_SIZE && n <= self.data.len() - start)
            .ok_or_else(|| {
                BsonError::InvalidLength(format!(
                    "embedded document at byte {} declares {declared} bytes, {} available",
                    self.offset(),
                    self.data.len() - start
                ))
            })?;

        let child = DocumentParser::new(
            &self.data[start..start + size],
            self.base + start,
            self.depth + 1,
        );
        let document = child.parse()?;
        self.pos = start + size;
        Ok(document)
    }

    fn read_binary(&mut self) -> Result<Binary> {
        let length = self.read_length("binary")?;
        let subtype = self.read_u8()?;
        let mut bytes = self.read_bytes(length)?;
        if subtype == BINARY_SUBTYPE_OLD {
            let inner = bytes
                .get(..4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .and_then(|n| usize::try_from(n).ok());
            if inner != Some(length.saturating_sub(4)) {
                return Err(BsonError::InvalidLength(format!(
                    "old binary at byte {} has inconsistent inner length",
                    self.offset() - length
                )));
            }
            bytes = &bytes[4..];
        }
        Ok(Binary {
            subtype,
            bytes: bytes.to_vec(),
        })
    }

    fn read_code_with_scope(&mut self) -> Result<Value> {
        let start = self.pos;
        let total = self.read_length("code with scope")?;
        let code = self.read_string()?;
        let scope = self.read_embedded()?;
        if self.pos - start != total {
            return Err(BsonError::InvalidLength(format!(
                "code with scope at byte {} declares {total} bytes but spans {}",
                self.base + start,
                self.pos - start
            )));
        }
        Ok(Value::JavaScriptCodeWithScope { code, scope })
    }

    /// Read a length-prefixed string (the prefix counts the trailing NUL).
    fn read_string(&mut self) -> Result<String> {
        let start = self.offset();
        let length = self.read_length("string")?;
        if length == 0 {
            return Err(BsonError::InvalidLength(format!(
                "string at byte {start} has zero length"
            )));
        }
        let bytes = self.read_bytes(length)?;
        let (text, terminator) = bytes.split_at(length - 1);
        if terminator != [0] {
            return Err(BsonError::MissingTerminator(format!(
                "string at byte {start} is not NUL-terminated"
            )));
        }
        std::str::from_utf8(text)
            .map(str::to_string)
            .map_err(|_| BsonError::InvalidUtf8(format!("string at byte {start}")))
    }

    /// Read a NUL-terminated string that must end before `limit`.
    fn read_cstring(&mut self, limit: usize) -> Result<String> {
        let start = self.offset();
        let window = &self.data[self.pos..limit.max(self.pos)];
        let nul = memchr::memchr(0, window).ok_or_else(|| {
            BsonError::MissingTerminator(format!("cstring at byte {start} has no NUL"))
        })?;
        let text = std::str::from_utf8(&window[..nul])
            .map_err(|_| BsonError::InvalidUtf8(format!("cstring at byte {start}")))?
            .to_string();
        self.pos += nul + 1;
        Ok(text)
    }

    /// Read a non-negative int32 length.
    fn read_length(&mut self, what: &str) -> Result<usize> {
        let at = self.offset();
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| {
            BsonError::InvalidLength(format!("{what} at byte {at} has negative length {raw}"))
        })
    }

    fn read_u8(&mut self) -> Result<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    fn peek_array<const N: usize>(&self) -> Result<[u8; N]> {
        self.data
            .get(self.pos..self.pos + N)
            .and_then(|s| s.try_into().ok())
            .ok_or(BsonError::UnexpectedEof {
                offset: self.offset(),
            })
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.peek_array::<N>()?;
        self.pos += N;
        Ok(bytes)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.data;
        let end = self.pos.checked_add(n).filter(|&end| end <= data.len());
        match end {
            Some(end) => {
                let bytes = &data[self.pos..end];
                self.pos = end;
                Ok(bytes)
            },
            None => Err(BsonError::UnexpectedEof {
                offset: self.offset(),
            }),
        }
    }
}
