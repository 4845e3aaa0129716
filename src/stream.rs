//! Decoding a dump stream: back-to-back length-prefixed documents.
//!
//! A dump file has no header, footer or record count. Each record is
//!
//! ```text
//! int32 declared_size (little-endian, prefix included) | payload
//! ```
//!
//! and the next record starts exactly `declared_size` bytes later. Decoding
//! walks a single cursor from offset 0:
//!
//! 1. fewer than four bytes left: stop;
//! 2. read `declared_size`;
//! 3. `declared_size <= 0`, or the record runs past the buffer: stop;
//! 4. parse exactly `declared_size` bytes as one document;
//! 5. keep it and advance the cursor by `declared_size`.
//!
//! Stopping is never an error for [`decode`]: whatever decoded cleanly before
//! the damage is returned. [`decode_with_report`] returns the same documents
//! together with the number of bytes consumed and the [`StopReason`], so a
//! caller can tell a clean end of file from a truncated one.
//!
//! # Examples
//!
//! ```
//! use bsonrec::{decode, decode_with_report, encode_document, Document, StopReason};
//!
//! let mut buffer = encode_document(&Document::builder().field("_id", "a").build())?;
//! buffer.extend(encode_document(&Document::builder().field("_id", "b").build())?);
//! buffer.extend_from_slice(&[0xFF, 0xFF]);
//!
//! assert_eq!(decode(&buffer).len(), 2);
//!
//! let outcome = decode_with_report(&buffer);
//! assert_eq!(outcome.documents.len(), 2);
//! assert!(outcome.truncated());
//! assert!(matches!(outcome.stop, StopReason::TrailingBytes { remaining: 2, .. }));
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::boundary_scanner::{next_frame, FrameStep};
use crate::decoder::parse_document;
use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::formats::FormatReader;
use crate::recovery::{RecoveryMode, SkippedRecord};
use std::fmt;

/// Why decoding of a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The cursor reached the end of the buffer exactly
    EndOfStream,
    /// One to three bytes remained, too few for a length prefix
    TrailingBytes {
        /// Offset of the stray bytes
        offset: usize,
        /// How many bytes remained
        remaining: usize,
    },
    /// The length prefix was zero or negative
    InvalidSize {
        /// Offset of the prefix
        offset: usize,
        /// The declared value
        declared: i32,
    },
    /// The length prefix declared more bytes than the buffer holds
    SizeExceedsBuffer {
        /// Offset of the prefix
        offset: usize,
        /// The declared length
        declared: usize,
        /// Bytes actually left from `offset`
        available: usize,
    },
    /// The record was framed correctly but its payload did not parse
    MalformedDocument {
        /// Offset of the record
        offset: usize,
        /// Declared length of the record
        length: usize,
        /// Parse error
        error: String,
    },
}

impl StopReason {
    /// Whether the stream ended exactly at a record boundary.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, StopReason::EndOfStream)
    }

    /// Offset at which the anomaly was found, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            StopReason::EndOfStream => None,
            StopReason::TrailingBytes { offset, .. }
            | StopReason::InvalidSize { offset, .. }
            | StopReason::SizeExceedsBuffer { offset, .. }
            | StopReason::MalformedDocument { offset, .. } => Some(*offset),
        }
    }

    /// Convert an anomaly into the error strict decoding reports.
    ///
    /// Returns `None` for a clean end of stream.
    #[must_use]
    pub fn to_error(&self) -> Option<BsonError> {
        match self {
            StopReason::EndOfStream => None,
            StopReason::TrailingBytes { .. } | StopReason::SizeExceedsBuffer { .. } => {
                Some(BsonError::TruncatedRecord(self.to_string()))
            },
            StopReason::InvalidSize { .. } | StopReason::MalformedDocument { .. } => {
                Some(BsonError::InvalidRecord(self.to_string()))
            },
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::TrailingBytes { offset, remaining } => {
                write!(f, "{remaining} trailing bytes at offset {offset}")
            },
            StopReason::InvalidSize { offset, declared } => {
                write!(f, "invalid declared size {declared} at offset {offset}")
            },
            StopReason::SizeExceedsBuffer {
                offset,
                declared,
                available,
            } => write!(
                f,
                "declared size {declared} at offset {offset} exceeds the {available} bytes remaining"
            ),
            StopReason::MalformedDocument {
                offset,
                length,
                error,
            } => write!(f, "malformed {length}-byte document at offset {offset}: {error}"),
        }
    }
}

/// Everything a full decode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    /// Decoded documents in file order
    pub documents: Vec<Document>,
    /// Bytes consumed by accepted (and, in permissive mode, skipped) records
    pub bytes_consumed: usize,
    /// Why decoding ended
    pub stop: StopReason,
    /// Records skipped in [`RecoveryMode::Permissive`]
    pub skipped: Vec<SkippedRecord>,
}

impl DecodeOutcome {
    /// True when every byte was decoded and nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stop.is_clean() && self.skipped.is_empty()
    }

    /// True when decoding stopped early or skipped records.
    #[must_use]
    pub fn truncated(&self) -> bool {
        !self.is_clean()
    }

    /// Number of decoded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Lazy decoder over a borrowed buffer.
///
/// Yields documents in file order. Once the iterator returns `None`,
/// [`stop_reason`](Self::stop_reason) tells why and
/// [`position`](Self::position) how far it got.
///
/// ```
/// use bsonrec::{encode_document, Document, StreamDecoder};
///
/// let buffer = encode_document(&Document::builder().field("n", 1).build())?;
/// let mut decoder = StreamDecoder::new(&buffer);
/// assert!(decoder.next().is_some());
/// assert!(decoder.next().is_none());
/// assert!(decoder.stop_reason().unwrap().is_clean());
/// assert_eq!(decoder.position(), buffer.len());
/// # Ok::<(), bsonrec::BsonError>(())
/// ```
#[derive(Debug)]
pub struct StreamDecoder<'a> {
    buffer: &'a [u8],
    cursor: usize,
    mode: RecoveryMode,
    stop: Option<StopReason>,
    last_error: Option<BsonError>,
    error_reported: bool,
    skipped: Vec<SkippedRecord>,
    documents_decoded: usize,
}

impl<'a> StreamDecoder<'a> {
    /// Create a decoder in the default ([`RecoveryMode::Lenient`]) mode.
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_mode(buffer, RecoveryMode::default())
    }

    /// Create a decoder with an explicit recovery mode.
    #[must_use]
    pub fn with_mode(buffer: &'a [u8], mode: RecoveryMode) -> Self {
        StreamDecoder {
            buffer,
            cursor: 0,
            mode,
            stop: None,
            last_error: None,
            error_reported: false,
            skipped: Vec::new(),
            documents_decoded: 0,
        }
    }

    /// Current cursor offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Why decoding stopped, once it has.
    #[must_use]
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop.as_ref()
    }

    /// Records skipped so far (permissive mode only).
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Number of documents yielded so far.
    #[must_use]
    pub fn documents_decoded(&self) -> usize {
        self.documents_decoded
    }

    /// Decode every remaining document and report how decoding ended.
    #[must_use]
    pub fn decode_all(mut self) -> DecodeOutcome {
        let documents: Vec<Document> = self.by_ref().collect();
        self.into_outcome(documents)
    }

    fn into_outcome(self, documents: Vec<Document>) -> DecodeOutcome {
        DecodeOutcome {
            documents,
            bytes_consumed: self.cursor,
            stop: self.stop.unwrap_or(StopReason::EndOfStream),
            skipped: self.skipped,
        }
    }

    /// The error strict decoding reports for the way this stream ended.
    ///
    /// Prefers the original parse error of a malformed record over the
    /// summarised stop reason.
    fn strict_error(&mut self) -> Option<BsonError> {
        let reason = self.stop.as_ref()?;
        if reason.is_clean() {
            return None;
        }
        let offset = reason.offset().unwrap_or(self.cursor);
        match self.last_error.take() {
            Some(error) => Some(BsonError::InvalidRecord(format!(
                "document at offset {offset}: {error}"
            ))),
            None => reason.to_error(),
        }
    }
}

impl Iterator for StreamDecoder<'_> {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        if self.stop.is_some() {
            return None;
        }

        loop {
            let (offset, length) = match next_frame(self.buffer, self.cursor) {
                FrameStep::Frame { offset, length } => (offset, length),
                FrameStep::Stop(reason) => {
                    self.stop = Some(reason);
                    return None;
                },
            };

            match parse_document(&self.buffer[offset..offset + length]) {
                Ok(document) => {
                    self.cursor = offset + length;
                    self.documents_decoded += 1;
                    return Some(document);
                },
                Err(error) if self.mode == RecoveryMode::Permissive => {
                    self.skipped.push(SkippedRecord {
                        offset,
                        length,
                        error: error.to_string(),
                    });
                    self.cursor = offset + length;
                },
                Err(error) => {
                    self.stop = Some(StopReason::MalformedDocument {
                        offset,
                        length,
                        error: error.to_string(),
                    });
                    self.last_error = Some(error);
                    return None;
                },
            }
        }
    }
}

impl FormatReader for StreamDecoder<'_> {
    fn read_record(&mut self) -> Result<Option<Document>> {
        if let Some(document) = self.next() {
            return Ok(Some(document));
        }
        // a strict stop is reported once, then the source reads as exhausted
        if self.mode == RecoveryMode::Strict && !self.error_reported {
            self.error_reported = true;
            if let Some(error) = self.strict_error() {
                return Err(error);
            }
        }
        Ok(None)
    }

    fn records_read(&self) -> Option<usize> {
        Some(self.documents_decoded)
    }
}

/// Decode every document in a dump buffer.
///
/// Never fails: decoding stops at the first truncated or malformed record and
/// returns the documents before it.
#[must_use]
pub fn decode(buffer: &[u8]) -> Vec<Document> {
    StreamDecoder::new(buffer).collect()
}

/// Decode a dump buffer and report how far decoding got and why it stopped.
#[must_use]
pub fn decode_with_report(buffer: &[u8]) -> DecodeOutcome {
    StreamDecoder::new(buffer).decode_all()
}

/// Decode a dump buffer with an explicit recovery mode.
///
/// [`RecoveryMode::Strict`] behaves like [`RecoveryMode::Lenient`] here; use
/// [`try_decode`] to turn anomalies into errors.
#[must_use]
pub fn decode_with_mode(buffer: &[u8], mode: RecoveryMode) -> DecodeOutcome {
    StreamDecoder::with_mode(buffer, mode).decode_all()
}

/// Decode a dump buffer, failing in strict mode on any anomaly.
///
/// # Errors
///
/// In [`RecoveryMode::Strict`], returns an error if the stream has trailing
/// bytes, a bad length prefix, a record running past the end, or a payload
/// that does not parse. Other modes never fail.
pub fn try_decode(buffer: &[u8], mode: RecoveryMode) -> Result<DecodeOutcome> {
    let mut decoder = StreamDecoder::with_mode(buffer, mode);
    let documents: Vec<Document> = decoder.by_ref().collect();
    if mode == RecoveryMode::Strict {
        if let Some(error) = decoder.strict_error() {
            return Err(error);
        }
    }
    Ok(decoder.into_outcome(documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::writer::encode_document;

    fn user(id: &str, role: &str) -> Document {
        Document::builder().field("_id", id).field("role", role).build()
    }

    fn stream(documents: &[Document]) -> Vec<u8> {
        documents
            .iter()
            .flat_map(|d| encode_document(d).unwrap())
            .collect()
    }

    /// A correctly framed record whose payload holds a bad boolean byte.
    fn malformed_record() -> Vec<u8> {
        let mut bytes = encode_document(&Document::builder().field("ok", true).build()).unwrap();
        let flag = bytes.len() - 2;
        bytes[flag] = 0x07;
        bytes
    }

    #[test]
    fn test_two_documents_in_order() {
        let docs = vec![user("a", "root"), user("b", "viewer")];
        let decoded = decode(&stream(&docs));
        assert_eq!(decoded, docs);
    }

    #[test]
    fn test_empty_buffer() {
        assert!(decode(&[]).is_empty());
        let outcome = decode_with_report(&[]);
        assert!(outcome.is_clean());
        assert_eq!(outcome.bytes_consumed, 0);
    }

    #[test]
    fn test_clean_report() {
        let buffer = stream(&[user("a", "root")]);
        let outcome = decode_with_report(&buffer);
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.bytes_consumed, buffer.len());
        assert_eq!(outcome.stop, StopReason::EndOfStream);
        assert!(!outcome.truncated());
    }

    #[test]
    fn test_trailing_bytes_are_not_an_error() {
        for extra in 1..=3 {
            let mut buffer = stream(&[user("a", "root"), user("b", "viewer")]);
            let clean_len = buffer.len();
            buffer.extend(std::iter::repeat(0xEE).take(extra));

            let outcome = decode_with_report(&buffer);
            assert_eq!(outcome.len(), 2);
            assert_eq!(outcome.bytes_consumed, clean_len);
            assert_eq!(
                outcome.stop,
                StopReason::TrailingBytes {
                    offset: clean_len,
                    remaining: extra
                }
            );
        }
    }

    #[test]
    fn test_oversized_length_stops() {
        let mut buffer = stream(&[user("a", "root")]);
        buffer.extend_from_slice(&9999i32.to_le_bytes());
        buffer.extend_from_slice(&[0; 6]);

        let decoded = decode(&buffer);
        assert_eq!(decoded, vec![user("a", "root")]);
        assert!(matches!(
            decode_with_report(&buffer).stop,
            StopReason::SizeExceedsBuffer {
                declared: 9999,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_length_stops() {
        let mut buffer = stream(&[user("a", "root")]);
        buffer.extend_from_slice(&(-20i32).to_le_bytes());
        buffer.extend(stream(&[user("b", "viewer")]));

        let outcome = decode_with_report(&buffer);
        assert_eq!(outcome.len(), 1);
        assert!(matches!(
            outcome.stop,
            StopReason::InvalidSize { declared: -20, .. }
        ));
    }

    #[test]
    fn test_malformed_payload_stops_and_keeps_prefix() {
        let mut buffer = stream(&[user("a", "root")]);
        let bad_offset = buffer.len();
        buffer.extend(malformed_record());
        buffer.extend(stream(&[user("b", "viewer")]));

        let outcome = decode_with_report(&buffer);
        assert_eq!(outcome.documents, vec![user("a", "root")]);
        assert_eq!(outcome.bytes_consumed, bad_offset);
        match &outcome.stop {
            StopReason::MalformedDocument { offset, error, .. } => {
                assert_eq!(*offset, bad_offset);
                assert!(error.contains("boolean"), "got: {error}");
            },
            other => panic!("unexpected stop: {other}"),
        }
    }

    #[test]
    fn test_permissive_skips_malformed_payload() {
        let mut buffer = stream(&[user("a", "root")]);
        let bad_offset = buffer.len();
        let bad = malformed_record();
        buffer.extend(&bad);
        buffer.extend(stream(&[user("b", "viewer")]));

        let outcome = decode_with_mode(&buffer, RecoveryMode::Permissive);
        assert_eq!(outcome.documents, vec![user("a", "root"), user("b", "viewer")]);
        assert_eq!(outcome.stop, StopReason::EndOfStream);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].offset, bad_offset);
        assert_eq!(outcome.skipped[0].length, bad.len());
        assert!(outcome.truncated());
    }

    #[test]
    fn test_strict_mode_errors() {
        let mut buffer = stream(&[user("a", "root")]);
        assert!(try_decode(&buffer, RecoveryMode::Strict).is_ok());

        buffer.push(0x01);
        let err = try_decode(&buffer, RecoveryMode::Strict).unwrap_err();
        assert!(matches!(err, BsonError::TruncatedRecord(_)), "got: {err}");

        let mut malformed = stream(&[user("a", "root")]);
        malformed.extend(malformed_record());
        let err = try_decode(&malformed, RecoveryMode::Strict).unwrap_err();
        assert!(err.to_string().contains("boolean"), "got: {err}");

        // Lenient mode reports instead of failing
        let outcome = try_decode(&malformed, RecoveryMode::Lenient).unwrap();
        assert_eq!(outcome.len(), 1);
    }

    #[test]
    fn test_iterator_is_lazy() {
        let buffer = stream(&[user("a", "root"), user("b", "viewer")]);
        let mut decoder = StreamDecoder::new(&buffer);

        let first = decoder.next().unwrap();
        assert_eq!(first.get_str("_id"), Some("a"));
        assert!(decoder.stop_reason().is_none());
        assert!(decoder.position() < buffer.len());

        assert!(decoder.next().is_some());
        assert!(decoder.next().is_none());
        assert!(decoder.next().is_none());
        assert_eq!(decoder.documents_decoded(), 2);
        assert_eq!(decoder.position(), buffer.len());
    }

    #[test]
    fn test_format_reader_strict() {
        let mut buffer = stream(&[user("a", "root")]);
        buffer.extend_from_slice(&[0, 0]);

        let mut lenient = StreamDecoder::new(&buffer);
        assert_eq!(lenient.read_all().unwrap().len(), 1);

        let mut strict = StreamDecoder::with_mode(&buffer, RecoveryMode::Strict);
        assert!(strict.read_record().unwrap().is_some());
        assert!(strict.read_record().is_err());
    }

    #[test]
    fn test_nested_values_preserved() {
        let doc = Document::builder()
            .field("_id", "c")
            .field(
                "dc",
                Document::builder()
                    .field("title", "X")
                    .field("creator", vec!["Y", "Z"])
                    .build(),
            )
            .build();
        let decoded = decode(&stream(&[doc]));
        let dc = decoded[0].get_document("dc").unwrap();
        assert_eq!(dc.get_str("title"), Some("X"));
        assert_eq!(
            dc.get_array("creator").unwrap(),
            &[Value::from("Y"), Value::from("Z")]
        );
    }

    #[test]
    fn test_stop_reason_display() {
        let reason = StopReason::SizeExceedsBuffer {
            offset: 30,
            declared: 9999,
            available: 10,
        };
        assert_eq!(
            reason.to_string(),
            "declared size 9999 at offset 30 exceeds the 10 bytes remaining"
        );
        assert_eq!(reason.offset(), Some(30));
        assert!(StopReason::EndOfStream.to_error().is_none());
    }
}
