//! Reading documents from dump streams.
//!
//! This module provides [`BsonReader`] for reading length-prefixed documents
//! one at a time from any source that implements [`std::io::Read`], without
//! loading the whole file into memory.
//!
//! # Examples
//!
//! Reading documents from a file:
//!
//! ```no_run
//! use bsonrec::BsonReader;
//! use std::fs::File;
//!
//! let file = File::open("data/db/users.bson")?;
//! let mut reader = BsonReader::new(file);
//!
//! while let Some(document) = reader.read_document()? {
//!     println!("{:?}", document.get_str("_id"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Reading from a buffer:
//!
//! ```
//! use bsonrec::{encode_document, BsonReader, Document};
//! use std::io::Cursor;
//!
//! let bytes = encode_document(&Document::builder().field("_id", "a").build())?;
//! let mut reader = BsonReader::new(Cursor::new(bytes));
//!
//! assert!(reader.read_document()?.is_some());
//! assert!(reader.read_document()?.is_none());
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::boundary_scanner::PREFIX_WIDTH;
use crate::decoder::parse_document;
use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::formats::FormatReader;
use crate::recovery::{RecoveryMode, SkippedRecord};
use std::io::{ErrorKind, Read};

/// Reader for length-prefixed document streams.
///
/// `BsonReader` reads one document at a time. It applies the same framing
/// rules as [`crate::stream::StreamDecoder`] but pulls bytes from the source
/// as it goes:
///
/// - end of input at a record boundary ends the stream;
/// - a short length prefix, short payload, or non-positive length is a
///   [`BsonError::TruncatedRecord`] / [`BsonError::InvalidRecord`] in
///   [`RecoveryMode::Strict`] and a quiet end of stream otherwise;
/// - a payload that does not parse is an error, except in
///   [`RecoveryMode::Permissive`] where it is skipped.
#[derive(Debug)]
pub struct BsonReader<R: Read> {
    reader: R,
    recovery_mode: RecoveryMode,
    records_read: usize,
    position: usize,
    skipped: Vec<SkippedRecord>,
    exhausted: bool,
    /// Prefix bytes past the end of a record shorter than its own prefix
    carry: Vec<u8>,
}

impl<R: Read> BsonReader<R> {
    /// Create a new reader in the default recovery mode.
    pub fn new(reader: R) -> Self {
        BsonReader {
            reader,
            recovery_mode: RecoveryMode::default(),
            records_read: 0,
            position: 0,
            skipped: Vec::new(),
            exhausted: false,
            carry: Vec::new(),
        }
    }

    /// Set the recovery mode for handling truncated or malformed records.
    ///
    /// ```
    /// use bsonrec::{BsonReader, RecoveryMode};
    /// use std::io::Cursor;
    ///
    /// let reader = BsonReader::new(Cursor::new(Vec::new()))
    ///     .with_recovery_mode(RecoveryMode::Strict);
    /// ```
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery_mode = mode;
        self
    }

    /// Read a single document.
    ///
    /// Returns `Ok(Some(document))` if a document was read and `Ok(None)` at
    /// the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream is truncated or has a bad length prefix (strict mode only)
    /// - A payload does not parse (strict and lenient modes)
    /// - An I/O error occurs
    pub fn read_document(&mut self) -> Result<Option<Document>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            let offset = self.position;
            let mut prefix = [0u8; PREFIX_WIDTH];
            let got = self.fill(&mut prefix)?;
            if got == 0 {
                self.exhausted = true;
                return Ok(None);
            }
            if got < PREFIX_WIDTH {
                return self.stop(BsonError::TruncatedRecord(format!(
                    "{got} trailing bytes at offset {offset}"
                )));
            }

            let declared = i32::from_le_bytes(prefix);
            let Some(length) = usize::try_from(declared).ok().filter(|&n| n > 0) else {
                return self.stop(BsonError::InvalidRecord(format!(
                    "invalid declared size {declared} at offset {offset}"
                )));
            };

            let mut record = Vec::with_capacity(length.min(64 * 1024));
            if length < PREFIX_WIDTH {
                // the next record starts inside this prefix
                record.extend_from_slice(&prefix[..length]);
                self.carry.extend_from_slice(&prefix[length..]);
                self.position -= PREFIX_WIDTH - length;
            } else {
                record.extend_from_slice(&prefix);
            }
            if length > PREFIX_WIDTH {
                let wanted = (length - PREFIX_WIDTH) as u64;
                let read = (&mut self.reader).take(wanted).read_to_end(&mut record)?;
                self.position += read;
                if (read as u64) < wanted {
                    return self.stop(BsonError::TruncatedRecord(format!(
                        "declared size {length} at offset {offset} exceeds the {} bytes remaining",
                        read + PREFIX_WIDTH
                    )));
                }
            }

            match parse_document(&record) {
                Ok(document) => {
                    self.records_read += 1;
                    return Ok(Some(document));
                },
                Err(error) if self.recovery_mode == RecoveryMode::Permissive => {
                    self.skipped.push(SkippedRecord {
                        offset,
                        length,
                        error: error.to_string(),
                    });
                },
                Err(error) => {
                    self.exhausted = true;
                    return Err(BsonError::InvalidRecord(format!(
                        "document at offset {offset}: {error}"
                    )));
                },
            }
        }
    }

    /// Number of documents read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Bytes consumed from the source so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Records skipped in permissive mode.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// End the stream, surfacing `error` only in strict mode.
    fn stop(&mut self, error: BsonError) -> Result<Option<Document>> {
        self.exhausted = true;
        if self.recovery_mode == RecoveryMode::Strict {
            Err(error)
        } else {
            Ok(None)
        }
    }

    /// Read until `buf` is full or the source ends; returns the bytes read.
    ///
    /// Carried prefix bytes are consumed before the source.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let carried: Vec<u8> = self.carry.drain(..self.carry.len().min(buf.len())).collect();
        buf[..carried.len()].copy_from_slice(&carried);
        let mut filled = carried.len();
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(BsonError::IoError(e)),
            }
        }
        self.position += filled;
        Ok(filled)
    }
}

impl<R: Read + std::fmt::Debug> FormatReader for BsonReader<R> {
    fn read_record(&mut self) -> Result<Option<Document>> {
        self.read_document()
    }

    fn records_read(&self) -> Option<usize> {
        Some(self.records_read)
    }
}
