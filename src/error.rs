//! Error types for BSON dump operations.
//!
//! This module provides the [`BsonError`] type for all library operations
//! and the [`Result`] convenience type.

use thiserror::Error;

/// Error type for all library operations.
///
/// Represents the conditions that can occur while parsing a document payload,
/// walking a dump stream, encoding documents, or reading and writing dump files.
#[derive(Error, Debug)]
pub enum BsonError {
    /// The payload ended before a value, key or terminator was complete.
    #[error("Unexpected end of document at byte {offset}")]
    UnexpectedEof {
        /// Byte position (relative to the document start) where input ran out
        offset: usize,
    },

    /// A document, string or binary length prefix is negative, too small, or
    /// does not match the bytes available to it.
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// An element carries a type tag this format does not define.
    #[error("Invalid element type 0x{tag:02x} for key {key:?}")]
    InvalidElementType {
        /// The offending tag byte
        tag: u8,
        /// The element's key
        key: String,
    },

    /// A key or string value is not valid UTF-8.
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(String),

    /// A document or string does not end with its 0x00 terminator.
    #[error("Missing terminator: {0}")]
    MissingTerminator(String),

    /// A boolean element holds a byte other than 0x00 or 0x01.
    #[error("Invalid boolean byte 0x{0:02x}")]
    InvalidBoolean(u8),

    /// Documents are nested deeper than the decoder allows.
    #[error("Nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// A key cannot be encoded (it contains a NUL byte).
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// A framed record is cut short by the end of the stream.
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// A framed record is malformed (bad prefix or unparseable payload).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error while exporting.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`BsonError`].
pub type Result<T> = std::result::Result<T, BsonError>;
