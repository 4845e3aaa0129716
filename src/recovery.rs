//! Recovery strategies for truncated and malformed dump streams.
//!
//! Dumps copied out of a failing server are often cut short or carry a
//! damaged record. The recovery mode decides how much of such a stream is
//! kept: stop at the damage, skip past it, or refuse the stream outright.

use std::fmt;

/// Strategy for handling truncated or malformed records in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Strict mode: any anomaly other than a clean end of stream is an error
    Strict,
    /// Lenient mode: stop at the first anomaly and keep everything before it (default)
    #[default]
    Lenient,
    /// Permissive mode: skip records whose payload is malformed but whose
    /// length prefix still frames them, and keep going
    Permissive,
}

impl fmt::Display for RecoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

/// A framed record that was skipped in [`RecoveryMode::Permissive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Byte offset of the record's length prefix
    pub offset: usize,
    /// Declared length of the record
    pub length: usize,
    /// Why the payload could not be parsed
    pub error: String,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped {} bytes at offset {}: {}",
            self.length, self.offset, self.error
        )
    }
}
