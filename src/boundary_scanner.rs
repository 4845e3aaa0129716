//! Record boundary detection from length prefixes.
//!
//! Every record in a dump starts with its own little-endian int32 length, so
//! boundaries can be found by hopping from prefix to prefix without parsing
//! any payload. The frames are returned as `(offset, length)` tuples for use
//! in parallel decoding.
//!
//! # Example
//!
//! ```
//! use bsonrec::boundary_scanner::RecordBoundaryScanner;
//!
//! // two empty documents followed by two stray bytes
//! let buffer = [5, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0xAB, 0xCD];
//! let mut scanner = RecordBoundaryScanner::new();
//! let scan = scanner.scan(&buffer);
//!
//! assert_eq!(scan.frames, vec![(0, 5), (5, 5)]);
//! assert!(!scan.stop.is_clean());
//! ```

use crate::stream::StopReason;

/// Width of the length prefix in bytes.
pub const PREFIX_WIDTH: usize = 4;

/// Result of examining the bytes at one cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStep {
    /// A record whose declared length fits the buffer
    Frame {
        /// Byte offset of the length prefix
        offset: usize,
        /// Declared length, prefix included
        length: usize,
    },
    /// No further record can be framed
    Stop(StopReason),
}

/// Frame the record starting at `offset`.
///
/// Stops cleanly at the end of the buffer, and with a diagnostic reason when
/// fewer than four bytes remain, the declared length is not positive, or the
/// declared length runs past the end of the buffer.
#[must_use]
pub fn next_frame(buffer: &[u8], offset: usize) -> FrameStep {
    let remaining = buffer.len().saturating_sub(offset);
    if remaining == 0 {
        return FrameStep::Stop(StopReason::EndOfStream);
    }
    if remaining < PREFIX_WIDTH {
        return FrameStep::Stop(StopReason::TrailingBytes { offset, remaining });
    }

    let prefix = [
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ];
    let declared = i32::from_le_bytes(prefix);
    let Some(length) = usize::try_from(declared).ok().filter(|&n| n > 0) else {
        return FrameStep::Stop(StopReason::InvalidSize { offset, declared });
    };
    if length > remaining {
        return FrameStep::Stop(StopReason::SizeExceedsBuffer {
            offset,
            declared: length,
            available: remaining,
        });
    }

    FrameStep::Frame { offset, length }
}

/// Frames found by a scan, and why the scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// `(offset, length)` of every framed record, in buffer order
    pub frames: Vec<(usize, usize)>,
    /// Why scanning stopped
    pub stop: StopReason,
}

impl ScanResult {
    /// Bytes covered by the frames (the offset where scanning stopped).
    #[must_use]
    pub fn bytes_framed(&self) -> usize {
        self.frames.last().map_or(0, |(offset, len)| offset + len)
    }
}

/// Record boundary scanner.
///
/// Walks the length prefixes of a buffer, applying the same stop rules as
/// the stream decoder, but never looks inside a payload.
#[derive(Debug, Default)]
pub struct RecordBoundaryScanner {
    /// Pre-allocated buffer for reuse across scans
    boundaries: Vec<(usize, usize)>,
}

impl RecordBoundaryScanner {
    /// Create a new boundary scanner with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundaries: Vec::with_capacity(100),
        }
    }

    /// Scan a buffer for record frames.
    ///
    /// An empty buffer yields no frames and a clean stop.
    pub fn scan(&mut self, buffer: &[u8]) -> ScanResult {
        self.boundaries.clear();
        let mut offset = 0;

        let stop = loop {
            match next_frame(buffer, offset) {
                FrameStep::Frame { offset: at, length } => {
                    self.boundaries.push((at, length));
                    offset = at + length;
                },
                FrameStep::Stop(reason) => break reason,
            }
        };

        ScanResult {
            frames: self.boundaries.clone(),
            stop,
        }
    }

    /// Scan a buffer and return at most `limit` frames.
    ///
    /// The stop reason reflects the full scan, not the cut.
    pub fn scan_limited(&mut self, buffer: &[u8], limit: usize) -> ScanResult {
        let mut result = self.scan(buffer);
        result.frames.truncate(limit);
        result
    }

    /// Count framed records without keeping their boundaries.
    #[must_use]
    pub fn count_records(&self, buffer: &[u8]) -> usize {
        let mut offset = 0;
        let mut count = 0;
        while let FrameStep::Frame { offset: at, length } = next_frame(buffer, offset) {
            count += 1;
            offset = at + length;
        }
        count
    }

    /// Clear internal state.
    pub fn clear(&mut self) {
        self.boundaries.clear();
    }

    /// Get the current capacity of the scanner.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.boundaries.capacity()
    }
}
