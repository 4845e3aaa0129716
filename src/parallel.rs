//! Parallel decoding using Rayon.
//!
//! Records in a dump are independent once their boundaries are known, so a
//! buffer can be framed sequentially with the
//! [`RecordBoundaryScanner`](crate::boundary_scanner::RecordBoundaryScanner)
//! and the frames decoded on Rayon's work-stealing pool. Results are always
//! returned in frame order and agree with the sequential
//! [`decode_with_report`](crate::stream::decode_with_report).
//!
//! Whole collection files can likewise be decoded side by side with
//! [`load_collections_parallel`]; each file is an independent task.
//!
//! # Examples
//!
//! ```
//! use bsonrec::boundary_scanner::RecordBoundaryScanner;
//! use bsonrec::parallel::decode_frames_parallel;
//! use bsonrec::{encode_document, Document, RecoveryMode};
//!
//! let mut buffer = Vec::new();
//! for id in ["a", "b", "c"] {
//!     buffer.extend(encode_document(&Document::builder().field("_id", id).build())?);
//! }
//!
//! let scan = RecordBoundaryScanner::new().scan(&buffer);
//! let documents = decode_frames_parallel(&scan.frames, &buffer, RecoveryMode::Lenient)?;
//! assert_eq!(documents.len(), 3);
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::boundary_scanner::RecordBoundaryScanner;
use crate::collection::{load_collection, CollectionDump};
use crate::decoder::parse_document;
use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::recovery::{RecoveryMode, SkippedRecord};
use crate::stream::{DecodeOutcome, StopReason};
use rayon::prelude::*;
use std::path::PathBuf;

/// Decode every frame in parallel, keeping the per-frame results.
fn decode_frames(frames: &[(usize, usize)], buffer: &[u8]) -> Result<Vec<Result<Document>>> {
    for &(offset, length) in frames {
        if offset.checked_add(length).map_or(true, |end| end > buffer.len()) {
            return Err(BsonError::InvalidRecord(format!(
                "Record boundary ({offset}, {length}) exceeds buffer size {}",
                buffer.len()
            )));
        }
    }

    Ok(frames
        .par_iter()
        .map(|&(offset, length)| parse_document(&buffer[offset..offset + length]))
        .collect())
}

/// Decode a batch of frames in parallel.
///
/// Each `(offset, length)` frame is parsed independently on Rayon's pool and
/// the documents are returned in frame order. A frame that fails to parse is
/// handled according to `mode`:
///
/// - [`RecoveryMode::Lenient`]: the result is cut at the first failing frame,
///   as the sequential decoder would stop there;
/// - [`RecoveryMode::Permissive`]: failing frames are dropped;
/// - [`RecoveryMode::Strict`]: the first failure (in frame order) is returned.
///
/// # Errors
///
/// Returns an error if any frame lies outside `buffer`, or in strict mode if
/// any frame fails to parse.
pub fn decode_frames_parallel(
    frames: &[(usize, usize)],
    buffer: &[u8],
    mode: RecoveryMode,
) -> Result<Vec<Document>> {
    let results = decode_frames(frames, buffer)?;
    let mut documents = Vec::with_capacity(results.len());

    for (&(offset, _), result) in frames.iter().zip(results) {
        match result {
            Ok(document) => documents.push(document),
            Err(error) => match mode {
                RecoveryMode::Strict => {
                    return Err(BsonError::InvalidRecord(format!(
                        "document at offset {offset}: {error}"
                    )))
                },
                RecoveryMode::Lenient => break,
                RecoveryMode::Permissive => {},
            },
        }
    }

    Ok(documents)
}

/// Frame a buffer and decode its records in parallel.
///
/// Produces exactly what [`decode_with_mode`](crate::stream::decode_with_mode)
/// produces for the same buffer and mode: the same documents, bytes
/// consumed, stop reason and skipped records.
#[must_use]
pub fn decode_parallel(buffer: &[u8], mode: RecoveryMode) -> DecodeOutcome {
    let scan = RecordBoundaryScanner::new().scan(buffer);
    let results: Vec<Result<Document>> = scan
        .frames
        .par_iter()
        .map(|&(offset, length)| parse_document(&buffer[offset..offset + length]))
        .collect();

    let mut documents = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    let mut bytes_consumed = 0;

    for (&(offset, length), result) in scan.frames.iter().zip(results) {
        match result {
            Ok(document) => documents.push(document),
            Err(error) if mode == RecoveryMode::Permissive => skipped.push(SkippedRecord {
                offset,
                length,
                error: error.to_string(),
            }),
            Err(error) => {
                return DecodeOutcome {
                    documents,
                    bytes_consumed: offset,
                    stop: StopReason::MalformedDocument {
                        offset,
                        length,
                        error: error.to_string(),
                    },
                    skipped,
                };
            },
        }
        bytes_consumed = offset + length;
    }

    DecodeOutcome {
        documents,
        bytes_consumed,
        stop: scan.stop,
        skipped,
    }
}

/// Load several collection files in parallel.
///
/// One task per file; results come back in input order, each carrying its
/// own success or failure.
#[must_use]
pub fn load_collections_parallel(
    paths: &[PathBuf],
    mode: RecoveryMode,
) -> Vec<Result<CollectionDump>> {
    paths
        .par_iter()
        .map(|path| load_collection(path, mode))
        .collect()
}
