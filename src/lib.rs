#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # bsonrec: legacy BSON dump decoding
//!
//! A Rust library for reading the collection files of a database dump: plain
//! streams of length-prefixed binary documents, written back-to-back with no
//! header, footer or record count.
//!
//! ## Quick Start
//!
//! ### Decoding a buffer
//!
//! ```
//! use bsonrec::{decode, encode_document, Document};
//!
//! let mut buffer = Vec::new();
//! buffer.extend(encode_document(&Document::builder().field("_id", "u1").build())?);
//! buffer.extend(encode_document(&Document::builder().field("_id", "u2").build())?);
//!
//! let documents = decode(&buffer);
//! assert_eq!(documents[1].get_str("_id"), Some("u2"));
//! # Ok::<(), bsonrec::BsonError>(())
//! ```
//!
//! ### Telling a clean end from a truncated file
//!
//! ```
//! use bsonrec::{decode_with_report, encode_document, Document, StopReason};
//!
//! let mut buffer = encode_document(&Document::builder().field("n", 1).build())?;
//! buffer.extend_from_slice(&500i32.to_le_bytes());
//!
//! let outcome = decode_with_report(&buffer);
//! assert_eq!(outcome.documents.len(), 1);
//! assert!(matches!(outcome.stop, StopReason::SizeExceedsBuffer { declared: 500, .. }));
//! # Ok::<(), bsonrec::BsonError>(())
//! ```
//!
//! ### Dumping a directory to JSON
//!
//! ```no_run
//! use bsonrec::config::DumpConfig;
//! use bsonrec::export::run_dump;
//!
//! let report = run_dump(&DumpConfig::default().with_data_dir("backup/db"))?;
//! println!("{} documents exported", report.total_documents());
//! # Ok::<(), bsonrec::BsonError>(())
//! ```
//!
//! ## Modules
//!
//! - [`stream`] — Decoding a whole dump buffer, with stop diagnostics
//! - [`decoder`] — Parsing one document payload
//! - [`writer`] — Encoding documents and writing dump streams
//! - [`reader`] — Reading documents incrementally from any [`std::io::Read`]
//! - [`document`] / [`value`] — The ordered document model
//! - [`boundary_scanner`] — Framing records from their length prefixes
//! - [`parallel`] — Rayon-based decoding of frames and collection files
//! - [`pipeline`] — Background decoding with a bounded channel
//! - [`collection`] — Dump directories and collection files
//! - [`schema`] — Structural sketches of documents
//! - [`json`] — JSON rendering (relaxed and canonical Extended JSON)
//! - [`export`] — Writing collections and the structure summary to disk
//! - [`config`] — Dump run configuration
//! - [`recovery`] — Handling truncated and malformed streams
//! - [`error`] — Error types and result type

pub mod boundary_scanner;
pub mod collection;
pub mod config;
pub mod decoder;
pub mod document;
pub mod error;
pub mod export;
/// Format reader/writer traits and the formats implementing them.
///
/// See the [`formats`] module documentation for details.
pub mod formats;
pub mod json;
pub mod parallel;
pub mod pipeline;
pub mod reader;
pub mod recovery;
pub mod schema;
pub mod stream;
pub mod value;
pub mod writer;

pub use collection::{CollectionDump, CollectionStats};
pub use config::DumpConfig;
pub use decoder::parse_document;
pub use document::{Document, DocumentBuilder};
pub use error::{BsonError, Result};
pub use json::{to_json, JsonMode};
pub use pipeline::{DumpPipeline, PipelineConfig, PipelineError};
pub use reader::BsonReader;
pub use recovery::{RecoveryMode, SkippedRecord};
pub use stream::{
    decode, decode_with_mode, decode_with_report, try_decode, DecodeOutcome, StopReason,
    StreamDecoder,
};
pub use value::{Binary, ElementType, ObjectId, Value};
pub use writer::{encode_document, BsonWriter};
