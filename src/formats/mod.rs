//! Multi-format support for decoded documents.
//!
//! All document sources and sinks implement the same traits, allowing
//! format-agnostic conversion code.
//!
//! # Supported Formats
//!
//! | Format | Module | Description |
//! |--------|--------|-------------|
//! | BSON dump | `bson` | Length-prefixed binary documents (`.bson`) |
//! | JSON | `json` | Pretty-printed JSON array of documents (`.json`) |
//!
//! # Usage
//!
//! ```
//! use bsonrec::formats::{bson::BsonReader, json::JsonArrayWriter, FormatReaderExt};
//! use bsonrec::{BsonWriter, Document, JsonMode};
//! use std::io::Cursor;
//!
//! let mut dump = Vec::new();
//! let mut writer = BsonWriter::new(&mut dump);
//! for id in ["a", "b"] {
//!     writer.write_document(&Document::builder().field("_id", id).build())?;
//! }
//!
//! let mut reader = BsonReader::new(Cursor::new(dump));
//! let mut out = JsonArrayWriter::new(Vec::new(), JsonMode::Relaxed);
//! for document in reader.records() {
//!     out.write_document(&document?)?;
//! }
//! out.finish()?;
//! assert!(String::from_utf8_lossy(&out.into_inner()).starts_with("[\n  {"));
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

mod traits;

pub use traits::{transcode, FormatReader, FormatReaderExt, FormatWriter, RecordIterator};

/// Binary dump format (length-prefixed documents).
pub mod bson {
    pub use crate::reader::BsonReader;
    pub use crate::writer::BsonWriter;
}

/// JSON array output.
pub mod json {
    pub use crate::json::JsonArrayWriter;
}

/// Supported format types for format detection and dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// Binary dump format (`.bson`)
    Bson,
    /// JSON array (`.json`)
    Json,
}

impl Format {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    ///
    /// # Example
    ///
    /// ```
    /// use bsonrec::formats::Format;
    ///
    /// assert_eq!(Format::from_extension("bson"), Some(Format::Bson));
    /// assert_eq!(Format::from_extension("unknown"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bson" => Some(Self::Bson),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    #[must_use]
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Bson => "bson",
            Self::Json => "json",
        }
    }

    /// Get the human-readable name for this format.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bson => "BSON dump",
            Self::Json => "JSON",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
