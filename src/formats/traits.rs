//! Source and sink traits for documents.
//!
//! The incremental [`BsonReader`](crate::reader::BsonReader) and the in-memory
//! [`StreamDecoder`](crate::stream::StreamDecoder) both produce documents; the
//! [`BsonWriter`](crate::writer::BsonWriter) and
//! [`JsonArrayWriter`](crate::json::JsonArrayWriter) both consume them.
//! [`transcode`] moves documents from any source to any sink.
//!
//! # Example
//!
//! ```
//! use bsonrec::formats::transcode;
//! use bsonrec::json::JsonArrayWriter;
//! use bsonrec::{encode_document, Document, JsonMode, StreamDecoder};
//!
//! let dump = encode_document(&Document::builder().field("_id", "a").build())?;
//! let mut json = Vec::new();
//! let copied = transcode(
//!     &mut StreamDecoder::new(&dump),
//!     &mut JsonArrayWriter::new(&mut json, JsonMode::Relaxed),
//! )?;
//! assert_eq!(copied, 1);
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::document::Document;
use crate::error::Result;

/// A source of documents in file order.
///
/// `Ok(None)` marks the end of the source. How a damaged source ends
/// (error or early `None`) depends on the implementor's recovery mode.
pub trait FormatReader: std::fmt::Debug {
    /// Next document, or `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns an error when a record cannot be decoded and the recovery
    /// mode does not allow stopping quietly, or when I/O fails.
    fn read_record(&mut self) -> Result<Option<Document>>;

    /// Drain the source.
    ///
    /// # Errors
    ///
    /// Returns the first error [`read_record`](Self::read_record) reports;
    /// documents read before it are dropped.
    fn read_all(&mut self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        while let Some(document) = self.read_record()? {
            documents.push(document);
        }
        Ok(documents)
    }

    /// Documents yielded so far, if the source counts them.
    fn records_read(&self) -> Option<usize> {
        None
    }
}

/// A sink for documents.
///
/// Output is only complete after [`finish`](Self::finish); the JSON array
/// writer closes its bracket there.
pub trait FormatWriter: std::fmt::Debug {
    /// Append one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded, the sink is
    /// already finished, or I/O fails.
    fn write_record(&mut self, document: &Document) -> Result<()>;

    /// Append documents in order.
    ///
    /// # Errors
    ///
    /// Stops at the first document that fails to write.
    fn write_batch(&mut self, documents: &[Document]) -> Result<()> {
        documents
            .iter()
            .try_for_each(|document| self.write_record(document))
    }

    /// Complete the output and flush it.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn finish(&mut self) -> Result<()>;

    /// Documents written so far, if the sink counts them.
    fn records_written(&self) -> Option<usize> {
        None
    }
}

/// `Iterator` access to a [`FormatReader`].
pub trait FormatReaderExt: FormatReader {
    /// Iterate over `Result<Document>` until the source ends.
    fn records(&mut self) -> RecordIterator<'_, Self>
    where
        Self: Sized,
    {
        RecordIterator { reader: self }
    }
}

impl<T: FormatReader> FormatReaderExt for T {}

/// Iterator returned by [`FormatReaderExt::records`].
#[derive(Debug)]
pub struct RecordIterator<'a, R: FormatReader> {
    reader: &'a mut R,
}

impl<R: FormatReader> Iterator for RecordIterator<'_, R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Copy every document from `reader` to `writer`, then finish the writer.
///
/// Returns the number of documents copied.
///
/// # Errors
///
/// Returns the first read or write error; the writer is left unfinished.
pub fn transcode<R, W>(reader: &mut R, writer: &mut W) -> Result<usize>
where
    R: FormatReader + ?Sized,
    W: FormatWriter + ?Sized,
{
    let mut copied = 0;
    while let Some(document) = reader.read_record()? {
        writer.write_record(&document)?;
        copied += 1;
    }
    writer.finish()?;
    Ok(copied)
}
