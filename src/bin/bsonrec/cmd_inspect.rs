//! Implementation of `bsonrec inspect`.

use std::fs;

use anyhow::{Context, Result};
use bsonrec::formats::Format;
use bsonrec::json::to_json_string;
use bsonrec::{Document, JsonMode, StreamDecoder, Value};

use crate::InspectArgs;

/// Print the documents of a collection file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or rendered.
pub fn run(args: &InspectArgs, verbose: bool) -> Result<()> {
    if Format::from_path(&args.file) != Some(Format::Bson) {
        eprintln!("warning: {} has no .bson extension", args.file.display());
    }
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let mut decoder = StreamDecoder::new(&bytes);
    let limit = args.limit.unwrap_or(usize::MAX);
    for (index, document) in decoder.by_ref().take(limit).enumerate() {
        if args.json {
            println!("{}", to_json_string(&document, JsonMode::Relaxed)?);
        } else {
            println!("#{index}: {}", summarize(&document));
        }
    }

    if verbose {
        eprintln!(
            "{} documents, {} of {} bytes",
            decoder.documents_decoded(),
            decoder.position(),
            bytes.len()
        );
        if let Some(stop) = decoder.stop_reason() {
            eprintln!("stopped: {stop}");
        }
    }
    Ok(())
}

/// One-line `key: type` listing of a document's top-level fields.
fn summarize(document: &Document) -> String {
    document
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) if s.len() <= 40 => format!("{key}={s:?}"),
            other => format!("{key}: {}", other.element_type()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
