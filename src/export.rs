//! Exporting collections to JSON files.
//!
//! A dump run turns every `<collection>.bson` of a data directory into a
//! pretty-printed `<collection>.json` array, and when the whole directory is
//! dumped also writes `_database_structure.json`: one [`CollectionStats`]
//! entry per collection with its document count, first document and schema
//! sketch.
//!
//! # Examples
//!
//! ```no_run
//! use bsonrec::config::DumpConfig;
//! use bsonrec::export::run_dump;
//!
//! let report = run_dump(&DumpConfig::default())?;
//! for collection in &report.exported {
//!     println!("{}: {} documents", collection.stats.name, collection.stats.document_count);
//! }
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.name, failure.error);
//! }
//! # Ok::<(), bsonrec::BsonError>(())
//! ```

use crate::collection::{collection_name, load_collection, CollectionDump, CollectionStats};
use crate::config::DumpConfig;
use crate::error::{BsonError, Result};
use crate::formats::FormatWriter;
use crate::json::{JsonArrayWriter, JsonMode};
use crate::parallel::load_collections_parallel;
use crate::recovery::SkippedRecord;
use crate::stream::StopReason;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the structure summary.
pub const SUMMARY_FILE_NAME: &str = "_database_structure.json";

/// Write a collection's documents as `<output_dir>/<name>.json`.
///
/// The output directory is created if missing. Returns the written path.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn export_collection(
    dump: &CollectionDump,
    output_dir: &Path,
    mode: JsonMode,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.json", dump.name));
    let file = File::create(&path)?;
    let mut writer = JsonArrayWriter::new(BufWriter::new(file), mode);
    writer.write_batch(dump.documents())?;
    writer.finish()?;
    Ok(path)
}

/// Write the structure summary as `<output_dir>/_database_structure.json`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_summary(stats: &[CollectionStats], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(SUMMARY_FILE_NAME);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, stats)?;
    writer.flush()?;
    Ok(path)
}

/// Text block describing one collection: name, document count and the
/// schema sketch as indented pretty JSON.
///
/// ```
/// use bsonrec::export::format_collection_summary;
/// use bsonrec::CollectionStats;
/// use serde_json::json;
///
/// let stats = CollectionStats {
///     name: "roles".into(),
///     document_count: 2,
///     sample_document: None,
///     schema: Some(json!({"_id": "string"})),
/// };
/// let text = format_collection_summary(&stats)?;
/// assert!(text.starts_with("Collection: roles\n   Documents: 2\n   Schema:\n   {"));
/// # Ok::<(), bsonrec::BsonError>(())
/// ```
///
/// # Errors
///
/// Returns an error if the schema cannot be rendered.
pub fn format_collection_summary(stats: &CollectionStats) -> Result<String> {
    let schema = serde_json::to_string_pretty(&stats.schema)?;
    let mut text = format!(
        "Collection: {}\n   Documents: {}\n   Schema:",
        stats.name, stats.document_count
    );
    for line in schema.lines() {
        text.push_str("\n   ");
        text.push_str(line);
    }
    Ok(text)
}

/// The structure summary of a whole run as text: a banner, then one
/// [`format_collection_summary`] block per collection.
///
/// # Errors
///
/// Returns an error if a schema cannot be rendered.
pub fn format_structure_summary(stats: &[CollectionStats]) -> Result<String> {
    let rule = "=".repeat(60);
    let mut text = format!("{rule}\nDATABASE STRUCTURE SUMMARY\n{rule}");
    for collection in stats {
        text.push_str("\n\n");
        text.push_str(&format_collection_summary(collection)?);
    }
    Ok(text)
}

/// A collection that was exported.
#[derive(Debug, Clone)]
pub struct ExportedCollection {
    /// Source `.bson` file
    pub source: PathBuf,
    /// Written `.json` file
    pub output: PathBuf,
    /// Summary entry
    pub stats: CollectionStats,
    /// How decoding of the source ended
    pub stop: StopReason,
    /// Records skipped in permissive mode
    pub skipped: Vec<SkippedRecord>,
}

/// A collection that could not be read or written.
#[derive(Debug)]
pub struct FailedCollection {
    /// Collection name
    pub name: String,
    /// Source `.bson` file
    pub source: PathBuf,
    /// What went wrong
    pub error: BsonError,
}

/// Outcome of [`run_dump`].
#[derive(Debug, Default)]
pub struct DumpReport {
    /// Collections written, in input order
    pub exported: Vec<ExportedCollection>,
    /// Collections that failed, in input order
    pub failed: Vec<FailedCollection>,
    /// Structure summary, when every collection was dumped
    pub summary: Option<PathBuf>,
}

impl DumpReport {
    /// True when no collection failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Documents exported across all collections.
    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.exported.iter().map(|c| c.stats.document_count).sum()
    }

    /// Exported collections whose stream did not end cleanly.
    pub fn damaged(&self) -> impl Iterator<Item = &ExportedCollection> {
        self.exported
            .iter()
            .filter(|c| !c.stop.is_clean() || !c.skipped.is_empty())
    }
}

/// Dump collections to JSON as configured.
///
/// Collections are decoded (in parallel unless disabled), each written to its
/// own JSON file, and, when no single collection was requested, summarised
/// in the structure file. A collection that fails to load or export is
/// recorded in [`DumpReport::failed`] and does not stop the others.
///
/// # Errors
///
/// Returns an error only if the data directory cannot be listed or the
/// output directory or summary cannot be written.
pub fn run_dump(config: &DumpConfig) -> Result<DumpReport> {
    let paths = config.collection_paths()?;
    fs::create_dir_all(&config.output_dir)?;

    let loaded: Vec<Result<CollectionDump>> = if config.parallel {
        load_collections_parallel(&paths, config.recovery_mode)
    } else {
        paths
            .iter()
            .map(|path| load_collection(path, config.recovery_mode))
            .collect()
    };

    let mut report = DumpReport::default();
    for (source, result) in paths.iter().zip(loaded) {
        let exported = result.and_then(|dump| {
            let output = export_collection(&dump, &config.output_dir, config.json_mode)?;
            Ok(ExportedCollection {
                source: source.clone(),
                output,
                stats: dump.stats(config.json_mode, config.schema_depth),
                stop: dump.outcome.stop,
                skipped: dump.outcome.skipped,
            })
        });
        match exported {
            Ok(collection) => report.exported.push(collection),
            Err(error) => report.failed.push(FailedCollection {
                name: collection_name(source),
                source: source.clone(),
                error,
            }),
        }
    }

    if config.collection.is_none() {
        let stats: Vec<CollectionStats> =
            report.exported.iter().map(|c| c.stats.clone()).collect();
        report.summary = Some(write_summary(&stats, &config.output_dir)?);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::recovery::RecoveryMode;
    use crate::stream::decode_with_report;
    use crate::writer::encode_document;
    use serde_json::{json, Value as JsonValue};

    fn dump_of(name: &str, docs: &[Document]) -> CollectionDump {
        let bytes: Vec<u8> = docs
            .iter()
            .flat_map(|d| encode_document(d).unwrap())
            .collect();
        CollectionDump {
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.bson")),
            outcome: decode_with_report(&bytes),
        }
    }

    fn read_json(path: &Path) -> JsonValue {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_export_collection_writes_array() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let dump = dump_of(
            "roles",
            &[
                Document::builder().field("_id", "r1").field("name", "admin").build(),
                Document::builder().field("_id", "r2").field("name", "viewer").build(),
            ],
        );

        let path = export_collection(&dump, &out, JsonMode::Relaxed).unwrap();
        assert_eq!(path, out.join("roles.json"));
        assert_eq!(
            read_json(&path),
            json!([{"_id": "r1", "name": "admin"}, {"_id": "r2", "name": "viewer"}])
        );
    }

    #[test]
    fn test_export_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            export_collection(&dump_of("empty", &[]), dir.path(), JsonMode::Relaxed).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dump_of("users", &[Document::builder().field("_id", "u").build()]);
        let stats = vec![dump.stats(JsonMode::Relaxed, 3)];

        let path = write_summary(&stats, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), SUMMARY_FILE_NAME);
        assert_eq!(
            read_json(&path),
            json!([{
                "name": "users",
                "documentCount": 1,
                "sampleDocument": {"_id": "u"},
                "schema": {"_id": "string"}
            }])
        );
    }

    #[test]
    fn test_collection_summary_indents_schema() {
        let dump = dump_of(
            "users",
            &[Document::builder()
                .field("_id", "u")
                .field("tags", vec!["a"])
                .build()],
        );
        let text = format_collection_summary(&dump.stats(JsonMode::Relaxed, 3)).unwrap();
        assert_eq!(
            text,
            "Collection: users\n   Documents: 1\n   Schema:\n   {\n     \"_id\": \"string\",\n     \"tags\": [\n       \"string\"\n     ]\n   }"
        );

        let empty = format_collection_summary(&dump_of("empty", &[]).stats(JsonMode::Relaxed, 3))
            .unwrap();
        assert_eq!(empty, "Collection: empty\n   Documents: 0\n   Schema:\n   null");
    }

    #[test]
    fn test_structure_summary_lists_every_collection() {
        let stats = vec![
            dump_of("a", &[Document::builder().field("n", 1).build()]).stats(JsonMode::Relaxed, 3),
            dump_of("b", &[]).stats(JsonMode::Relaxed, 3),
        ];
        let text = format_structure_summary(&stats).unwrap();
        assert!(text.starts_with(&format!("{}\nDATABASE STRUCTURE SUMMARY\n", "=".repeat(60))));
        assert!(text.contains("\n\nCollection: a\n   Documents: 1\n   Schema:\n   {\n     \"n\": \"number\"\n   }"));
        assert!(text.ends_with("Collection: b\n   Documents: 0\n   Schema:\n   null"));
    }

    #[test]
    fn test_run_dump_reports_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("db");
        let out = dir.path().join("json");
        fs::create_dir_all(&data).unwrap();

        let good = encode_document(&Document::builder().field("_id", "a").build()).unwrap();
        fs::write(data.join("good.bson"), &good).unwrap();
        let mut damaged = good.clone();
        damaged.push(0x01);
        fs::write(data.join("tail.bson"), &damaged).unwrap();

        for parallel in [true, false] {
            let config = DumpConfig::new()
                .with_data_dir(&data)
                .with_output_dir(&out)
                .with_recovery_mode(RecoveryMode::Strict)
                .with_parallel(parallel);
            let report = run_dump(&config).unwrap();

            assert_eq!(report.exported.len(), 1);
            assert_eq!(report.exported[0].stats.name, "good");
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].name, "tail");
            assert!(!report.is_success());

            let summary = read_json(report.summary.as_ref().unwrap());
            assert_eq!(summary.as_array().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_run_dump_single_collection_skips_summary() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("db");
        let out = dir.path().join("json");
        fs::create_dir_all(&data).unwrap();
        let mut bytes = encode_document(&Document::builder().field("_id", "a").build()).unwrap();
        bytes.extend_from_slice(&[7, 7]);
        fs::write(data.join("users.bson"), bytes).unwrap();
        fs::write(data.join("other.bson"), b"").unwrap();

        let config = DumpConfig::new()
            .with_data_dir(&data)
            .with_output_dir(&out)
            .with_collection("users");
        let report = run_dump(&config).unwrap();

        assert_eq!(report.exported.len(), 1);
        assert_eq!(report.total_documents(), 1);
        assert_eq!(report.damaged().count(), 1);
        assert!(report.summary.is_none());
        assert!(out.join("users.json").exists());
        assert!(!out.join("other.json").exists());
        assert!(!out.join(SUMMARY_FILE_NAME).exists());
    }
}
