//! Collections of a dump directory.
//!
//! A dump directory holds one `<collection>.bson` file per collection. Each
//! file is a plain record stream; the collection is named after the file
//! stem.

use crate::document::Document;
use crate::error::{BsonError, Result};
use crate::json::{to_json, JsonMode};
use crate::recovery::RecoveryMode;
use crate::schema::document_schema;
use crate::stream::{try_decode, DecodeOutcome};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of collection dumps.
pub const BSON_EXTENSION: &str = "bson";

/// A collection file, fully decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDump {
    /// Collection name (the file stem)
    pub name: String,
    /// File the collection was read from
    pub path: PathBuf,
    /// Decoded documents and how decoding ended
    pub outcome: DecodeOutcome,
}

impl CollectionDump {
    /// Decoded documents in file order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.outcome.documents
    }

    /// Number of decoded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcome.documents.len()
    }

    /// Whether the collection decoded no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcome.documents.is_empty()
    }

    /// Summary of the collection: count, first document and its schema sketch.
    #[must_use]
    pub fn stats(&self, json_mode: JsonMode, schema_depth: usize) -> CollectionStats {
        let first = self.outcome.documents.first();
        CollectionStats {
            name: self.name.clone(),
            document_count: self.len(),
            sample_document: first.map(|doc| to_json(doc, json_mode)),
            schema: first.map(|doc| document_schema(doc, schema_depth)),
        }
    }
}

/// Per-collection summary, as written to the structure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    /// Collection name
    pub name: String,
    /// Number of decoded documents
    pub document_count: usize,
    /// First document rendered as JSON, or `null` for an empty collection
    pub sample_document: Option<serde_json::Value>,
    /// Schema sketch of the first document, or `null` for an empty collection
    pub schema: Option<serde_json::Value>,
}

/// Name of the collection stored at `path`.
#[must_use]
pub fn collection_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path of collection `name` inside `data_dir`.
#[must_use]
pub fn collection_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.{BSON_EXTENSION}"))
}

/// List the collection files of a dump directory, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn discover_collections(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_bson = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(BSON_EXTENSION));
        if is_bson && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read and decode one collection file.
///
/// The file is read whole and decoded with the stream decoder.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or in
/// [`RecoveryMode::Strict`] if the stream is not clean.
pub fn load_collection(path: &Path, mode: RecoveryMode) -> Result<CollectionDump> {
    let bytes = fs::read(path).map_err(|e| {
        BsonError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    let outcome = try_decode(&bytes, mode)?;
    Ok(CollectionDump {
        name: collection_name(path),
        path: path.to_path_buf(),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StopReason;
    use crate::writer::encode_document;
    use serde_json::json;

    fn write_collection(dir: &Path, name: &str, docs: &[Document], extra: &[u8]) -> PathBuf {
        let mut bytes: Vec<u8> = docs
            .iter()
            .flat_map(|d| encode_document(d).unwrap())
            .collect();
        bytes.extend_from_slice(extra);
        let path = collection_path(dir, name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(collection_name(Path::new("data/db/users.bson")), "users");
        assert_eq!(
            collection_path(Path::new("data/db"), "roles"),
            PathBuf::from("data/db/roles.bson")
        );
    }

    #[test]
    fn test_discover_sorted_bson_only() {
        let dir = tempfile::tempdir().unwrap();
        write_collection(dir.path(), "zeta", &[], &[]);
        write_collection(dir.path(), "alpha", &[], &[]);
        fs::write(dir.path().join("alpha.metadata.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let names: Vec<String> = discover_collections(dir.path())
            .unwrap()
            .iter()
            .map(|p| collection_name(p))
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_collections(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_load_collection_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let docs = vec![
            Document::builder().field("_id", "a").field("age", 30).build(),
            Document::builder().field("_id", "b").field("age", 40).build(),
        ];
        let path = write_collection(dir.path(), "users", &docs, &[0xAA]);

        let dump = load_collection(&path, RecoveryMode::Lenient).unwrap();
        assert_eq!(dump.name, "users");
        assert_eq!(dump.documents(), docs.as_slice());
        assert!(matches!(
            dump.outcome.stop,
            StopReason::TrailingBytes { remaining: 1, .. }
        ));

        let stats = dump.stats(JsonMode::Relaxed, 3);
        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.sample_document, Some(json!({"_id": "a", "age": 30})));
        assert_eq!(stats.schema, Some(json!({"_id": "string", "age": "number"})));

        assert!(load_collection(&path, RecoveryMode::Strict).is_err());
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = CollectionStats {
            name: "empty".to_string(),
            document_count: 0,
            sample_document: None,
            schema: None,
        };
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"name": "empty", "documentCount": 0, "sampleDocument": null, "schema": null})
        );
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_collection(&dir.path().join("gone.bson"), RecoveryMode::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("gone.bson"), "got: {err}");
    }
}
