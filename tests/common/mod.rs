//! Common test helpers and utilities shared across the test suite.

use bsonrec::{encode_document, Document, ObjectId, Value};
use std::path::{Path, PathBuf};

/// A user document as found in the `users` collection of a legacy dump.
#[allow(dead_code)]
pub fn user(id: &str, role: &str) -> Document {
    Document::builder().field("_id", id).field("role", role).build()
}

/// A catalogue record with a nested Dublin Core block.
///
/// Mirrors the shape of the `items` collection: an object id, a nested
/// document with an array of creators, and a few typed scalars.
#[allow(dead_code)]
pub fn catalogue_item(seq: i32) -> Document {
    let mut oid = [0u8; 12];
    oid[8..].copy_from_slice(&seq.to_be_bytes());
    Document::builder()
        .field("_id", ObjectId::from_bytes(oid))
        .field(
            "dc",
            Document::builder()
                .field("title", format!("Item {seq}"))
                .field("creator", vec!["Y", "Z"])
                .build(),
        )
        .field("seq", seq)
        .field("published", true)
        .field("modified", Value::DateTime(1_577_836_800_000 + i64::from(seq)))
        .build()
}

/// Serialize documents back-to-back, exactly as a dump file stores them.
pub fn encode_stream(documents: &[Document]) -> Vec<u8> {
    let mut buffer = Vec::new();
    for document in documents {
        buffer.extend(encode_document(document).expect("encodable test document"));
    }
    buffer
}

/// A correctly framed record whose payload holds an invalid boolean byte.
#[allow(dead_code)]
pub fn malformed_record() -> Vec<u8> {
    let mut bytes = encode_document(&Document::builder().field("flag", true).build())
        .expect("encodable test document");
    let flag = bytes.len() - 2;
    bytes[flag] = 0x03;
    bytes
}

/// Write `<name>.bson` files into `dir`, one per `(name, bytes)` pair.
#[allow(dead_code)]
pub fn write_dump_dir(dir: &Path, collections: &[(&str, Vec<u8>)]) -> Vec<PathBuf> {
    std::fs::create_dir_all(dir).expect("create dump dir");
    collections
        .iter()
        .map(|(name, bytes)| {
            let path = dir.join(format!("{name}.bson"));
            std::fs::write(&path, bytes).expect("write collection");
            path
        })
        .collect()
}
