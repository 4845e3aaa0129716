//! Integration tests for decoding whole dump buffers.

mod common;

use bsonrec::{
    decode, decode_with_mode, decode_with_report, try_decode, BsonError, Document, RecoveryMode,
    StopReason, Value,
};
use common::{catalogue_item, encode_stream, malformed_record, user};

#[test]
fn test_two_framed_documents() {
    let buffer = encode_stream(&[user("a", "root"), user("b", "viewer")]);
    let documents = decode(&buffer);

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].get_str("_id"), Some("a"));
    assert_eq!(documents[0].get_str("role"), Some("root"));
    assert_eq!(documents[1].get_str("_id"), Some("b"));
    assert_eq!(documents[1].get_str("role"), Some("viewer"));
}

#[test]
fn test_oversized_declared_length_keeps_prefix() {
    let mut buffer = encode_stream(&[user("a", "root")]);
    buffer.extend_from_slice(&9999i32.to_le_bytes());
    buffer.extend_from_slice(&[0x11; 6]);

    assert_eq!(decode(&buffer), vec![user("a", "root")]);
}

#[test]
fn test_nested_document_and_array_preserved() {
    let document = Document::builder()
        .field("_id", "c")
        .field(
            "dc",
            Document::builder()
                .field("title", "X")
                .field("creator", vec!["Y", "Z"])
                .build(),
        )
        .build();
    let decoded = decode(&encode_stream(&[document]));

    assert_eq!(decoded.len(), 1);
    let dc = decoded[0].get_document("dc").expect("dc is a document");
    assert_eq!(dc.get_str("title"), Some("X"));
    assert_eq!(
        dc.get("creator"),
        Some(&Value::Array(vec![Value::from("Y"), Value::from("Z")]))
    );
    assert_eq!(decoded[0].get_path("dc.creator.1"), Some(&Value::from("Z")));
}

#[test]
fn test_trailing_bytes_tolerated() {
    let documents: Vec<Document> = (0..4).map(catalogue_item).collect();
    for stray in 1..=3 {
        let mut buffer = encode_stream(&documents);
        buffer.extend(std::iter::repeat(0xAB).take(stray));
        assert_eq!(decode(&buffer), documents, "{stray} stray bytes");
    }
}

#[test]
fn test_empty_input() {
    assert!(decode(&[]).is_empty());
    assert_eq!(decode_with_report(&[]).stop, StopReason::EndOfStream);
}

#[test]
fn test_report_distinguishes_clean_from_truncated() {
    let clean = encode_stream(&[user("a", "root")]);
    let report = decode_with_report(&clean);
    assert!(report.is_clean());
    assert_eq!(report.bytes_consumed, clean.len());

    let mut cut = clean.clone();
    cut.extend(encode_stream(&[user("b", "viewer")]));
    cut.truncate(cut.len() - 3);
    let report = decode_with_report(&cut);
    assert!(report.truncated());
    assert_eq!(report.documents, vec![user("a", "root")]);
    assert_eq!(report.bytes_consumed, clean.len());
    assert!(matches!(report.stop, StopReason::SizeExceedsBuffer { offset, .. } if offset == clean.len()));
}

#[test]
fn test_zero_and_negative_prefix_stop() {
    for declared in [0i32, -1, i32::MIN] {
        let mut buffer = encode_stream(&[user("a", "root")]);
        buffer.extend_from_slice(&declared.to_le_bytes());
        buffer.extend(encode_stream(&[user("b", "viewer")]));

        let report = decode_with_report(&buffer);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(
            report.stop.offset(),
            Some(encode_stream(&[user("a", "root")]).len())
        );
        assert!(matches!(report.stop, StopReason::InvalidSize { declared: d, .. } if d == declared));
    }
}

#[test]
fn test_tiny_declared_length_is_malformed() {
    // a prefix declaring 3 bytes frames a record too small to be a document
    let mut buffer = encode_stream(&[user("a", "root")]);
    buffer.extend_from_slice(&3i32.to_le_bytes());
    buffer.extend_from_slice(&[0; 8]);

    let report = decode_with_report(&buffer);
    assert_eq!(report.documents.len(), 1);
    assert!(matches!(
        report.stop,
        StopReason::MalformedDocument { length: 3, .. }
    ));
}

#[test]
fn test_malformed_payload_recovery_modes() {
    let mut buffer = encode_stream(&[user("a", "root")]);
    buffer.extend(malformed_record());
    buffer.extend(encode_stream(&[user("b", "viewer")]));

    let lenient = decode_with_mode(&buffer, RecoveryMode::Lenient);
    assert_eq!(lenient.documents, vec![user("a", "root")]);
    assert!(matches!(lenient.stop, StopReason::MalformedDocument { .. }));

    let permissive = decode_with_mode(&buffer, RecoveryMode::Permissive);
    assert_eq!(permissive.documents, vec![user("a", "root"), user("b", "viewer")]);
    assert_eq!(permissive.skipped.len(), 1);
    assert_eq!(permissive.stop, StopReason::EndOfStream);
    assert_eq!(permissive.bytes_consumed, buffer.len());

    match try_decode(&buffer, RecoveryMode::Strict) {
        Err(BsonError::InvalidRecord(message)) => {
            assert!(message.contains("boolean"), "got: {message}");
        },
        other => panic!("expected strict failure, got {other:?}"),
    }
}

#[test]
fn test_permissive_does_not_resynchronise_after_bad_prefix() {
    let mut buffer = encode_stream(&[user("a", "root")]);
    buffer.extend_from_slice(&(-5i32).to_le_bytes());
    buffer.extend(encode_stream(&[user("b", "viewer")]));

    let report = decode_with_mode(&buffer, RecoveryMode::Permissive);
    assert_eq!(report.documents.len(), 1);
    assert!(matches!(report.stop, StopReason::InvalidSize { .. }));
}

#[test]
fn test_decode_is_repeatable() {
    let buffer = encode_stream(&(0..20).map(catalogue_item).collect::<Vec<_>>());
    assert_eq!(decode(&buffer), decode(&buffer));
}

#[test]
fn test_typed_values_survive() {
    let decoded = decode(&encode_stream(&[catalogue_item(7)]));
    let item = &decoded[0];

    assert_eq!(item.get("seq"), Some(&Value::Int32(7)));
    assert_eq!(item.get("published").and_then(Value::as_bool), Some(true));
    assert_eq!(
        item.get("modified").and_then(Value::as_datetime),
        Some(1_577_836_800_007)
    );
    let keys: Vec<&str> = item.keys().collect();
    assert_eq!(keys, vec!["_id", "dc", "seq", "published", "modified"]);
}
