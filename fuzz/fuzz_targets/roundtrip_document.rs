#![no_main]

use bsonrec::{encode_document, parse_document};
use libfuzzer_sys::fuzz_target;

// Anything that parses must re-encode to stable bytes.
fuzz_target!(|data: &[u8]| {
    let Ok(document) = parse_document(data) else {
        return;
    };
    let Ok(bytes) = encode_document(&document) else {
        return;
    };
    let reparsed = parse_document(&bytes).expect("re-encoded document parses");
    let again = encode_document(&reparsed).expect("reparsed document encodes");
    assert_eq!(again, bytes);
});
