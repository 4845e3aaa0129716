#![no_main]

use bsonrec::parallel::decode_parallel;
use bsonrec::{decode_with_mode, BsonReader, RecoveryMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for mode in [RecoveryMode::Lenient, RecoveryMode::Permissive] {
        let outcome = decode_with_mode(data, mode);
        assert!(outcome.bytes_consumed <= data.len());
        let parallel = decode_parallel(data, mode);
        // documents may hold NaN, so compare the framing only
        assert_eq!(outcome.len(), parallel.len());
        assert_eq!(outcome.bytes_consumed, parallel.bytes_consumed);
        assert_eq!(outcome.stop, parallel.stop);
        assert_eq!(outcome.skipped, parallel.skipped);
    }

    let mut reader = BsonReader::new(data);
    while let Ok(Some(_document)) = reader.read_document() {}
});
