//! Implementation of `bsonrec validate`.
//!
//! Decodes the whole file and succeeds only when every byte belongs to a
//! well-formed document.

use std::fs;

use anyhow::{anyhow, Context, Result};
use bsonrec::decode_with_report;

use crate::ValidateArgs;

/// Validate a collection file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode cleanly.
pub fn run(args: &ValidateArgs, verbose: bool) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;
    let outcome = decode_with_report(&bytes);

    if verbose {
        eprintln!(
            "{} bytes, {} consumed",
            bytes.len(),
            outcome.bytes_consumed
        );
    }

    if outcome.is_clean() {
        println!("✓ {} documents, clean end of stream", outcome.documents.len());
        Ok(())
    } else {
        println!(
            "✗ {} documents before: {}",
            outcome.documents.len(),
            outcome.stop
        );
        Err(anyhow!("validation failed"))
    }
}
