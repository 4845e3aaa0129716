//! Implementation of `bsonrec dump`.

use anyhow::{Context, Result};
use bsonrec::config::DumpConfig;
use bsonrec::export::{format_collection_summary, format_structure_summary, run_dump};
use bsonrec::{CollectionStats, JsonMode, RecoveryMode};

use crate::DumpArgs;

/// Run the dump, print one line per collection, then the schema sketches.
///
/// # Errors
///
/// Returns an error if the data directory cannot be listed, the output
/// cannot be written, or any collection failed.
pub fn run(args: &DumpArgs, verbose: bool) -> Result<()> {
    let recovery_mode = if args.strict {
        RecoveryMode::Strict
    } else if args.skip_malformed {
        RecoveryMode::Permissive
    } else {
        RecoveryMode::Lenient
    };
    let json_mode = if args.canonical {
        JsonMode::Canonical
    } else {
        JsonMode::Relaxed
    };

    let config = DumpConfig {
        data_dir: args.data_dir.clone(),
        output_dir: args.output_dir.clone(),
        collection: args.collection.clone(),
        recovery_mode,
        json_mode,
        parallel: !args.sequential,
        ..Default::default()
    };

    let report = run_dump(&config)
        .with_context(|| format!("cannot dump {}", config.data_dir.display()))?;

    for exported in &report.exported {
        println!(
            "{}: {} documents -> {}",
            exported.stats.name,
            exported.stats.document_count,
            exported.output.display()
        );
        if verbose && !exported.stop.is_clean() {
            eprintln!("  {}: stopped at {}", exported.stats.name, exported.stop);
        }
        if verbose {
            for skipped in &exported.skipped {
                eprintln!("  {}: {skipped}", exported.stats.name);
            }
        }
    }
    if let Some(summary) = &report.summary {
        let stats: Vec<CollectionStats> =
            report.exported.iter().map(|c| c.stats.clone()).collect();
        println!("\n{}", format_structure_summary(&stats)?);
        println!("\nsummary -> {}", summary.display());
    } else {
        for exported in &report.exported {
            println!("\n{}", format_collection_summary(&exported.stats)?);
        }
    }
    for failed in &report.failed {
        eprintln!("{}: {}", failed.name, failed.error);
    }

    if report.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} collection(s) failed", report.failed.len())
    }
}
