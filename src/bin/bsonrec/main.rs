//! bsonrec command-line tool: dump, inspect and validate collection files.
//!
//! ```text
//! bsonrec <COMMAND> [OPTIONS]
//!
//! Commands:
//!   dump       Convert every collection (or one) of a dump directory to JSON
//!   inspect    Print the documents of one collection file
//!   validate   Check that a collection file decodes cleanly to its last byte
//!
//! Global options:
//!   -v, --verbose    Report stop reasons and skipped records on stderr
//! ```
//!
//! Exit code 0 on success, 1 on any error. Diagnostics go to stderr so
//! stdout can be piped.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd_dump;
mod cmd_inspect;
mod cmd_validate;

/// Decode legacy BSON dump files.
#[derive(Parser)]
#[command(name = "bsonrec", version, about = "Legacy BSON dump decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Report stop reasons and skipped records on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert collections of a dump directory to JSON files.
    Dump(DumpArgs),
    /// Print the documents of a collection file.
    Inspect(InspectArgs),
    /// Check that a collection file decodes cleanly.
    Validate(ValidateArgs),
}

/// Arguments for `bsonrec dump`.
///
/// Writes `<collection>.json` for each collection and, when no collection
/// is named, `_database_structure.json` with per-collection statistics.
#[derive(clap::Args)]
pub struct DumpArgs {
    /// Dump only this collection (file stem of `<name>.bson`).
    pub collection: Option<String>,

    /// Directory holding the `.bson` files.
    #[arg(long, default_value = bsonrec::config::DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Directory receiving the JSON output.
    #[arg(long, default_value = bsonrec::config::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Emit canonical Extended JSON instead of relaxed JSON.
    #[arg(long)]
    pub canonical: bool,

    /// Skip malformed records instead of stopping at them.
    #[arg(long, conflicts_with = "strict")]
    pub skip_malformed: bool,

    /// Fail a collection on any truncation or malformed record.
    #[arg(long)]
    pub strict: bool,

    /// Decode collections one at a time.
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for `bsonrec inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the `.bson` file.
    pub file: PathBuf,

    /// Print documents as JSON instead of a field summary.
    #[arg(long)]
    pub json: bool,

    /// Print at most this many documents.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for `bsonrec validate`.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the `.bson` file.
    pub file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dump(args) => cmd_dump::run(&args, cli.verbose),
        Commands::Inspect(args) => cmd_inspect::run(&args, cli.verbose),
        Commands::Validate(args) => cmd_validate::run(&args, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
