//! Configuration for dumping a directory of collections to JSON.
//!
//! This module provides the [`DumpConfig`] struct which controls where
//! collections are read from, where JSON is written, and how damaged streams
//! and typed values are handled.

use crate::collection::{collection_path, discover_collections};
use crate::error::Result;
use crate::json::JsonMode;
use crate::recovery::RecoveryMode;
use crate::schema::DEFAULT_SCHEMA_DEPTH;
use std::path::PathBuf;

/// Default directory holding the `.bson` collection files.
pub const DEFAULT_DATA_DIR: &str = "data/db";

/// Default directory receiving the JSON output.
pub const DEFAULT_OUTPUT_DIR: &str = "data/json-output";

/// Configuration for a dump run.
///
/// # Examples
///
/// ```
/// use bsonrec::config::DumpConfig;
/// use bsonrec::{JsonMode, RecoveryMode};
///
/// // Defaults: data/db -> data/json-output, every collection
/// let config = DumpConfig::default();
/// assert!(config.collection.is_none());
///
/// // One collection, canonical JSON, skipping malformed records
/// let config = DumpConfig {
///     collection: Some("users".into()),
///     json_mode: JsonMode::Canonical,
///     recovery_mode: RecoveryMode::Permissive,
///     ..Default::default()
/// };
/// assert_eq!(config.schema_depth, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Directory holding `<collection>.bson` files.
    pub data_dir: PathBuf,

    /// Directory receiving `<collection>.json` and the structure summary.
    /// Created if missing.
    pub output_dir: PathBuf,

    /// Dump only this collection.
    ///
    /// When `None` (default), every `.bson` file in `data_dir` is dumped and
    /// a structure summary is written.
    pub collection: Option<String>,

    /// How truncated or malformed records are handled.
    pub recovery_mode: RecoveryMode,

    /// Shape of the rendered JSON.
    pub json_mode: JsonMode,

    /// Depth of the schema sketch in the summary.
    pub schema_depth: usize,

    /// Decode collections in parallel.
    pub parallel: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            collection: None,
            recovery_mode: RecoveryMode::default(),
            json_mode: JsonMode::default(),
            schema_depth: DEFAULT_SCHEMA_DEPTH,
            parallel: true,
        }
    }
}

impl DumpConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Restricts the run to one collection.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Sets the recovery mode.
    #[must_use]
    pub const fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery_mode = mode;
        self
    }

    /// Sets the JSON mode.
    #[must_use]
    pub const fn with_json_mode(mut self, mode: JsonMode) -> Self {
        self.json_mode = mode;
        self
    }

    /// Enables or disables parallel decoding.
    #[must_use]
    pub const fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Collection files selected by this configuration.
    ///
    /// The named collection if one is set (whether or not the file exists),
    /// otherwise every collection in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data_dir` cannot be listed.
    pub fn collection_paths(&self) -> Result<Vec<PathBuf>> {
        match &self.collection {
            Some(name) => Ok(vec![collection_path(&self.data_dir, name)]),
            None => discover_collections(&self.data_dir),
        }
    }
}
