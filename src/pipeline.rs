//! Producer-consumer pipeline with backpressure.
//!
//! Decodes a list of collection files on a background thread and hands the
//! results to the caller through a bounded channel.
//!
//! Design:
//! - **Producer:** background thread decoding collections on the Rayon pool
//!   in batches of `channel_capacity` files
//! - **Consumer:** the caller, draining the channel with [`DumpPipeline::next`]
//!   or by iterating
//! - **Backpressure:** the producer blocks once `channel_capacity` decoded
//!   collections are waiting

use crate::collection::CollectionDump;
use crate::parallel::load_collections_parallel;
use crate::recovery::RecoveryMode;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::path::PathBuf;
use std::thread;
use thiserror::Error;

/// Configuration for the producer-consumer pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Channel capacity (decoded collections)
    pub channel_capacity: usize,
    /// Recovery mode applied to every collection
    pub recovery_mode: RecoveryMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            recovery_mode: RecoveryMode::default(),
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur during pipeline operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A collection could not be read or decoded
    #[error("Failed to load {path}: {message}")]
    LoadError {
        /// Collection file
        path: PathBuf,
        /// Underlying error
        message: String,
    },
    /// Channel capacity of zero was requested
    #[error("Channel capacity must be at least 1")]
    InvalidCapacity,
    /// The producer thread panicked
    #[error("Producer thread panicked")]
    ProducerPanicked,
}

/// Producer task: decodes collections a batch at a time, sends each result
fn producer_task(
    paths: &[PathBuf],
    sender: &Sender<PipelineResult<CollectionDump>>,
    config: &PipelineConfig,
) {
    for batch in paths.chunks(config.channel_capacity) {
        let results = load_collections_parallel(batch, config.recovery_mode);
        for (path, result) in batch.iter().zip(results) {
            let item = result.map_err(|e| PipelineError::LoadError {
                path: path.clone(),
                message: e.to_string(),
            });
            // Blocks while the channel is full; a dropped consumer ends the run
            if sender.send(item).is_err() {
                return;
            }
        }
    }
}

/// Consumer-facing pipeline handle
#[derive(Debug)]
pub struct DumpPipeline {
    receiver: Receiver<PipelineResult<CollectionDump>>,
    producer: Option<thread::JoinHandle<()>>,
}

impl DumpPipeline {
    /// Start decoding `paths` in the background.
    ///
    /// Results arrive in the order of `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidCapacity`] if the configured channel
    /// capacity is zero.
    pub fn spawn(paths: Vec<PathBuf>, config: &PipelineConfig) -> PipelineResult<Self> {
        if config.channel_capacity == 0 {
            return Err(PipelineError::InvalidCapacity);
        }

        let (sender, receiver) = bounded(config.channel_capacity);
        let producer_config = config.clone();
        let producer = thread::spawn(move || producer_task(&paths, &sender, &producer_config));

        Ok(DumpPipeline {
            receiver,
            producer: Some(producer),
        })
    }

    /// Try to get the next collection without blocking
    ///
    /// Returns:
    /// - `Some(result)` if a collection is ready
    /// - `None` if nothing is ready yet or the pipeline is done
    pub fn try_next(&self) -> Option<PipelineResult<CollectionDump>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Get the next collection, blocking if necessary
    ///
    /// Returns `None` once every collection has been delivered.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<PipelineResult<CollectionDump>> {
        match self.receiver.recv() {
            Ok(result) => Some(result),
            Err(_) => self.join_producer().err().map(Err),
        }
    }

    /// Wait for the producer to exit, reporting a panic once.
    fn join_producer(&mut self) -> PipelineResult<()> {
        match self.producer.take() {
            Some(handle) => handle.join().map_err(|_| PipelineError::ProducerPanicked),
            None => Ok(()),
        }
    }
}

impl Iterator for DumpPipeline {
    type Item = PipelineResult<CollectionDump>;

    fn next(&mut self) -> Option<Self::Item> {
        DumpPipeline::next(self)
    }
}
