//! Checkpointer trait and its error type.
//!
//! A checkpointer stores, per thread: the ordered sequence of checkpoints and at
//! most one outstanding interrupt. `MemorySaver` keeps both in process memory;
//! `SqliteSaver` (feature `sqlite`) keeps them in a database file.

use async_trait::async_trait;
use thiserror::Error;

use crate::graph::PendingInterrupt;
use crate::memory::{Checkpoint, CheckpointListItem, CheckpointMetadata, RunnableConfig};

/// Checkpoint store error.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// `config.thread_id` was not set.
    #[error("thread_id is required")]
    ThreadIdRequired,

    /// State could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend failure (I/O, SQL, poisoned lock).
    #[error("storage error: {0}")]
    Storage(String),

    /// Nothing stored for the requested thread or checkpoint.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Persists checkpoints and interrupts keyed by `(thread_id, checkpoint_ns)`.
///
/// Writes for one thread never affect reads for another. Within a thread,
/// `put` appends: the store assigns `metadata.seq` one past the current maximum.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Appends a checkpoint to the thread and returns its id.
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Latest checkpoint of the thread, or the one named by `config.checkpoint_id`.
    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError>;

    /// Checkpoint ids and metadata, newest first.
    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// All checkpoints of the thread in the order they were written.
    async fn history(&self, config: &RunnableConfig) -> Result<Vec<Checkpoint<S>>, CheckpointError>;

    /// Stores the thread's outstanding interrupt, replacing any previous one.
    async fn put_interrupt(
        &self,
        config: &RunnableConfig,
        pending: &PendingInterrupt<S>,
    ) -> Result<(), CheckpointError>;

    async fn get_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError>;

    /// Removes and returns the thread's outstanding interrupt.
    async fn take_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError>;

    /// Drops every checkpoint and interrupt of the thread.
    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError>;
}

/// `(thread_id, checkpoint_ns)` key for a config.
pub(crate) fn thread_key(config: &RunnableConfig) -> Result<(String, String), CheckpointError> {
    let thread_id = config
        .thread_id
        .clone()
        .ok_or(CheckpointError::ThreadIdRequired)?;
    Ok((thread_id, config.checkpoint_ns.clone()))
}
