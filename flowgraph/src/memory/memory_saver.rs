//! In-memory checkpointer. Lost on process exit; for single-process runs and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::graph::PendingInterrupt;
use crate::memory::checkpointer::thread_key;
use crate::memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, Checkpointer,
    RunnableConfig,
};

struct ThreadSlot<S> {
    checkpoints: Vec<Checkpoint<S>>,
    interrupt: Option<PendingInterrupt<S>>,
}

impl<S> Default for ThreadSlot<S> {
    fn default() -> Self {
        Self {
            checkpoints: Vec::new(),
            interrupt: None,
        }
    }
}

/// In-memory checkpointer keyed by `(thread_id, checkpoint_ns)`.
///
/// Each thread lives in its own `DashMap` shard entry, so concurrent runs on
/// different threads do not contend on one lock.
pub struct MemorySaver<S> {
    threads: DashMap<(String, String), ThreadSlot<S>>,
}

impl<S> Default for MemorySaver<S> {
    fn default() -> Self {
        Self {
            threads: DashMap::new(),
        }
    }
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads with at least one checkpoint or interrupt.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = thread_key(config)?;
        let mut slot = self.threads.entry(key).or_default();
        let mut stored = checkpoint.clone();
        stored.metadata.seq = slot
            .checkpoints
            .last()
            .map(|c| c.metadata.seq + 1)
            .unwrap_or(0);
        let id = stored.id.clone();
        slot.checkpoints.push(stored);
        Ok(id)
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = thread_key(config)?;
        let Some(slot) = self.threads.get(&key) else {
            return Ok(None);
        };
        let found = match &config.checkpoint_id {
            Some(id) => slot.checkpoints.iter().rev().find(|c| &c.id == id),
            None => slot.checkpoints.last(),
        };
        Ok(found.map(|c| (c.clone(), c.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = thread_key(config)?;
        let Some(slot) = self.threads.get(&key) else {
            return Ok(Vec::new());
        };
        Ok(slot
            .checkpoints
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|c| CheckpointListItem {
                checkpoint_id: c.id.clone(),
                metadata: c.metadata.clone(),
            })
            .collect())
    }

    async fn history(&self, config: &RunnableConfig) -> Result<Vec<Checkpoint<S>>, CheckpointError> {
        let key = thread_key(config)?;
        Ok(self
            .threads
            .get(&key)
            .map(|slot| slot.checkpoints.clone())
            .unwrap_or_default())
    }

    async fn put_interrupt(
        &self,
        config: &RunnableConfig,
        pending: &PendingInterrupt<S>,
    ) -> Result<(), CheckpointError> {
        let key = thread_key(config)?;
        self.threads.entry(key).or_default().interrupt = Some(pending.clone());
        Ok(())
    }

    async fn get_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError> {
        let key = thread_key(config)?;
        Ok(self
            .threads
            .get(&key)
            .and_then(|slot| slot.interrupt.clone()))
    }

    async fn take_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<S>>, CheckpointError> {
        let key = thread_key(config)?;
        Ok(self
            .threads
            .get_mut(&key)
            .and_then(|mut slot| slot.interrupt.take()))
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        let key = thread_key(config)?;
        self.threads.remove(&key);
        Ok(())
    }
}
