//! Run context passed into nodes for streaming-aware execution.
//!
//! Holds runnable config and optional stream sender plus selected stream modes.

use std::collections::HashSet;
use std::fmt::Debug;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode};

#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Config for the current run (thread_id, checkpoint).
    pub config: RunnableConfig,
    /// Optional sender for streaming events.
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    /// Enabled stream modes.
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Context without streaming.
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
        }
    }

    pub(crate) fn wants(&self, mode: StreamMode) -> bool {
        self.stream_tx.is_some() && self.stream_mode.contains(&mode)
    }

    /// Sends `event` if a stream is attached. A dropped receiver is ignored.
    pub(crate) async fn send(&self, event: StreamEvent<S>) {
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Emits a custom payload when the caller streams with `StreamMode::Custom`.
    /// Returns whether the event was sent.
    pub async fn emit_custom(&self, value: Value) -> bool {
        if !self.wants(StreamMode::Custom) {
            return false;
        }
        self.send(StreamEvent::Custom(value)).await;
        true
    }
}
