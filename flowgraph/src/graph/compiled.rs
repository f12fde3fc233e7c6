//! Compiled state graph: immutable, supports invoke, stream, resume and recover.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. Holds nodes,
//! the outgoing edge of every node (resolved at compile time), the optional
//! checkpointer and the state updater. With a checkpointer and `config.thread_id`,
//! a checkpoint is written after every node and nodes may suspend the run.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::channels::BoxedStateUpdater;
use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointError, CheckpointSource, Checkpointer, RunnableConfig};
use crate::stream::{CheckpointEvent, StreamError, StreamEvent, StreamMode};

use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
    log_state_update,
};
use super::{
    Interrupt, NextEntry, Node, NodeCall, NodeFuture, NodeMiddleware, NodeOutcome,
    PendingInterrupt, RunContext, Suspension, END,
};

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome<S> {
    /// Reached `END`.
    Complete(S),
    /// A node suspended. `state` is the graph state the paused node was given;
    /// the interrupt is stored for the thread until `resume` consumes it.
    Interrupted { state: S, interrupt: Interrupt },
}

impl<S> RunOutcome<S> {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted { .. })
    }

    pub fn state(&self) -> &S {
        match self {
            RunOutcome::Complete(s) => s,
            RunOutcome::Interrupted { state, .. } => state,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            RunOutcome::Complete(s) => s,
            RunOutcome::Interrupted { state, .. } => state,
        }
    }

    pub fn interrupt(&self) -> Option<&Interrupt> {
        match self {
            RunOutcome::Complete(_) => None,
            RunOutcome::Interrupted { interrupt, .. } => Some(interrupt),
        }
    }
}

/// Compiled graph: immutable structure.
///
/// A run walks from the first node: run the node, merge its output, checkpoint,
/// follow the node's edge (or ask its router), stop at `END`. Nodes of one run
/// execute strictly one after another; there is no iteration cap, loops end
/// through the graph's own routing.
#[derive(Clone)]
pub struct CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
    pub(super) interrupt_ttl: Option<Duration>,
}

async fn invoke_node<S>(
    node: Arc<dyn Node<S>>,
    state: S,
    ctx: &RunContext<S>,
    resume: Option<(S, Value)>,
) -> Result<NodeOutcome<S>, AgentError>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    match resume {
        Some((pending, value)) => node.resume(state, pending, value).await,
        None => node.run_with_context(state, ctx).await,
    }
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Id of the node the graph starts at.
    pub fn first_node_id(&self) -> &str {
        &self.first_node_id
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    fn node(&self, id: &str) -> Result<Arc<dyn Node<S>>, AgentError> {
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::ExecutionFailed(format!("unknown node `{}`", id)))
    }

    /// Checkpointer and thread id, both required for interrupts and state reads.
    fn session<'a>(
        &'a self,
        config: &'a RunnableConfig,
    ) -> Result<(&'a Arc<dyn Checkpointer<S>>, &'a str), AgentError> {
        match (&self.checkpointer, config.thread_id.as_deref()) {
            (Some(cp), Some(thread_id)) => Ok((cp, thread_id)),
            _ => Err(AgentError::SessionRequired),
        }
    }

    fn is_expired(&self, interrupt: &Interrupt) -> bool {
        interrupt.is_expired(self.interrupt_ttl, SystemTime::now())
    }

    /// Runs one node, through the middleware when one is set.
    async fn call_node(
        &self,
        node_id: &str,
        state: S,
        ctx: &RunContext<S>,
        resume: Option<(S, Value)>,
    ) -> Result<NodeOutcome<S>, AgentError> {
        let node = self.node(node_id)?;
        let result = match &self.middleware {
            Some(middleware) => {
                let ctx_owned = ctx.clone();
                let inner: NodeCall<S> = Box::new(move |s: S| -> NodeFuture<S> {
                    Box::pin(async move { invoke_node(node, s, &ctx_owned, resume).await })
                });
                middleware.around_run(node_id, state, inner).await
            }
            None => invoke_node(node, state, ctx, resume).await,
        };
        result.map_err(|e| AgentError::NodeFailed {
            node_id: node_id.to_string(),
            source: Box::new(e),
        })
    }

    async fn save_checkpoint(
        &self,
        state: &S,
        source: CheckpointSource,
        step: u64,
        node_id: &str,
        ctx: &RunContext<S>,
    ) -> Result<(), AgentError> {
        let (Some(cp), Some(thread_id)) = (&self.checkpointer, &ctx.config.thread_id) else {
            return Ok(());
        };
        let checkpoint = Checkpoint::from_state(state.clone(), source, step, node_id);
        let checkpoint_id = cp.put(&ctx.config, &checkpoint).await?;
        if ctx.wants(StreamMode::Checkpoints) {
            ctx.send(StreamEvent::Checkpoint(CheckpointEvent {
                checkpoint_id,
                step,
                node_id: node_id.to_string(),
                thread_id: thread_id.clone(),
            }))
            .await;
        }
        Ok(())
    }

    async fn suspend(
        &self,
        node_id: &str,
        state: S,
        suspension: Suspension<S>,
        step: u64,
        ctx: &RunContext<S>,
    ) -> Result<RunOutcome<S>, AgentError> {
        let (cp, thread_id) = self.session(&ctx.config)?;
        let interrupt = Interrupt::new(node_id, suspension.payload);
        let pending = PendingInterrupt {
            interrupt: interrupt.clone(),
            pending: suspension.pending,
            state: state.clone(),
            step,
        };
        cp.put_interrupt(&ctx.config, &pending).await?;
        tracing::info!(thread_id, node_id, step, interrupt_id = %interrupt.id, "run suspended");
        Ok(RunOutcome::Interrupted { state, interrupt })
    }

    /// The walk shared by every entry point. `resume` carries the paused node's
    /// pending output and the caller's data for the first node only.
    async fn run_loop(
        &self,
        mut state: S,
        mut current_id: String,
        mut step: u64,
        ctx: &RunContext<S>,
        mut resume: Option<(S, Value)>,
    ) -> Result<RunOutcome<S>, AgentError> {
        loop {
            log_node_start(&current_id, step);
            let resuming = resume.take();
            let source = if resuming.is_some() {
                CheckpointSource::Resume
            } else {
                CheckpointSource::Loop
            };

            let update = match self.call_node(&current_id, state.clone(), ctx, resuming).await? {
                NodeOutcome::Completed(update) => update,
                NodeOutcome::Suspended(suspension) => {
                    return self.suspend(&current_id, state, suspension, step, ctx).await;
                }
            };

            self.state_updater.apply_update(&mut state, update);
            log_state_update(&current_id, &self.state_updater.describe());
            self.save_checkpoint(&state, source, step, &current_id, ctx)
                .await?;

            // The interrupt goes only once the resumed node's output is stored.
            if source == CheckpointSource::Resume {
                let (cp, _) = self.session(&ctx.config)?;
                cp.take_interrupt(&ctx.config).await?;
            }

            if ctx.wants(StreamMode::Values) {
                ctx.send(StreamEvent::Values(state.clone())).await;
            }
            if ctx.wants(StreamMode::Updates) {
                ctx.send(StreamEvent::Updates {
                    node_id: current_id.clone(),
                    state: state.clone(),
                })
                .await;
            }

            let entry = self.next_map.get(&current_id).ok_or_else(|| {
                AgentError::ExecutionFailed(format!("node `{}` has no outgoing edge", current_id))
            })?;
            let next = entry.resolve(&current_id, &state)?;
            log_node_complete(&current_id, step, &next);
            step += 1;

            if next == END {
                log_graph_complete(ctx.config.thread_id.as_deref(), step);
                return Ok(RunOutcome::Complete(state));
            }
            current_id = next;
        }
    }

    /// Errors with `InterruptPending` while an unexpired interrupt waits on the thread.
    /// An expired one is dropped so the thread can start over.
    async fn ensure_no_pending(&self, config: &RunnableConfig) -> Result<(), AgentError> {
        let Ok((cp, thread_id)) = self.session(config) else {
            return Ok(());
        };
        if let Some(pending) = cp.get_interrupt(config).await? {
            if !self.is_expired(&pending.interrupt) {
                return Err(AgentError::InterruptPending(thread_id.to_string()));
            }
            cp.take_interrupt(config).await?;
            tracing::info!(thread_id, node_id = %pending.interrupt.node_id, "dropped expired interrupt");
        }
        Ok(())
    }

    async fn start(&self, state: S, ctx: &RunContext<S>) -> Result<RunOutcome<S>, AgentError> {
        self.ensure_no_pending(&ctx.config).await?;
        log_graph_start(ctx.config.thread_id.as_deref(), &self.first_node_id);
        self.run_loop(state, self.first_node_id.clone(), 0, ctx, None)
            .await
            .inspect_err(log_graph_error)
    }

    async fn resume_inner(
        &self,
        ctx: &RunContext<S>,
        value: Value,
    ) -> Result<RunOutcome<S>, AgentError> {
        let (cp, thread_id) = self.session(&ctx.config)?;
        let pending = cp
            .get_interrupt(&ctx.config)
            .await?
            .ok_or_else(|| AgentError::NoPendingInterrupt(thread_id.to_string()))?;
        if self.is_expired(&pending.interrupt) {
            cp.take_interrupt(&ctx.config).await?;
            return Err(AgentError::InterruptExpired(thread_id.to_string()));
        }
        log_graph_start(Some(thread_id), &pending.interrupt.node_id);
        let PendingInterrupt {
            interrupt,
            pending,
            state,
            step,
        } = pending;
        self.run_loop(state, interrupt.node_id, step, ctx, Some((pending, value)))
            .await
            .inspect_err(log_graph_error)
    }

    /// Runs the graph from its first node with `state`.
    ///
    /// With a checkpointer and `config.thread_id`, a checkpoint is written after
    /// every node; a thread waiting on an interrupt must be resumed first.
    pub async fn invoke(
        &self,
        state: S,
        config: Option<RunnableConfig>,
    ) -> Result<RunOutcome<S>, AgentError> {
        let ctx = RunContext::new(config.unwrap_or_default());
        self.start(state, &ctx).await
    }

    /// Continues the thread's suspended node with `value` as the result of its
    /// interrupt point, then walks on exactly as `invoke` would.
    ///
    /// The interrupt is consumed once the node completes; if the node fails it
    /// stays outstanding and the call can be retried.
    pub async fn resume(
        &self,
        config: RunnableConfig,
        value: Value,
    ) -> Result<RunOutcome<S>, AgentError> {
        let ctx = RunContext::new(config);
        self.resume_inner(&ctx, value).await
    }

    /// Continues a thread from its latest checkpoint, e.g. after a crash.
    ///
    /// The successor of the checkpointed node is resolved again from the
    /// checkpointed state. A thread already at `END` returns that state; a thread
    /// waiting on an interrupt returns `Interrupted` without running anything.
    pub async fn recover(&self, config: RunnableConfig) -> Result<RunOutcome<S>, AgentError> {
        let (cp, thread_id) = self.session(&config)?;
        if let Some(pending) = cp.get_interrupt(&config).await? {
            if !self.is_expired(&pending.interrupt) {
                return Ok(RunOutcome::Interrupted {
                    state: pending.state,
                    interrupt: pending.interrupt,
                });
            }
            cp.take_interrupt(&config).await?;
        }
        let (checkpoint, metadata) = cp
            .get_tuple(&config)
            .await?
            .ok_or_else(|| CheckpointError::NotFound(thread_id.to_string()))?;
        let state = checkpoint.channel_values;
        let node_id = metadata.node_id.ok_or_else(|| {
            AgentError::ExecutionFailed(format!(
                "latest checkpoint of `{}` names no node",
                thread_id
            ))
        })?;
        let entry = self.next_map.get(&node_id).ok_or_else(|| {
            AgentError::ExecutionFailed(format!("checkpointed node `{}` is not in this graph", node_id))
        })?;
        let next = entry.resolve(&node_id, &state)?;
        if next == END {
            return Ok(RunOutcome::Complete(state));
        }
        tracing::info!(thread_id, from = %node_id, next = %next, "recovering run");
        let ctx = RunContext::new(config.clone());
        self.run_loop(state, next, metadata.step + 1, &ctx, None)
            .await
            .inspect_err(log_graph_error)
    }

    /// Streams graph execution, emitting events via channel-backed Stream.
    ///
    /// `Interrupt` and `Error` events are sent whatever the modes; either one is
    /// the last event of the stream.
    pub fn stream(
        &self,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let ctx = RunContext {
            config: config.unwrap_or_default(),
            stream_tx: Some(tx),
            stream_mode: stream_mode.into(),
        };
        tokio::spawn(async move {
            let result = graph.start(state, &ctx).await;
            emit_outcome(&ctx, result).await;
        });
        ReceiverStream::new(rx)
    }

    /// Streaming variant of [`resume`](Self::resume).
    pub fn stream_resume(
        &self,
        config: RunnableConfig,
        value: Value,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let ctx = RunContext {
            config,
            stream_tx: Some(tx),
            stream_mode: stream_mode.into(),
        };
        tokio::spawn(async move {
            let result = graph.resume_inner(&ctx, value).await;
            emit_outcome(&ctx, result).await;
        });
        ReceiverStream::new(rx)
    }

    /// Latest checkpointed state of the thread.
    pub async fn get_state(&self, config: &RunnableConfig) -> Result<Option<S>, AgentError> {
        let (cp, _) = self.session(config)?;
        Ok(cp.get_tuple(config).await?.map(|(c, _)| c.channel_values))
    }

    /// Every checkpoint of the thread, oldest first.
    pub async fn get_state_history(
        &self,
        config: &RunnableConfig,
    ) -> Result<Vec<Checkpoint<S>>, AgentError> {
        let (cp, _) = self.session(config)?;
        Ok(cp.history(config).await?)
    }

    /// The thread's outstanding interrupt, if any.
    pub async fn pending_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<Interrupt>, AgentError> {
        let (cp, _) = self.session(config)?;
        Ok(cp.get_interrupt(config).await?.map(|p| p.interrupt))
    }
}

async fn emit_outcome<S>(ctx: &RunContext<S>, result: Result<RunOutcome<S>, AgentError>)
where
    S: Clone + Send + Sync + Debug + 'static,
{
    match result {
        Ok(RunOutcome::Complete(_)) => {}
        Ok(RunOutcome::Interrupted { interrupt, .. }) => {
            ctx.send(StreamEvent::Interrupt(interrupt)).await
        }
        Err(e) => {
            ctx.send(StreamEvent::Error(StreamError {
                node_id: e.node_id().map(str::to_string),
                message: e.to_string(),
            }))
            .await
        }
    }
}
