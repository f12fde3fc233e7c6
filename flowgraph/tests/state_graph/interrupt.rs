//! Interrupt and resume: a node suspends with a payload, the caller resumes it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flowgraph::graph::PendingInterrupt;
use flowgraph::{
    AgentError, Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata,
    CheckpointSource, Checkpointer, MemorySaver, Node, NodeOutcome, RunnableConfig, StateGraph,
    END, START,
};
use serde_json::{json, Value};

use crate::common::{approval_graph, with_memory, ApprovalNode, CodeState};

/// **Scenario**: The node suspends with its payload; resume hands it `data` and the
/// run continues to END. Code before the interrupt point runs once.
#[tokio::test]
async fn interrupt_then_resume_completes() {
    let node = ApprovalNode::new();
    let compiled = with_memory(approval_graph(node.clone()));
    let cfg = RunnableConfig::for_thread("approve-1");

    let out = compiled
        .invoke(CodeState::new("deploy"), Some(cfg.clone()))
        .await
        .unwrap();
    assert!(out.is_interrupted());
    let interrupt = out.interrupt().expect("interrupt").clone();
    assert_eq!(interrupt.node_id, "approve");
    assert_eq!(interrupt.value, json!({"query": "need approval"}));
    assert_eq!(out.state().trace, vec!["prepare"]);
    assert_eq!(
        compiled.pending_interrupt(&cfg).await.unwrap(),
        Some(interrupt)
    );

    let done = compiled
        .resume(cfg.clone(), json!({"data": "approved"}))
        .await
        .unwrap();
    assert!(!done.is_interrupted());
    assert_eq!(node.observed(), Some(json!("approved")));
    assert_eq!(node.runs_before_interrupt(), 1);
    assert_eq!(
        done.state().trace,
        vec!["prepare", "approve:asked", "approve:approved", "finish"]
    );
    assert_eq!(compiled.pending_interrupt(&cfg).await.unwrap(), None);

    let history = compiled.get_state_history(&cfg).await.unwrap();
    let sources: Vec<_> = history.iter().map(|c| c.metadata.source).collect();
    assert_eq!(
        sources,
        vec![
            CheckpointSource::Loop,
            CheckpointSource::Resume,
            CheckpointSource::Loop
        ]
    );
}

/// **Scenario**: Resume on a thread with nothing waiting fails with NoPendingInterrupt.
#[tokio::test]
async fn resume_without_interrupt_fails() {
    let compiled = with_memory(approval_graph(ApprovalNode::new()));
    let err = compiled
        .resume(RunnableConfig::for_thread("idle"), json!({"data": "x"}))
        .await
        .expect_err("nothing to resume");
    assert!(matches!(err, AgentError::NoPendingInterrupt(t) if t == "idle"));
}

/// **Scenario**: A new invoke on a waiting thread is refused; resume still works after.
#[tokio::test]
async fn invoke_while_interrupted_is_refused() {
    let compiled = with_memory(approval_graph(ApprovalNode::new()));
    let cfg = RunnableConfig::for_thread("busy");
    compiled
        .invoke(CodeState::new("a"), Some(cfg.clone()))
        .await
        .unwrap();
    let err = compiled
        .invoke(CodeState::new("b"), Some(cfg.clone()))
        .await
        .expect_err("interrupt outstanding");
    assert!(matches!(err, AgentError::InterruptPending(_)));
    assert!(compiled
        .resume(cfg, json!({"data": "ok"}))
        .await
        .is_ok());
}

/// **Scenario**: recover on a waiting thread reports the interrupt instead of running.
#[tokio::test]
async fn recover_reports_outstanding_interrupt() {
    let node = ApprovalNode::new();
    let compiled = with_memory(approval_graph(node.clone()));
    let cfg = RunnableConfig::for_thread("wait");
    compiled
        .invoke(CodeState::new("a"), Some(cfg.clone()))
        .await
        .unwrap();
    let out = compiled.recover(cfg).await.unwrap();
    assert!(out.is_interrupted());
    assert_eq!(node.runs_before_interrupt(), 1);
}

/// **Scenario**: Suspending needs a session; without a checkpointer the run fails.
#[tokio::test]
async fn interrupt_without_checkpointer_fails() {
    let compiled = approval_graph(ApprovalNode::new())
        .compile()
        .expect("compiles");
    let err = compiled
        .invoke(CodeState::new("a"), Some(RunnableConfig::for_thread("t")))
        .await
        .expect_err("no checkpointer");
    assert!(matches!(err, AgentError::SessionRequired));
}

/// **Scenario**: An interrupt older than the TTL cannot be resumed; the thread is free again.
#[tokio::test]
async fn expired_interrupt_is_dropped() {
    let mut graph = approval_graph(ApprovalNode::new());
    graph.with_interrupt_ttl(Duration::from_millis(10));
    let compiled = with_memory(graph);
    let cfg = RunnableConfig::for_thread("slow");
    compiled
        .invoke(CodeState::new("a"), Some(cfg.clone()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = compiled
        .resume(cfg.clone(), json!({"data": "late"}))
        .await
        .expect_err("expired");
    assert!(matches!(err, AgentError::InterruptExpired(_)));
    assert_eq!(compiled.pending_interrupt(&cfg).await.unwrap(), None);
    let again = compiled
        .invoke(CodeState::new("b"), Some(cfg))
        .await
        .unwrap();
    assert!(again.is_interrupted());
}

/// Suspends for a ticket number; resume fails unless `data` is a number.
struct TicketNode;

#[async_trait]
impl Node<CodeState> for TicketNode {
    fn id(&self) -> &str {
        "ticket"
    }

    async fn run(&self, state: CodeState) -> Result<NodeOutcome<CodeState>, AgentError> {
        Ok(NodeOutcome::suspend(state, json!({"query": "ticket number?"})))
    }

    async fn resume(
        &self,
        _state: CodeState,
        mut pending: CodeState,
        value: Value,
    ) -> Result<NodeOutcome<CodeState>, AgentError> {
        let n = value["data"]
            .as_u64()
            .ok_or_else(|| AgentError::ExecutionFailed("ticket must be a number".into()))?;
        pending.trace.push(format!("ticket:{}", n));
        Ok(pending.into())
    }
}

/// **Scenario**: A failed resume keeps the interrupt so the caller can retry with better data.
#[tokio::test]
async fn failed_resume_keeps_interrupt() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node("ticket", Arc::new(TicketNode));
    graph.add_edge(START, "ticket").add_edge("ticket", END);
    let compiled = with_memory(graph);
    let cfg = RunnableConfig::for_thread("retry-resume");
    compiled
        .invoke(CodeState::new("a"), Some(cfg.clone()))
        .await
        .unwrap();

    let err = compiled
        .resume(cfg.clone(), json!({"data": "abc"}))
        .await
        .expect_err("bad data");
    assert_eq!(err.node_id(), Some("ticket"));
    assert!(compiled.pending_interrupt(&cfg).await.unwrap().is_some());

    let out = compiled
        .resume(cfg.clone(), json!({"data": 42}))
        .await
        .unwrap();
    assert_eq!(out.state().trace, vec!["ticket:42"]);
    assert!(compiled.pending_interrupt(&cfg).await.unwrap().is_none());
}

/// **Scenario**: A node without a resume implementation reports ResumeUnsupported.
#[tokio::test]
async fn plain_node_cannot_resume() {
    struct Once;

    #[async_trait]
    impl Node<CodeState> for Once {
        fn id(&self) -> &str {
            "once"
        }

        async fn run(&self, state: CodeState) -> Result<NodeOutcome<CodeState>, AgentError> {
            Ok(NodeOutcome::suspend(state, json!({})))
        }
    }

    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node("once", Arc::new(Once));
    graph.add_edge(START, "once").add_edge("once", END);
    let compiled = with_memory(graph);
    let cfg = RunnableConfig::for_thread("once");
    compiled
        .invoke(CodeState::default(), Some(cfg.clone()))
        .await
        .unwrap();
    let err = compiled
        .resume(cfg, json!({"data": 1}))
        .await
        .expect_err("no resume");
    assert!(matches!(err.root_cause(), AgentError::ResumeUnsupported(id) if id == "once"));
}

/// MemorySaver whose checkpoint writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemorySaver<CodeState>,
    fail_puts: AtomicBool,
}

#[async_trait]
impl Checkpointer<CodeState> for FlakyStore {
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<CodeState>,
    ) -> Result<String, CheckpointError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(CheckpointError::Storage("disk full".into()));
        }
        self.inner.put(config, checkpoint).await
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<CodeState>, CheckpointMetadata)>, CheckpointError> {
        self.inner.get_tuple(config).await
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        self.inner.list(config, limit).await
    }

    async fn history(
        &self,
        config: &RunnableConfig,
    ) -> Result<Vec<Checkpoint<CodeState>>, CheckpointError> {
        self.inner.history(config).await
    }

    async fn put_interrupt(
        &self,
        config: &RunnableConfig,
        pending: &PendingInterrupt<CodeState>,
    ) -> Result<(), CheckpointError> {
        self.inner.put_interrupt(config, pending).await
    }

    async fn get_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<CodeState>>, CheckpointError> {
        self.inner.get_interrupt(config).await
    }

    async fn take_interrupt(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<PendingInterrupt<CodeState>>, CheckpointError> {
        self.inner.take_interrupt(config).await
    }

    async fn delete_thread(&self, config: &RunnableConfig) -> Result<(), CheckpointError> {
        self.inner.delete_thread(config).await
    }
}

/// **Scenario**: When the resumed node's checkpoint cannot be written, the interrupt
/// stays outstanding and a later resume finishes the run.
#[tokio::test]
async fn failed_checkpoint_write_keeps_interrupt() {
    let store = Arc::new(FlakyStore::default());
    let node = ApprovalNode::new();
    let compiled = approval_graph(node.clone())
        .compile_with_checkpointer(store.clone())
        .expect("graph compiles");
    let cfg = RunnableConfig::for_thread("t");
    compiled
        .invoke(CodeState::new("deploy"), Some(cfg.clone()))
        .await
        .unwrap();

    store.fail_puts.store(true, Ordering::SeqCst);
    let err = compiled
        .resume(cfg.clone(), json!({"data": "approved"}))
        .await
        .expect_err("write fails");
    assert!(matches!(err.root_cause(), AgentError::Checkpoint(_)), "{:?}", err);
    assert!(compiled.pending_interrupt(&cfg).await.unwrap().is_some());
    assert_eq!(compiled.get_state_history(&cfg).await.unwrap().len(), 1);

    store.fail_puts.store(false, Ordering::SeqCst);
    let out = compiled
        .resume(cfg.clone(), json!({"data": "approved"}))
        .await
        .unwrap();
    assert_eq!(
        out.state().trace,
        vec!["prepare", "approve:asked", "approve:approved", "finish"]
    );
    assert!(compiled.pending_interrupt(&cfg).await.unwrap().is_none());
    assert_eq!(node.runs_before_interrupt(), 1);
}
