//! Shared state types and nodes for StateGraph integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flowgraph::{
    AgentError, CompiledStateGraph, MemorySaver, Node, NodeOutcome, RetryGuard, StateGraph, END,
    START,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// State of the generate → validate → retry workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeState {
    pub user_query: String,
    pub llm_output: Option<String>,
    pub accuracy: Option<f64>,
    pub retry_count: u32,
    pub trace: Vec<String>,
}

impl CodeState {
    pub fn new(query: &str) -> Self {
        Self {
            user_query: query.to_string(),
            ..Default::default()
        }
    }
}

/// generate → validate → (increment_retry_count → generate | END), validator always
/// scores `accuracy`.
pub fn retry_graph(accuracy: f64, guard: RetryGuard) -> StateGraph<CodeState> {
    let mut g = StateGraph::<CodeState>::new();
    g.add_node_fn("generate", |mut s: CodeState| async move {
        s.llm_output = Some(format!("attempt {}", s.retry_count));
        s.trace.push("generate".into());
        Ok(s)
    });
    g.add_node_fn("validate", move |mut s: CodeState| async move {
        s.accuracy = Some(accuracy);
        s.trace.push("validate".into());
        Ok(s)
    });
    g.add_node_fn("increment_retry_count", |mut s: CodeState| async move {
        s.retry_count += 1;
        s.trace.push("increment_retry_count".into());
        Ok(s)
    });
    g.add_edge(START, "generate");
    g.add_edge("generate", "validate");
    g.add_conditional_edges(
        "validate",
        move |s: &CodeState| {
            guard
                .route(s.accuracy, s.retry_count, "increment_retry_count")
                .to_string()
        },
        ["increment_retry_count", END],
    );
    g.add_edge("increment_retry_count", "generate");
    g
}

/// Node that needs approval: counts how often its pre-interrupt part ran and
/// records the value it got back.
pub struct ApprovalNode {
    pub before_interrupt: AtomicUsize,
    pub observed: Mutex<Option<Value>>,
}

impl ApprovalNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            before_interrupt: AtomicUsize::new(0),
            observed: Mutex::new(None),
        })
    }

    pub fn runs_before_interrupt(&self) -> usize {
        self.before_interrupt.load(Ordering::SeqCst)
    }

    pub fn observed(&self) -> Option<Value> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Node<CodeState> for ApprovalNode {
    fn id(&self) -> &str {
        "approve"
    }

    async fn run(&self, mut state: CodeState) -> Result<NodeOutcome<CodeState>, AgentError> {
        self.before_interrupt.fetch_add(1, Ordering::SeqCst);
        state.trace.push("approve:asked".into());
        Ok(NodeOutcome::suspend(state, json!({"query": "need approval"})))
    }

    async fn resume(
        &self,
        _state: CodeState,
        mut pending: CodeState,
        value: Value,
    ) -> Result<NodeOutcome<CodeState>, AgentError> {
        *self.observed.lock().unwrap() = Some(value["data"].clone());
        pending.trace.push(format!(
            "approve:{}",
            value["data"].as_str().unwrap_or_default()
        ));
        Ok(pending.into())
    }
}

/// prepare → approve (suspends) → finish.
pub fn approval_graph(node: Arc<ApprovalNode>) -> StateGraph<CodeState> {
    let mut g = StateGraph::<CodeState>::new();
    g.add_node_fn("prepare", |mut s: CodeState| async move {
        s.trace.push("prepare".into());
        Ok(s)
    });
    g.add_node("approve", node);
    g.add_node_fn("finish", |mut s: CodeState| async move {
        s.trace.push("finish".into());
        Ok(s)
    });
    g.add_edge(START, "prepare")
        .add_edge("prepare", "approve")
        .add_edge("approve", "finish")
        .add_edge("finish", END);
    g
}

pub fn with_memory(g: StateGraph<CodeState>) -> CompiledStateGraph<CodeState> {
    g.compile_with_checkpointer(Arc::new(MemorySaver::new()))
        .expect("graph compiles")
}
