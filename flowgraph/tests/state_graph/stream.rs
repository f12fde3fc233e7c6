//! Streaming runs: selected modes, checkpoint events, terminal Interrupt/Error.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use flowgraph::{
    AgentError, Node, NodeOutcome, RunContext, RunnableConfig, StateGraph, StreamEvent,
    StreamMode, END, START,
};
use serde_json::json;
use tokio_stream::StreamExt;

use crate::common::{approval_graph, with_memory, ApprovalNode, CodeState};

fn two_steps() -> StateGraph<CodeState> {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("generate", |mut s: CodeState| async move {
        s.llm_output = Some("answer".into());
        Ok(s)
    });
    graph.add_node_fn("validate", |mut s: CodeState| async move {
        s.accuracy = Some(99.0);
        Ok(s)
    });
    graph
        .add_edge(START, "generate")
        .add_edge("generate", "validate")
        .add_edge("validate", END);
    graph
}

/// **Scenario**: Values mode emits the full state after every node, nothing else.
#[tokio::test]
async fn values_mode_emits_state_per_node() {
    let compiled = two_steps().compile().expect("compiles");
    let events: Vec<_> = compiled
        .stream(CodeState::new("q"), None, [StreamMode::Values])
        .collect()
        .await;
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (StreamEvent::Values(first), StreamEvent::Values(second)) => {
            assert_eq!(first.llm_output.as_deref(), Some("answer"));
            assert_eq!(first.accuracy, None);
            assert_eq!(second.accuracy, Some(99.0));
        }
        other => panic!("expected two Values events, got {:?}", other),
    }
}

/// **Scenario**: Updates and Checkpoints modes name the node that produced each event.
#[tokio::test]
async fn updates_and_checkpoints_name_nodes() {
    let compiled = with_memory(two_steps());
    let cfg = RunnableConfig::for_thread("streamed");
    let events: Vec<_> = compiled
        .stream(
            CodeState::new("q"),
            Some(cfg.clone()),
            [StreamMode::Updates, StreamMode::Checkpoints],
        )
        .collect()
        .await;

    let updates: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Updates { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec!["generate", "validate"]);

    let checkpoints: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Checkpoint(c) => Some((c.node_id.as_str(), c.step, c.thread_id.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        checkpoints,
        vec![("generate", 0, "streamed"), ("validate", 1, "streamed")]
    );
    assert!(events.iter().all(|e| !matches!(e, StreamEvent::Values(_))));
}

/// **Scenario**: An interrupt ends the stream with an Interrupt event even when no mode is selected;
/// stream_resume finishes the run.
#[tokio::test]
async fn interrupt_event_always_sent() {
    let compiled = with_memory(approval_graph(ApprovalNode::new()));
    let cfg = RunnableConfig::for_thread("stream-approve");
    let events: Vec<_> = compiled
        .stream(CodeState::new("q"), Some(cfg.clone()), HashSet::new())
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Interrupt(i) => {
            assert_eq!(i.node_id, "approve");
            assert_eq!(i.value["query"], "need approval");
        }
        other => panic!("expected Interrupt, got {:?}", other),
    }
    assert!(events[0].is_terminal());

    let resumed: Vec<_> = compiled
        .stream_resume(cfg, json!({"data": "approved"}), [StreamMode::Values])
        .collect()
        .await;
    match resumed.last() {
        Some(StreamEvent::Values(s)) => assert_eq!(s.trace.last().map(String::as_str), Some("finish")),
        other => panic!("expected final Values, got {:?}", other),
    }
}

/// **Scenario**: A failing node ends the stream with an Error event naming the node.
#[tokio::test]
async fn error_event_ends_stream() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("generate", |s: CodeState| async move { Ok(s) });
    graph.add_node_fn("validate", |_s: CodeState| async move {
        Err(AgentError::Provider("rate limited".into()))
    });
    graph
        .add_edge(START, "generate")
        .add_edge("generate", "validate")
        .add_edge("validate", END);
    let compiled = graph.compile().expect("compiles");

    let events: Vec<_> = compiled
        .stream(CodeState::new("q"), None, [StreamMode::Values])
        .collect()
        .await;
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StreamEvent::Values(_)));
    match &events[1] {
        StreamEvent::Error(e) => {
            assert_eq!(e.node_id.as_deref(), Some("validate"));
            assert!(e.message.contains("rate limited"));
        }
        other => panic!("expected Error, got {:?}", other),
    }
}

struct ProgressNode;

#[async_trait]
impl Node<CodeState> for ProgressNode {
    fn id(&self) -> &str {
        "progress"
    }

    async fn run(&self, state: CodeState) -> Result<NodeOutcome<CodeState>, AgentError> {
        Ok(state.into())
    }

    async fn run_with_context(
        &self,
        state: CodeState,
        ctx: &RunContext<CodeState>,
    ) -> Result<NodeOutcome<CodeState>, AgentError> {
        for pct in [50, 100] {
            ctx.emit_custom(json!({"progress": pct})).await;
        }
        Ok(state.into())
    }
}

/// **Scenario**: Custom payloads from a node reach the stream only in Custom mode.
#[tokio::test]
async fn custom_events_from_node() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node("progress", Arc::new(ProgressNode));
    graph.add_edge(START, "progress").add_edge("progress", END);
    let compiled = graph.compile().expect("compiles");

    let events: Vec<_> = compiled
        .stream(CodeState::default(), None, [StreamMode::Custom])
        .collect()
        .await;
    let progress: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Custom(v) => v["progress"].as_i64(),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![50, 100]);

    let quiet: Vec<_> = compiled
        .stream(CodeState::default(), None, [StreamMode::Values])
        .collect()
        .await;
    assert!(quiet.iter().all(|e| !matches!(e, StreamEvent::Custom(_))));
}
