//! StateGraph invoke: linear runs, field merge, node failures.

use std::sync::Arc;

use flowgraph::{AgentError, FieldReducers, RunnableConfig, StateGraph, END, START};

use crate::common::{with_memory, CodeState};

/// **Scenario**: Nodes run in edge order and each sees the previous node's output.
#[tokio::test]
async fn invoke_linear_chain_in_order() {
    let mut graph = StateGraph::<CodeState>::new();
    for id in ["first", "second", "third"] {
        graph.add_node_fn(id, move |mut s: CodeState| async move {
            s.trace.push(id.to_string());
            Ok(s)
        });
    }
    graph
        .add_edge(START, "first")
        .add_edge("first", "second")
        .add_edge("second", "third")
        .add_edge("third", END);
    let compiled = graph.compile().expect("compiles");

    let out = compiled.invoke(CodeState::new("hi"), None).await.unwrap();
    assert!(!out.is_interrupted());
    let state = out.into_state();
    assert_eq!(state.trace, vec!["first", "second", "third"]);
    assert_eq!(state.user_query, "hi");
}

/// **Scenario**: With field reducers, a node returning a partial state appends to
/// `trace` and replaces only the declared fields.
#[tokio::test]
async fn field_reducers_merge_node_output() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.with_state_updater(Arc::new(
        FieldReducers::new()
            .append("trace", |s: &mut CodeState| &mut s.trace)
            .replace("llm_output", |s: &mut CodeState| &mut s.llm_output),
    ));
    graph.add_node_fn("generate", |_s: CodeState| async move {
        Ok(CodeState {
            llm_output: Some("fn main() {}".into()),
            trace: vec!["generate".into()],
            ..Default::default()
        })
    });
    graph.add_edge(START, "generate").add_edge("generate", END);
    let compiled = graph.compile().expect("compiles");

    let mut input = CodeState::new("write hello world");
    input.trace.push("input".into());
    let state = compiled.invoke(input, None).await.unwrap().into_state();
    assert_eq!(state.user_query, "write hello world");
    assert_eq!(state.llm_output.as_deref(), Some("fn main() {}"));
    assert_eq!(state.trace, vec!["input", "generate"]);
}

/// **Scenario**: A failing node aborts the run; the error names the node and keeps the cause.
#[tokio::test]
async fn failing_node_reports_its_id() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("ok", |s: CodeState| async move { Ok(s) });
    graph.add_node_fn("boom", |_s: CodeState| async move {
        Err(AgentError::ExecutionFailed("validator crashed".into()))
    });
    graph
        .add_edge(START, "ok")
        .add_edge("ok", "boom")
        .add_edge("boom", END);
    let compiled = graph.compile().expect("compiles");

    let err = compiled
        .invoke(CodeState::new("q"), None)
        .await
        .expect_err("boom fails");
    assert_eq!(err.node_id(), Some("boom"));
    assert!(matches!(
        err.root_cause(),
        AgentError::ExecutionFailed(msg) if msg == "validator crashed"
    ));
    assert!(err.to_string().contains("boom"));
}

/// **Scenario**: Every invoke starts at the first node, even on a thread with history.
#[tokio::test]
async fn invoke_restarts_from_first_node() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("count", |mut s: CodeState| async move {
        s.retry_count += 1;
        Ok(s)
    });
    graph.add_edge(START, "count").add_edge("count", END);
    let compiled = with_memory(graph);
    let cfg = RunnableConfig::for_thread("again");

    let first = compiled
        .invoke(CodeState::new("a"), Some(cfg.clone()))
        .await
        .unwrap();
    assert_eq!(first.state().retry_count, 1);
    let second = compiled
        .invoke(CodeState::new("b"), Some(cfg.clone()))
        .await
        .unwrap();
    assert_eq!(second.state().retry_count, 1);
    assert_eq!(second.state().user_query, "b");
    assert_eq!(compiled.get_state_history(&cfg).await.unwrap().len(), 2);
}
