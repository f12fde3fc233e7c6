//! Conditional edges: routers pick the successor from the current state.

use flowgraph::{AgentError, StateGraph, END, START};

use crate::common::CodeState;

fn classify_graph() -> StateGraph<CodeState> {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("classify_query", |mut s: CodeState| async move {
        s.trace.push("classify_query".into());
        Ok(s)
    });
    graph.add_node_fn("coding", |mut s: CodeState| async move {
        s.trace.push("coding".into());
        Ok(s)
    });
    graph.add_node_fn("general", |mut s: CodeState| async move {
        s.trace.push("general".into());
        Ok(s)
    });
    graph.add_edge(START, "classify_query");
    graph.add_conditional_edges(
        "classify_query",
        |s: &CodeState| {
            if s.user_query.contains("code") {
                "coding".to_string()
            } else {
                "general".to_string()
            }
        },
        ["coding", "general"],
    );
    graph.add_edge("coding", END).add_edge("general", END);
    graph
}

/// **Scenario**: The router's choice decides which branch runs; the other never does.
#[tokio::test]
async fn router_picks_branch_from_state() {
    let compiled = classify_graph().compile().expect("compiles");

    let coding = compiled
        .invoke(CodeState::new("write code to sort a list"), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(coding.trace, vec!["classify_query", "coding"]);

    let general = compiled
        .invoke(CodeState::new("what is the weather"), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(general.trace, vec!["classify_query", "general"]);
}

/// **Scenario**: Same state, same route; repeated runs are identical.
#[tokio::test]
async fn routing_is_deterministic() {
    let compiled = classify_graph().compile().expect("compiles");
    let mut traces = Vec::new();
    for _ in 0..5 {
        let s = compiled
            .invoke(CodeState::new("review my code"), None)
            .await
            .unwrap()
            .into_state();
        traces.push(s.trace);
    }
    assert!(traces.windows(2).all(|w| w[0] == w[1]));
}

/// **Scenario**: A router returning an undeclared target fails the run with Routing.
#[tokio::test]
async fn undeclared_target_is_a_routing_error() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("a", |s: CodeState| async move { Ok(s) });
    graph.add_node_fn("b", |s: CodeState| async move { Ok(s) });
    graph.add_edge(START, "a");
    graph.add_conditional_edges("a", |_: &CodeState| "c".to_string(), ["b", END]);
    graph.add_edge("b", END);
    let compiled = graph.compile().expect("compiles");

    let err = compiled
        .invoke(CodeState::default(), None)
        .await
        .expect_err("router goes nowhere");
    assert!(matches!(
        err.root_cause(),
        AgentError::Routing { from, target } if from == "a" && target == "c"
    ));
}

/// **Scenario**: A router may send the run straight to END.
#[tokio::test]
async fn router_can_end_the_run() {
    let mut graph = StateGraph::<CodeState>::new();
    graph.add_node_fn("gate", |mut s: CodeState| async move {
        s.trace.push("gate".into());
        Ok(s)
    });
    graph.add_node_fn("work", |mut s: CodeState| async move {
        s.trace.push("work".into());
        Ok(s)
    });
    graph.add_edge(START, "gate");
    graph.add_conditional_edges(
        "gate",
        |s: &CodeState| {
            if s.user_query.is_empty() {
                END.to_string()
            } else {
                "work".to_string()
            }
        },
        ["work", END],
    );
    graph.add_edge("work", END);
    let compiled = graph.compile().expect("compiles");

    let state = compiled
        .invoke(CodeState::default(), None)
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.trace, vec!["gate"]);
}
