//! StateGraph compile failure cases. Every issue is reported, not just the first.

use flowgraph::{BuildIssue, StateGraph, END, START};

use crate::common::CodeState;

fn pass(graph: &mut StateGraph<CodeState>, id: &str) {
    graph.add_node_fn(id, |s: CodeState| async move { Ok(s) });
}

#[test]
fn compile_fails_when_edge_refers_to_unknown_node() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "echo");
    graph.add_edge(START, "echo");
    graph.add_edge("echo", "missing");

    let err = graph.compile().err().expect("expected compile failure");
    assert!(err.contains(&BuildIssue::UnknownEdgeNode {
        from: "echo".into(),
        to: "missing".into(),
        missing: "missing".into(),
    }));
}

#[test]
fn compile_fails_without_start_edge() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "echo");
    graph.add_edge("echo", END);
    let err = graph.compile().err().expect("expected compile failure");
    assert_eq!(err.issues, vec![BuildIssue::MissingStart]);
}

/// **Scenario**: Several independent problems come back together in one error.
#[test]
fn compile_reports_every_issue() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    pass(&mut graph, "a");
    pass(&mut graph, "b");
    pass(&mut graph, "c");
    graph.add_edge(START, "a");
    graph.add_edge("a", "ghost");
    graph.add_conditional_edges("b", |_: &CodeState| END.to_string(), ["nowhere", END]);
    graph.add_edge(END, "c");

    let err = graph.compile().err().expect("expected compile failure");
    assert!(err.contains(&BuildIssue::DuplicateNode("a".into())), "{}", err);
    assert!(err.contains(&BuildIssue::UnknownEdgeNode {
        from: "a".into(),
        to: "ghost".into(),
        missing: "ghost".into(),
    }));
    assert!(err.contains(&BuildIssue::UnknownCandidate {
        from: "b".into(),
        candidate: "nowhere".into(),
    }));
    assert!(err.contains(&BuildIssue::InvalidEdge {
        from: END.into(),
        to: "c".into(),
    }));
    assert!(err.issues.len() >= 4, "{:?}", err.issues);
}

/// **Scenario**: START wired straight to END leaves the graph without a first node.
#[test]
fn compile_rejects_start_to_end() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    graph.add_edge(START, END).add_edge("a", END);
    let err = graph.compile().err().expect("expected compile failure");
    assert_eq!(
        err.issues,
        vec![
            BuildIssue::InvalidEdge {
                from: START.into(),
                to: END.into(),
            },
            BuildIssue::MissingStart,
        ]
    );
}

/// **Scenario**: A reachable node without any outgoing edge is a dead end; its
/// predecessor then has no path to END either.
#[test]
fn compile_fails_on_dead_end() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    pass(&mut graph, "b");
    graph.add_edge(START, "a").add_edge("a", "b");
    let err = graph.compile().err().expect("expected compile failure");
    assert_eq!(
        err.issues,
        vec![
            BuildIssue::NoPathToEnd("a".into()),
            BuildIssue::DeadEnd("b".into())
        ]
    );
}

/// **Scenario**: Two outgoing declarations on one node conflict; so does a second START edge.
#[test]
fn compile_fails_on_conflicting_edges() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    pass(&mut graph, "b");
    graph.add_edge(START, "a").add_edge(START, "b");
    graph.add_edge("a", END);
    graph.add_conditional_edges("a", |_: &CodeState| "b".to_string(), ["b"]);
    graph.add_edge("b", END);
    let err = graph.compile().err().expect("expected compile failure");
    assert!(err.contains(&BuildIssue::ConflictingEdges("a".into())));
    assert!(err.contains(&BuildIssue::MultipleStart(vec!["a".into(), "b".into()])));
}

/// **Scenario**: Conditional edges out of START and reserved node ids are rejected.
#[test]
fn compile_rejects_start_router_and_reserved_ids() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    pass(&mut graph, END);
    graph.add_conditional_edges(START, |_: &CodeState| "a".to_string(), ["a"]);
    graph.add_edge("a", END);
    let err = graph.compile().err().expect("expected compile failure");
    assert!(err.contains(&BuildIssue::ConditionalFromStart));
    assert!(err.contains(&BuildIssue::ReservedNodeId(END.into())));
    assert!(err.contains(&BuildIssue::MissingStart));
}

/// **Scenario**: An unreachable node does not fail compilation.
#[test]
fn unreachable_node_is_allowed() {
    let mut graph = StateGraph::<CodeState>::new();
    pass(&mut graph, "a");
    pass(&mut graph, "orphan");
    graph.add_edge(START, "a").add_edge("a", END);
    assert!(graph.compile().is_ok());
}
