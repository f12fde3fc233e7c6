//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the graph definition is structurally
//! invalid. Validation runs over the whole graph and reports every problem found.

use std::fmt;

use thiserror::Error;

/// One structural problem in a graph definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildIssue {
    /// `add_node` was called twice with the same id.
    DuplicateNode(String),
    /// A node was registered under `START` or `END`.
    ReservedNodeId(String),
    /// No edge leaves `START`.
    MissingStart,
    /// More than one edge leaves `START`.
    MultipleStart(Vec<String>),
    /// An edge references a node that was never added.
    UnknownEdgeNode {
        from: String,
        to: String,
        missing: String,
    },
    /// A conditional edge declares a candidate that is neither a node nor `END`.
    UnknownCandidate { from: String, candidate: String },
    /// A conditional edge declares no candidates at all.
    EmptyCandidates(String),
    /// An edge leaves `END`, enters `START`, or joins `START` straight to `END`.
    InvalidEdge { from: String, to: String },
    /// A node has more than one outgoing declaration.
    ConflictingEdges(String),
    /// A conditional edge leaves `START`; the first node must be fixed.
    ConditionalFromStart,
    /// A reachable node has no outgoing edge.
    DeadEnd(String),
    /// A reachable node cannot reach `END` along any path.
    NoPathToEnd(String),
}

impl fmt::Display for BuildIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildIssue::DuplicateNode(id) => write!(f, "duplicate node `{}`", id),
            BuildIssue::ReservedNodeId(id) => write!(f, "node id `{}` is reserved", id),
            BuildIssue::MissingStart => write!(f, "no edge from START"),
            BuildIssue::MultipleStart(targets) => {
                write!(f, "more than one edge from START: {}", targets.join(", "))
            }
            BuildIssue::UnknownEdgeNode { from, to, missing } => {
                write!(f, "edge `{}` -> `{}` references unknown node `{}`", from, to, missing)
            }
            BuildIssue::UnknownCandidate { from, candidate } => write!(
                f,
                "conditional edge from `{}` declares unknown candidate `{}`",
                from, candidate
            ),
            BuildIssue::EmptyCandidates(from) => {
                write!(f, "conditional edge from `{}` has no candidates", from)
            }
            BuildIssue::InvalidEdge { from, to } => {
                write!(f, "edge `{}` -> `{}` leaves END, enters START or skips every node", from, to)
            }
            BuildIssue::ConflictingEdges(id) => {
                write!(f, "node `{}` has more than one outgoing edge declaration", id)
            }
            BuildIssue::ConditionalFromStart => {
                write!(f, "conditional edges from START are not supported")
            }
            BuildIssue::DeadEnd(id) => write!(f, "node `{}` has no outgoing edge", id),
            BuildIssue::NoPathToEnd(id) => write!(f, "node `{}` has no path to END", id),
        }
    }
}

/// Error when compiling a state graph. Lists every issue, not just the first.
#[derive(Debug, Error)]
#[error("invalid graph: {}", join_issues(.issues))]
pub struct CompilationError {
    pub issues: Vec<BuildIssue>,
}

impl CompilationError {
    pub fn contains(&self, issue: &BuildIssue) -> bool {
        self.issues.contains(issue)
    }
}

fn join_issues(issues: &[BuildIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
