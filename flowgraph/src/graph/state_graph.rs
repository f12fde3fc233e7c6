//! State graph: nodes + explicit edges (from → to) + conditional edges.
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` and
//! `add_conditional_edges(from, router, candidates)` using `START` and `END` for
//! graph entry/exit, then `compile` or `compile_with_checkpointer` to get a
//! `CompiledStateGraph`. Compilation validates the whole graph at once.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::channels::{BoxedStateUpdater, ReplaceUpdater};
use crate::error::AgentError;
use crate::graph::compile_error::{BuildIssue, CompilationError};
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, NextEntry};
use crate::graph::fn_node::FnNode;
use crate::graph::node::Node;
use crate::graph::node_middleware::NodeMiddleware;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph builder, generic over state type `S`.
///
/// Each node has exactly one outgoing declaration: a single `add_edge` or a single
/// `add_conditional_edges`. A router always sits behind a node, so routers cannot
/// be chained.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Insertion order, for deterministic validation output.
    node_order: Vec<String>,
    duplicate_nodes: Vec<String>,
    edges: Vec<(String, String)>,
    conditional: Vec<(String, ConditionalRouter<S>)>,
    middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    state_updater: BoxedStateUpdater<S>,
    interrupt_ttl: Option<Duration>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            node_order: Vec::new(),
            duplicate_nodes: Vec::new(),
            edges: Vec::new(),
            conditional: Vec::new(),
            middleware: None,
            state_updater: Arc::new(ReplaceUpdater),
            interrupt_ttl: None,
        }
    }

    /// Adds a node. A repeated id is reported by `compile` as `DuplicateNode`.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            self.duplicate_nodes.push(id);
            return self;
        }
        self.node_order.push(id.clone());
        self.nodes.insert(id, node);
        self
    }

    /// Adds a node backed by an async closure (see [`FnNode`]).
    pub fn add_node_fn<F, Fut>(&mut self, id: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S, AgentError>> + Send + 'static,
    {
        let id = id.into();
        let node = Arc::new(FnNode::new(id.clone(), f));
        self.add_node(id, node)
    }

    /// Adds an edge from `from_id` to `to_id`.
    ///
    /// Use `START` for graph entry and `END` for graph exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds a conditional edge: after `from_id` runs, `router` picks the successor
    /// among `candidates` (node ids and/or `END`).
    pub fn add_conditional_edges<R, I, T>(
        &mut self,
        from_id: impl Into<String>,
        router: R,
        candidates: I,
    ) -> &mut Self
    where
        R: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let candidates = candidates.into_iter().map(Into::into).collect();
        self.conditional.push((
            from_id.into(),
            ConditionalRouter::new(Arc::new(router), candidates),
        ));
        self
    }

    /// How node outputs are merged into the state. Default: replace.
    pub fn with_state_updater(&mut self, updater: BoxedStateUpdater<S>) -> &mut Self {
        self.state_updater = updater;
        self
    }

    /// Wraps every node call (e.g. `LoggingNodeMiddleware`).
    pub fn with_middleware(&mut self, middleware: Arc<dyn NodeMiddleware<S>>) -> &mut Self {
        self.middleware = Some(middleware);
        self
    }

    /// Outstanding interrupts older than `ttl` can no longer be resumed.
    pub fn with_interrupt_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.interrupt_ttl = Some(ttl);
        self
    }

    /// Builds the executable graph without persistence.
    ///
    /// Returns `CompilationError` listing every structural problem.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph with a checkpointer. Runs with `config.thread_id`
    /// write a checkpoint after every node and can be interrupted and resumed.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer))
    }

    fn is_known(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        let mut issues = Vec::new();

        for id in &self.duplicate_nodes {
            issues.push(BuildIssue::DuplicateNode(id.clone()));
        }
        for id in &self.node_order {
            if id == START || id == END {
                issues.push(BuildIssue::ReservedNodeId(id.clone()));
            }
        }

        let mut first = None;
        let mut start_targets = Vec::new();
        let mut next_map: HashMap<String, NextEntry<S>> = HashMap::new();
        let mut conflicting = HashSet::new();

        for (from, to) in &self.edges {
            if from == END || to == START || (from == START && to == END) {
                issues.push(BuildIssue::InvalidEdge {
                    from: from.clone(),
                    to: to.clone(),
                });
                continue;
            }
            let mut ok = true;
            for id in [from, to] {
                let reserved = id == START || id == END;
                if !reserved && !self.is_known(id) {
                    issues.push(BuildIssue::UnknownEdgeNode {
                        from: from.clone(),
                        to: to.clone(),
                        missing: id.clone(),
                    });
                    ok = false;
                }
            }
            if from == START {
                start_targets.push(to.clone());
                if ok {
                    first = Some(to.clone());
                }
                continue;
            }
            if !ok {
                continue;
            }
            if next_map.contains_key(from) {
                conflicting.insert(from.clone());
            } else {
                next_map.insert(from.clone(), NextEntry::Unconditional(to.clone()));
            }
        }

        for (from, router) in &self.conditional {
            if from == START {
                issues.push(BuildIssue::ConditionalFromStart);
                continue;
            }
            if from == END || !self.is_known(from) {
                issues.push(BuildIssue::UnknownEdgeNode {
                    from: from.clone(),
                    to: "<conditional>".into(),
                    missing: from.clone(),
                });
                continue;
            }
            if router.candidates().is_empty() {
                issues.push(BuildIssue::EmptyCandidates(from.clone()));
            }
            let mut ok = true;
            for candidate in router.candidates() {
                if candidate != END && !self.is_known(candidate) {
                    issues.push(BuildIssue::UnknownCandidate {
                        from: from.clone(),
                        candidate: candidate.clone(),
                    });
                    ok = false;
                }
            }
            if !ok {
                continue;
            }
            if next_map.contains_key(from) {
                conflicting.insert(from.clone());
            } else {
                next_map.insert(from.clone(), NextEntry::Conditional(router.clone()));
            }
        }

        for id in &self.node_order {
            if conflicting.contains(id) {
                issues.push(BuildIssue::ConflictingEdges(id.clone()));
            }
        }

        match start_targets.len() {
            0 => issues.push(BuildIssue::MissingStart),
            1 => {}
            _ => issues.push(BuildIssue::MultipleStart(start_targets)),
        }

        if let Some(first) = &first {
            issues.extend(self.check_termination(first, &next_map));
        }

        let first_node_id = match first {
            Some(first) if issues.is_empty() => first,
            _ => return Err(CompilationError { issues }),
        };

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id,
            next_map,
            checkpointer,
            middleware: self.middleware,
            state_updater: self.state_updater,
            interrupt_ttl: self.interrupt_ttl,
        })
    }

    /// Every node reachable from `first` must have an outgoing edge and some path to END.
    fn check_termination(
        &self,
        first: &str,
        next_map: &HashMap<String, NextEntry<S>>,
    ) -> Vec<BuildIssue> {
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::from([first.to_string()]);
        while let Some(id) = queue.pop_front() {
            if id == END || !reachable.insert(id.clone()) {
                continue;
            }
            if let Some(entry) = next_map.get(&id) {
                queue.extend(entry.targets().into_iter().map(String::from));
            }
        }

        // Fixed point: a node reaches END if any of its targets is END or reaches END.
        let mut reaches_end: HashSet<&str> = HashSet::new();
        loop {
            let before = reaches_end.len();
            for (from, entry) in next_map {
                if entry
                    .targets()
                    .iter()
                    .any(|t| *t == END || reaches_end.contains(t))
                {
                    reaches_end.insert(from.as_str());
                }
            }
            if reaches_end.len() == before {
                break;
            }
        }

        let mut issues = Vec::new();
        for id in &self.node_order {
            if !reachable.contains(id) {
                if self.nodes.contains_key(id) && id != START && id != END {
                    tracing::warn!(node_id = %id, "node is not reachable from START");
                }
                continue;
            }
            if !next_map.contains_key(id) {
                issues.push(BuildIssue::DeadEnd(id.clone()));
            } else if !reaches_end.contains(id.as_str()) {
                issues.push(BuildIssue::NoPathToEnd(id.clone()));
            }
        }
        issues
    }
}
