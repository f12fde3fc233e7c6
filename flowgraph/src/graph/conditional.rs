//! Conditional edges: a router picks the successor from a declared candidate set.

use std::fmt;
use std::sync::Arc;

use crate::error::AgentError;

/// Router function. Takes the state by shared reference, so it cannot mutate it.
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Router plus the targets it is allowed to return (node ids and/or `END`).
pub struct ConditionalRouter<S> {
    router: ConditionalRouterFn<S>,
    candidates: Vec<String>,
}

impl<S> Clone for ConditionalRouter<S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            candidates: self.candidates.clone(),
        }
    }
}

impl<S> ConditionalRouter<S> {
    pub fn new(router: ConditionalRouterFn<S>, candidates: Vec<String>) -> Self {
        Self { router, candidates }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Runs the router and checks the result against the candidates.
    pub fn resolve_next(&self, from: &str, state: &S) -> Result<String, AgentError> {
        let target = (self.router)(state);
        if self.candidates.iter().any(|c| c == &target) {
            Ok(target)
        } else {
            Err(AgentError::Routing {
                from: from.to_string(),
                target,
            })
        }
    }
}

impl<S> fmt::Debug for ConditionalRouter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalRouter")
            .field("candidates", &self.candidates)
            .finish()
    }
}

/// Outgoing edge of a compiled node.
pub enum NextEntry<S> {
    Unconditional(String),
    Conditional(ConditionalRouter<S>),
}

impl<S> Clone for NextEntry<S> {
    fn clone(&self) -> Self {
        match self {
            NextEntry::Unconditional(id) => NextEntry::Unconditional(id.clone()),
            NextEntry::Conditional(r) => NextEntry::Conditional(r.clone()),
        }
    }
}

impl<S> NextEntry<S> {
    /// Every target this edge can lead to.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            NextEntry::Unconditional(id) => vec![id.as_str()],
            NextEntry::Conditional(r) => r.candidates.iter().map(String::as_str).collect(),
        }
    }

    pub fn resolve(&self, from: &str, state: &S) -> Result<String, AgentError> {
        match self {
            NextEntry::Unconditional(id) => Ok(id.clone()),
            NextEntry::Conditional(r) => {
                let target = r.resolve_next(from, state)?;
                tracing::debug!(from, target = %target, "conditional route");
                Ok(target)
            }
        }
    }
}

impl<S> fmt::Debug for NextEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextEntry::Unconditional(id) => f.debug_tuple("Unconditional").field(id).finish(),
            NextEntry::Conditional(r) => f.debug_tuple("Conditional").field(r).finish(),
        }
    }
}
