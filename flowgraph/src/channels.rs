//! State merge: how a node's output is folded into the graph state.
//!
//! By default a node's output replaces the state ([`ReplaceUpdater`]). Graphs whose
//! nodes return patches declare per-field behavior with [`FieldReducers`]: each
//! declared field is either replaced or appended to; undeclared fields keep their
//! current value. Declarations are made when the graph is built, never inferred.

use std::fmt;
use std::sync::Arc;

/// Folds a node's output into the current state.
pub trait StateUpdater<S>: Send + Sync {
    fn apply_update(&self, current: &mut S, update: S);

    /// Short name for logs.
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

pub type BoxedStateUpdater<S> = Arc<dyn StateUpdater<S>>;

/// The node output becomes the new state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceUpdater;

impl<S> StateUpdater<S> for ReplaceUpdater {
    fn apply_update(&self, current: &mut S, update: S) {
        *current = update;
    }

    fn describe(&self) -> String {
        "replace".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Replace,
    Append,
}

type Merge<S> = Box<dyn Fn(&mut S, &mut S) + Send + Sync>;

struct FieldReducer<S> {
    name: String,
    mode: FieldMode,
    merge: Merge<S>,
}

/// Per-field reducers declared at graph definition time.
///
/// ```rust,ignore
/// let updater = FieldReducers::new()
///     .append("messages", |s: &mut ChatState| &mut s.messages)
///     .replace("summary", |s: &mut ChatState| &mut s.summary);
/// graph.with_state_updater(Arc::new(updater));
/// ```
pub struct FieldReducers<S> {
    fields: Vec<FieldReducer<S>>,
}

impl<S> Default for FieldReducers<S> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<S: 'static> FieldReducers<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The update's value for this field replaces the current one.
    pub fn replace<T: 'static>(mut self, name: impl Into<String>, field: fn(&mut S) -> &mut T) -> Self {
        self.fields.push(FieldReducer {
            name: name.into(),
            mode: FieldMode::Replace,
            merge: Box::new(move |current: &mut S, update: &mut S| {
                std::mem::swap(field(current), field(update));
            }),
        });
        self
    }

    /// The update's items are appended to the current list.
    pub fn append<T: 'static>(
        mut self,
        name: impl Into<String>,
        field: fn(&mut S) -> &mut Vec<T>,
    ) -> Self {
        self.fields.push(FieldReducer {
            name: name.into(),
            mode: FieldMode::Append,
            merge: Box::new(move |current: &mut S, update: &mut S| {
                let items = std::mem::take(field(update));
                field(current).extend(items);
            }),
        });
        self
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> Vec<(&str, FieldMode)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.mode))
            .collect()
    }
}

impl<S> StateUpdater<S> for FieldReducers<S> {
    fn apply_update(&self, current: &mut S, mut update: S) {
        for field in &self.fields {
            (field.merge)(current, &mut update);
        }
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| match f.mode {
                FieldMode::Replace => f.name.clone(),
                FieldMode::Append => format!("{}+", f.name),
            })
            .collect();
        format!("fields[{}]", parts.join(","))
    }
}

impl<S> fmt::Debug for FieldReducers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.fields.iter().map(|r| (&r.name, r.mode)))
            .finish()
    }
}
