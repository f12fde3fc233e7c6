//! Optional overrides for a run (CLI flags or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). Callers
//! (the binary or tests) build a `RunOptions` and apply it on top of the env config.

/// Optional overrides: model, sampling, DB path, verbosity.
///
/// All fields are optional; only set fields override the base config.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Override the model name.
    pub model: Option<String>,
    /// Override sampling temperature (0 to 2).
    pub temperature: Option<f32>,
    /// Override the completion token limit.
    pub max_tokens: Option<u32>,
    /// Override the SQLite database path for checkpoints.
    pub db_path: Option<String>,
    /// Debug-level logs for graph and node execution.
    pub verbose: bool,
}
