//! Configuration for the CLI runs.
//!
//! Re-exports [`RunConfig`], [`RunOptions`] and the CLI [`Error`] alias.

mod run_config;
mod run_options;

pub use run_config::{Error, RunConfig};
pub use run_options::RunOptions;
