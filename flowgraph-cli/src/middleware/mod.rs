//! Node middleware wiring for the CLI graphs.
//!
//! Re-exports [`WithNodeLogging`].

mod with_node_logging;

pub use with_node_logging::WithNodeLogging;
