//! Unit tests for the CLI library: config, node logging, and the workflow runs
//! driven by `MockLlm`.
