//! Graphs run by the CLI subcommands.

pub mod chat;
pub mod code_assist;
pub mod support;

pub use code_assist::CodeAssistState;
