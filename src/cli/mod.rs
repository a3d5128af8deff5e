//! Command-line interface and argument parsing.

pub mod args;
pub mod commands;

pub use args::{AliasArgs, Cli, Commands, RunArgs};
pub use commands::dispatch;
