//! Command dispatch.

pub mod alias;
pub mod run;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

/// Route a parsed command line to its implementation.
pub fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Alias(args)) => alias::execute(args),
        None => run::execute(&cli.run, cli.silent),
    }
}
