//! Scaffold CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use scaffold::cli::{dispatch, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--silent` disables logging entirely
/// 2. `--debug` sets the level to DEBUG
/// 3. `RUST_LOG` environment variable (if set)
/// 4. Default is ERROR
fn init_tracing(debug: bool, silent: bool) {
    let filter = if silent {
        EnvFilter::new("off")
    } else if debug {
        EnvFilter::new("scaffold=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scaffold=error"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.silent);

    tracing::debug!("scaffold starting with args: {:?}", cli);

    match dispatch(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", style("error:").red().bold(), error);
            ExitCode::from(1)
        }
    }
}
