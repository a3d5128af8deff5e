//! Command-line argument definitions.
//!
//! The core pipeline never touches `argv`; it receives [`RunArgs`] as a
//! plain options structure.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scaffold a new project from any GitHub, GitLab, BitBucket or sourcehut
/// git repository.
#[derive(Debug, Parser)]
#[command(
    name = "scaffold",
    version,
    about = "Scaffold a new project from any GitHub, GitLab, BitBucket or sourcehut git repository",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Disable all logging.
    #[arg(short, long, global = true)]
    pub silent: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an alias for a template repository.
    Alias(AliasArgs),
}

/// Options for the main scaffold action.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// The repository to scaffold from: `owner/name[/subdir][#ref]`, a
    /// full URL, or a local path starting with `./`, `../` or `/`.
    pub repo: Option<String>,

    /// The destination folder.
    pub folder: Option<String>,

    /// Set a custom cache directory.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Disable the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Reset the cache.
    #[arg(long)]
    pub reset_cache: bool,

    /// Overwrite files even if they already exist.
    #[arg(short, long)]
    pub force: bool,

    /// Disable loading the scaffold.config file.
    #[arg(long)]
    pub no_template: bool,

    /// Set the name to be used in the template.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Set the description to be used in the template.
    #[arg(long)]
    pub description: Option<String>,

    /// Disable the interactive prompt. Might break permission requests.
    #[arg(short = 'y', long)]
    pub no_interactive: bool,

    /// Copy local template files to a temporary directory before rendering.
    #[arg(long)]
    pub use_temporary_source: bool,
}

#[derive(Debug, Args)]
pub struct AliasArgs {
    /// The alias name.
    pub alias: String,

    /// The repository source the alias points to.
    pub repo: String,

    /// Set a custom cache directory.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}
