//! The `alias` subcommand: persist a short name for a template repository.

use console::style;

use crate::cache::RepositoryCache;
use crate::cli::args::AliasArgs;
use crate::error::Result;

pub fn execute(args: &AliasArgs) -> Result<()> {
    let mut cache = RepositoryCache::new(args.cache_dir.clone())?;
    cache.load()?;

    cache.store_mut().set_alias(&args.alias, &args.repo);
    cache.store().save()?;

    println!(
        "Alias {} now points to {}",
        style(&args.alias).cyan(),
        style(&args.repo).dim().italic()
    );

    Ok(())
}
