//! The main scaffold action: acquisition to render.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;

use crate::cache::{Cache, EphemeralCache, RepositoryCache};
use crate::cli::args::RunArgs;
use crate::error::{Result, ScaffoldError};
use crate::fsutil::{copy_dir_recursive, directory_is_empty, empty_dir};
use crate::render::Variables;
use crate::repository::load_repository;
use crate::template::{
    BaseProps, Capability, CapabilitySet, DenyAllBroker, PermissionBroker, TemplateProcessor,
    TerminalBroker, TerminalPrompter,
};

/// Run the scaffold pipeline with the provided options.
pub fn execute(args: &RunArgs, silent: bool) -> Result<()> {
    let Some(repo) = args.repo.as_deref() else {
        return Err(ScaffoldError::Other(anyhow::anyhow!(
            "a repository source is required; see `scaffold --help`"
        )));
    };

    let folder = args.folder.clone().unwrap_or_default();
    let destination = absolute(Path::new(&folder))?;
    let spinner = progress(silent, repo);

    // Cache setup. `--no-cache` swaps in a temp-dir-backed cache that never
    // reports a hit and disappears after the run.
    let mut repository_cache = if args.no_cache {
        None
    } else {
        let mut cache = RepositoryCache::new(args.cache_dir.clone())?;
        if args.reset_cache {
            spinner.set_message("Resetting the cache...");
            cache.reset()?;
        }
        spinner.set_message("Loading cache...");
        cache.load()?;
        Some(cache)
    };
    let ephemeral = if args.no_cache {
        Some(EphemeralCache::new()?)
    } else {
        None
    };

    // Alias resolution happens before parsing.
    let mut source_arg = repo.to_string();
    if let Some(cache) = &repository_cache {
        if let Some(target) = cache.store().get_alias(&source_arg) {
            tracing::debug!("alias {} resolves to {}", source_arg, target);
            source_arg = target.clone();
        }
    }

    // Local paths bypass resolution and caching entirely.
    let is_local = ["./", "../", "/"]
        .iter()
        .any(|prefix| source_arg.starts_with(prefix));

    let mut temporary_source: Option<TempDir> = None;
    let mut loaded_key: Option<String> = None;

    let source = if is_local {
        spinner.set_message("Loading local folder...");
        let mut source = absolute(Path::new(&source_arg))?;

        if args.use_temporary_source {
            let staging = tempfile::tempdir()?;
            copy_dir_recursive(&source, staging.path())?;
            source = staging.path().to_path_buf();
            temporary_source = Some(staging);
        }

        source
    } else {
        spinner.set_message("Loading repository...");

        let cache: &dyn Cache = match (&repository_cache, &ephemeral) {
            (Some(cache), _) => cache,
            (None, Some(cache)) => cache,
            (None, None) => unreachable!("one cache variant is always constructed"),
        };

        let loaded = load_repository(&source_arg, cache)?;
        spinner.println(format!(
            "Repository loaded from: {}",
            style(&loaded.resolved.reference.https_url).dim().italic()
        ));
        loaded_key = Some(loaded.key);
        loaded.directory
    };

    // Previously granted capabilities for this snapshot.
    spinner.set_message("Checking for saved permissions...");
    let saved_permissions = match (&repository_cache, &loaded_key) {
        (Some(cache), Some(key)) => CapabilitySet::load(&cache.permissions_path(key)),
        _ => CapabilitySet::default(),
    };

    // The live set starts from the saved grants plus the baseline: read
    // access to the source, destination, and working directory, write
    // access to the destination.
    let mut live = saved_permissions.clone();
    let cwd = env::current_dir()?;
    for path in [&source, &destination, &cwd] {
        live.insert(Capability::Read, path.to_string_lossy().into_owned());
    }
    live.insert(Capability::Write, destination.to_string_lossy().into_owned());

    // Destination hygiene.
    if !args.force && !directory_is_empty(&destination) {
        return Err(ScaffoldError::DestinationNotEmpty { path: destination });
    }
    if args.force {
        spinner.set_message("Removing existing files...");
        empty_dir(&destination)?;
    }

    spinner.set_message("Preparing scaffold...");

    let mut initial_variables = Variables::new();
    initial_variables.insert(
        "name".to_string(),
        args.name.clone().unwrap_or_else(|| default_name(&folder, &destination)),
    );
    initial_variables.insert(
        "description".to_string(),
        args.description.clone().unwrap_or_default(),
    );

    let interactive = !args.no_interactive;
    let mut processor = TemplateProcessor::new(BaseProps {
        name: "scaffold".to_string(),
        source,
        destination: destination.clone(),
        initial_variables,
        permissions: live,
        interactive,
    });

    if !args.no_template {
        processor.load()?;
    }

    // Prompting pauses the spinner so dialoguer owns the terminal.
    spinner.disable_steady_tick();
    processor.gather_variables(&mut TerminalPrompter)?;

    let mut broker: Box<dyn PermissionBroker> = if interactive {
        Box::new(TerminalBroker)
    } else {
        Box::new(DenyAllBroker)
    };
    let granted = processor.resolve_permissions(broker.as_mut())?;
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner.set_message("Rendering files...");
    processor.render()?;

    spinner.set_message("Running install command...");
    processor.install()?;

    // Persist the capability file, the recent fetch, and any aliases only
    // after a successful run, and only when a cache key exists.
    if let (Some(cache), Some(key)) = (&mut repository_cache, &loaded_key) {
        let to_persist = granted.unwrap_or(saved_permissions);
        to_persist.save(&cache.permissions_path(key))?;
        cache.store_mut().set_recent(source_arg.clone(), key.clone());
        cache.store().save()?;
    }

    drop(temporary_source);
    spinner.finish_with_message("Scaffolding completed!");
    Ok(())
}

/// Resolve a possibly-relative path against the working directory without
/// requiring it to exist.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let joined = env::current_dir()?.join(path);
    Ok(normalize_lexically(&joined))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// The default `name` variable: the destination folder's base name.
fn default_name(folder: &str, destination: &Path) -> String {
    if folder.is_empty() {
        destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        Path::new(folder)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn progress(silent: bool, repo: &str) -> ProgressBar {
    let spinner = if silent {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };

    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }

    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!(
        "Scaffolding the project {}",
        style(repo.to_string()).dim().italic()
    ));

    spinner
}
