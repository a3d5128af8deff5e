//! Repository reference resolution and content acquisition.
//!
//! The pipeline is: parse the source string, resolve the requested ref to a
//! commit hash against the remote, derive the cache key, and fetch the
//! snapshot only when the key is not already cached.

pub mod fetch;
pub mod reference;
pub mod refs;

pub use reference::{
    parse_git_url, FetchMode, Provider, RepositoryReference, ResolvedReference,
};
pub use refs::{list_remote_refs, resolve_ref, RemoteRef};

use std::path::PathBuf;

use crate::cache::Cache;
use crate::error::{Result, ScaffoldError};

/// The outcome of loading a repository.
#[derive(Debug)]
pub struct LoadedRepository {
    /// The absolute path to the snapshot in the cache folder.
    pub directory: PathBuf,

    /// The key identifying the snapshot in the cache.
    pub key: String,

    /// The parsed reference together with the resolved commit hash.
    pub resolved: ResolvedReference,

    /// `true` when this specific hash was downloaded for the first time.
    pub is_new: bool,
}

/// Resolve and materialize a repository source string.
///
/// Fails with [`ScaffoldError::Resolution`] when the source cannot be
/// parsed; resolution and fetch failures propagate from the lower layers.
pub fn load_repository(source: &str, cache: &dyn Cache) -> Result<LoadedRepository> {
    let reference = parse_git_url(source).ok_or_else(|| ScaffoldError::Resolution {
        source_string: source.to_string(),
    })?;

    let commit_hash = refs::resolve_ref(&reference)?;
    let resolved = ResolvedReference {
        reference,
        commit_hash,
    };

    let key = cache.key_for(&resolved.commit_hash, &resolved.reference);
    let directory = cache.download_path(&key);
    let is_new = !cache.has_key(&key);

    if is_new {
        tracing::info!(
            "fetching {} at {}",
            resolved.reference.https_url,
            resolved.commit_hash
        );
        fetch::fetch(&resolved, &directory)?;
    } else {
        tracing::debug!("cache hit for {}", key);
    }

    Ok(LoadedRepository {
        directory,
        key,
        resolved,
        is_new,
    })
}
