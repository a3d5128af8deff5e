//! Content-addressed repository cache.
//!
//! The cache root holds one subdirectory per [`CacheKey`](cache_key) (the
//! fetched snapshot), one sibling `{key}.json` file per key that has
//! completed a run (the persisted capability set), and a `store.json`
//! document (aliases and recent fetches).
//!
//! [`RepositoryCache`] is the persistent implementation; [`EphemeralCache`]
//! backs `--no-cache` runs with a temporary directory that never reports a
//! hit and disappears when dropped.

pub mod store;

pub use store::Store;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScaffoldError};
use crate::repository::RepositoryReference;

/// Access to a download cache keyed by repository identity.
pub trait Cache {
    /// Create the unique key for a resolved repository.
    fn key_for(&self, hash: &str, reference: &RepositoryReference) -> String;

    /// Check whether the cache already has an entry for the given key.
    fn has_key(&self, key: &str) -> bool;

    /// Get the path content for this key is (or would be) downloaded to.
    /// Pure in `(root, key)`; the key does not need to exist yet.
    fn download_path(&self, key: &str) -> PathBuf;
}

/// Derive the deterministic, filesystem-safe cache key for a resolved
/// repository: the cleaned `(owner, name, site, subdirectory, hash)`
/// components joined with dashes, empty components omitted.
pub fn cache_key(hash: &str, reference: &RepositoryReference) -> String {
    let subdirectory = reference.subdirectory.as_deref().unwrap_or("");
    let parts = [
        reference.owner.as_str(),
        reference.name.as_str(),
        reference.provider.site(),
        subdirectory,
        hash,
    ];

    let mut key = String::new();

    for part in parts {
        let cleaned = clean(part);
        if cleaned.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push('-');
        }
        key.push_str(&cleaned);
    }

    key
}

/// Path separators become `--`, anything outside `[A-Za-z0-9_-]` is
/// stripped.
fn clean(value: &str) -> String {
    value
        .replace('/', "--")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// The default cache root, `$HOME/.scaffold/cache`.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".scaffold").join("cache"))
}

/// The persistent repository cache. Owns the [`Store`].
#[derive(Debug)]
pub struct RepositoryCache {
    directory: PathBuf,
    entries: HashMap<String, PathBuf>,
    store: Store,
}

impl RepositoryCache {
    /// Create a cache rooted at `directory`, falling back to the default
    /// cache root. Fails with [`ScaffoldError::CacheUnavailable`] when no
    /// root can be determined.
    pub fn new(directory: Option<PathBuf>) -> Result<Self> {
        let directory = match directory {
            Some(directory) => directory,
            None => default_cache_dir().ok_or(ScaffoldError::CacheUnavailable)?,
        };

        let store = Store::new(directory.join("store.json"));

        Ok(Self {
            directory,
            entries: HashMap::new(),
            store,
        })
    }

    /// The cache root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The store for aliases and recent fetches.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access to the store.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Load all cached repository directories and the store. Call this
    /// before anything else; the scan covers the root's immediate
    /// subdirectories only.
    pub fn load(&mut self) -> Result<()> {
        tracing::debug!("loading cache from {}", self.directory.display());
        fs::create_dir_all(&self.directory)?;

        self.entries.clear();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            self.entries.insert(name, entry.path());
        }

        self.store.load()?;

        tracing::debug!("cache holds {} entries", self.entries.len());
        Ok(())
    }

    /// Delete the whole cache and reset the store to its defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.entries.clear();
        if self.directory.exists() {
            fs::remove_dir_all(&self.directory)?;
        }
        self.store.reset()?;
        Ok(())
    }

    /// The path to the persisted capability set for a key.
    pub fn permissions_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }

    /// Get the cached directory for a key, if present.
    pub fn get(&self, key: &str) -> Option<&PathBuf> {
        self.entries.get(key)
    }
}

impl Cache for RepositoryCache {
    fn key_for(&self, hash: &str, reference: &RepositoryReference) -> String {
        cache_key(hash, reference)
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn download_path(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }
}

/// A cache for `--no-cache` runs: keys are derived the same way, but
/// nothing is ever reported as cached and downloads land in a temporary
/// directory that is removed on drop.
#[derive(Debug)]
pub struct EphemeralCache {
    root: tempfile::TempDir,
}

impl EphemeralCache {
    pub fn new() -> Result<Self> {
        Ok(Self {
            root: tempfile::tempdir()?,
        })
    }
}

impl Cache for EphemeralCache {
    fn key_for(&self, hash: &str, reference: &RepositoryReference) -> String {
        cache_key(hash, reference)
    }

    fn has_key(&self, _key: &str) -> bool {
        false
    }

    fn download_path(&self, key: &str) -> PathBuf {
        self.root.path().join(key)
    }
}
