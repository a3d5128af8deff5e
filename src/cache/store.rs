//! The persisted alias and recency store.
//!
//! One `store.json` document lives in the cache root:
//!
//! ```json
//! { "version": 1, "aliases": {}, "recent": {} }
//! ```
//!
//! Loading is lazy (callers decide when), saving is always explicit; no
//! mutation triggers an automatic write. A persisted version below
//! [`Store::VERSION`] is replaced wholesale by the default document — there
//! is no field-level upgrade path, so a schema bump discards old data.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    /// The migration version.
    pub version: u32,

    /// Alias names mapped to the source strings they stand for.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Source strings mapped to the most recently fetched cache key.
    #[serde(default)]
    pub recent: BTreeMap<String, String>,
}

impl StoreData {
    fn default_document() -> Self {
        Self {
            version: Store::VERSION,
            aliases: BTreeMap::new(),
            recent: BTreeMap::new(),
        }
    }
}

/// Store for aliases and recent fetches, persisted next to the cache.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Current schema version.
    pub const VERSION: u32 = 1;

    /// Create a store backed by the given file. No IO happens until
    /// [`Store::load`] or [`Store::save`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: StoreData::default_document(),
        }
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current in-memory document.
    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Load the document from disk.
    ///
    /// A missing or unreadable file yields the default document (and creates
    /// the file); a document with an older version is replaced by the
    /// default document.
    pub fn load(&mut self) -> crate::error::Result<()> {
        let data = match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<StoreData>(&content) {
                Ok(data) => data,
                Err(error) => {
                    tracing::warn!("store file is corrupt, using defaults: {}", error);
                    StoreData::default_document()
                }
            },
            Err(_) => {
                let data = StoreData::default_document();
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, serde_json::to_string(&data)?.as_bytes())?;
                data
            }
        };

        self.data = if data.version < Self::VERSION {
            tracing::warn!(
                "store schema version {} is older than {}, discarding stored data",
                data.version,
                Self::VERSION
            );
            StoreData::default_document()
        } else {
            data
        };

        Ok(())
    }

    /// Look up an alias.
    pub fn get_alias(&self, name: &str) -> Option<&String> {
        self.data.aliases.get(name)
    }

    /// Register an alias for a repository source.
    pub fn set_alias(&mut self, alias: impl Into<String>, repo: impl Into<String>) -> &mut Self {
        self.data.aliases.insert(alias.into(), repo.into());
        self
    }

    /// Look up the most recent cache key for a source.
    pub fn get_recent(&self, repo: &str) -> Option<&String> {
        self.data.recent.get(repo)
    }

    /// Record the most recent cache key for a source.
    pub fn set_recent(&mut self, repo: impl Into<String>, key: impl Into<String>) -> &mut Self {
        self.data.recent.insert(repo.into(), key.into());
        self
    }

    /// Write the document to disk.
    pub fn save(&self) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(&self.data)?.as_bytes())?;
        Ok(())
    }

    /// Reset to the default document and remove the persisted file.
    pub fn reset(&mut self) -> crate::error::Result<()> {
        self.data = StoreData::default_document();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
