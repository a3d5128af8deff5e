//! Error types for scaffold operations.
//!
//! This module defines [`ScaffoldError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `ScaffoldError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `ScaffoldError::Other`) for unexpected errors
//! - Lower-level failures are wrapped with context (repository URL, offending
//!   path) exactly once, at the layer that has that context
//! - Only the CLI entry point turns an error into a user-visible message and
//!   a non-zero exit status

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for scaffold operations.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// The source string could not be parsed as a repository reference.
    #[error("could not parse repository source: {source_string}")]
    Resolution { source_string: String },

    /// The requested ref does not exist on the remote repository.
    #[error("the requested reference {reference} does not exist on the requested repository: {url}")]
    RefNotFound { reference: String, url: String },

    /// A short hash matched more than one commit.
    #[error("an ambiguous reference was provided: {reference}, which matches multiple commits: {}", .matches.join(", "))]
    AmbiguousRef {
        reference: String,
        matches: Vec<String>,
    },

    /// Listing or fetching from the remote failed.
    #[error("could not fetch from the remote url: {url}")]
    RemoteTransport {
        url: String,
        #[source]
        cause: anyhow::Error,
    },

    /// Downloading or extracting repository content failed.
    #[error("could not download {url}: {message}")]
    FetchFailed { url: String, message: String },

    /// No usable cache root could be determined.
    #[error("could not determine the home directory for this operating system")]
    CacheUnavailable,

    /// Reading a directory during traversal failed.
    #[error("failed to read directory {root}")]
    Traversal {
        root: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    /// The destination folder already contains files.
    #[error("the destination folder is not empty: {path}. Use --force to overwrite files")]
    DestinationNotEmpty { path: PathBuf },

    /// Failed to parse a template configuration file.
    #[error("failed to parse template config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A capability needed for the run was not granted.
    #[error("the {capability} capability for '{value}' was not granted")]
    PermissionDenied { capability: String, value: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ScaffoldError {
    fn from(error: serde_json::Error) -> Self {
        ScaffoldError::Other(error.into())
    }
}

/// Result type alias for scaffold operations.
pub type Result<T> = std::result::Result<T, ScaffoldError>;
