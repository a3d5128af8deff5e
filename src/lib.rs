//! Scaffold - project scaffolding from git repository templates.
//!
//! Scaffold resolves a repository shorthand (GitHub, GitLab, BitBucket or
//! sourcehut), caches an immutable snapshot of the resolved commit, and
//! renders it into a destination directory while mediating which
//! capabilities the user-authored template configuration may exercise.
//!
//! # Modules
//!
//! - [`cache`] - content-addressed repository cache and persisted store
//! - [`cli`] - command-line interface and argument parsing
//! - [`error`] - error types and result aliases
//! - [`fsutil`] - small filesystem helpers
//! - [`matcher`] - include/exclude pattern matching
//! - [`render`] - variable substitution for contents and filenames
//! - [`repository`] - reference parsing, ref resolution, content fetch
//! - [`template`] - capability-scoped template processing
//! - [`walker`] - lazy pre-order directory traversal
//!
//! # Example
//!
//! ```
//! use scaffold::repository::parse_git_url;
//!
//! let reference = parse_git_url("ifiokjr/templates/deno#main").unwrap();
//! assert_eq!(reference.owner, "ifiokjr");
//! assert_eq!(reference.subdirectory.as_deref(), Some("/deno"));
//! assert_eq!(reference.git_ref, "main");
//! ```

pub mod cache;
pub mod cli;
pub mod error;
pub mod fsutil;
pub mod matcher;
pub mod render;
pub mod repository;
pub mod template;
pub mod walker;

pub use error::{Result, ScaffoldError};
