//! Lazy directory traversal with include/exclude filtering.
//!
//! [`Walker`] enumerates a directory tree depth-first in pre-order: a
//! directory's own entry is yielded before any of its children. Directories
//! can be pruned wholesale by the exclude matcher; files are filtered one by
//! one at the leaves. Traversal is driven by an explicit worklist rather
//! than recursion, so the iterator stays lazy and cheap to drop early.
//!
//! Symlinks are followed by default: the entry is substituted with the link
//! target's real path and file type, while the relative path keeps the
//! link's own position in the tree. With following disabled, symlinked
//! entries are skipped entirely.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScaffoldError};
use crate::matcher::{MatchSpec, Matcher, MatcherOptions};

/// A single entry produced by the walker. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The absolute path on the file system (the real path for symlinks).
    pub absolute: PathBuf,
    /// The slash-separated path relative to the walk root.
    pub relative: String,
    /// The base name of the entry.
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// Configuration for a directory walk.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    include: Matcher,
    exclude: Matcher,
    max_depth: usize,
    follow_symlinks: bool,
    include_files: bool,
    include_directories: bool,
}

/// Builder for [`Walker`].
pub struct WalkerBuilder {
    root: PathBuf,
    include: Vec<MatchSpec>,
    exclude: Vec<MatchSpec>,
    options: MatcherOptions,
    max_depth: usize,
    follow_symlinks: bool,
    include_files: bool,
    include_directories: bool,
}

impl WalkerBuilder {
    /// Start building a walk rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: vec![MatchSpec::from("**")],
            exclude: Vec::new(),
            options: MatcherOptions {
                expand_globs: true,
                ..Default::default()
            },
            max_depth: usize::MAX,
            follow_symlinks: true,
            include_files: true,
            include_directories: true,
        }
    }

    /// Replace the include specs (default: `**`).
    pub fn include(mut self, specs: Vec<MatchSpec>) -> Self {
        self.include = specs;
        self
    }

    /// Replace the exclude specs (default: none).
    pub fn exclude(mut self, specs: Vec<MatchSpec>) -> Self {
        self.exclude = specs;
        self
    }

    /// Set the matcher options shared by the include and exclude matchers.
    pub fn matcher_options(mut self, options: MatcherOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable matching of dot files and folders.
    pub fn dot(mut self, dot: bool) -> Self {
        self.options.dot = dot;
        self
    }

    /// Limit how deep the walk descends. `0` visits only the root.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Control whether symlinks are resolved (default) or skipped.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Control whether file entries are yielded.
    pub fn include_files(mut self, include: bool) -> Self {
        self.include_files = include;
        self
    }

    /// Control whether directory entries are yielded.
    pub fn include_directories(mut self, include: bool) -> Self {
        self.include_directories = include;
        self
    }

    /// Compile the matchers and finish the walker.
    pub fn build(self) -> Result<Walker> {
        let include = Matcher::compile(self.include, self.options.clone())?;
        let exclude = Matcher::compile(self.exclude, self.options)?;

        Ok(Walker {
            root: self.root,
            include,
            exclude,
            max_depth: self.max_depth,
            follow_symlinks: self.follow_symlinks,
            include_files: self.include_files,
            include_directories: self.include_directories,
        })
    }
}

enum Work {
    /// Visit a directory: yield its entry, then expand its children.
    Dir {
        path: PathBuf,
        relative: String,
        was_symlink: bool,
        depth: usize,
    },
    /// A file candidate awaiting the include/exclude decision.
    File {
        path: PathBuf,
        relative: String,
        was_symlink: bool,
    },
}

/// The lazy iteration state for one traversal. Each call to
/// [`Walker::iter`] starts a fresh traversal from the root.
pub struct Walk<'a> {
    walker: &'a Walker,
    stack: Vec<Work>,
}

impl Walker {
    /// Start a traversal. The returned iterator yields entries lazily.
    pub fn iter(&self) -> Walk<'_> {
        Walk {
            walker: self,
            stack: vec![Work::Dir {
                path: self.root.clone(),
                relative: String::new(),
                was_symlink: false,
                depth: self.max_depth,
            }],
        }
    }

    /// The root this walker traverses.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn should_include(&self, relative: &str) -> bool {
        if self.exclude.is_match(relative) {
            return false;
        }

        // The root itself has an empty relative path and is always
        // considered included; pattern matchers cannot address it.
        relative.is_empty() || self.include.is_match(relative)
    }
}

impl<'a> Walk<'a> {
    fn expand_directory(&mut self, path: &Path, relative: &str, depth: usize) -> Result<()> {
        let read = fs::read_dir(path).map_err(|cause| ScaffoldError::Traversal {
            root: path.to_path_buf(),
            cause,
        })?;

        let mut children = Vec::new();

        for entry in read {
            let entry = entry.map_err(|cause| ScaffoldError::Traversal {
                root: path.to_path_buf(),
                cause,
            })?;

            let name = entry.file_name().to_string_lossy().into_owned();
            let child_relative = if relative.is_empty() {
                name.clone()
            } else {
                format!("{relative}/{name}")
            };

            let file_type = entry.file_type().map_err(|cause| ScaffoldError::Traversal {
                root: path.to_path_buf(),
                cause,
            })?;

            let mut child_path = entry.path();
            let mut is_directory = file_type.is_dir();
            let was_symlink = file_type.is_symlink();

            if was_symlink {
                if !self.walker.follow_symlinks {
                    continue;
                }

                // Substitute the link target's real path and stat.
                child_path =
                    fs::canonicalize(&child_path).map_err(|cause| ScaffoldError::Traversal {
                        root: path.to_path_buf(),
                        cause,
                    })?;
                is_directory = child_path.is_dir();
            }

            if is_directory {
                children.push(Work::Dir {
                    path: child_path,
                    relative: child_relative,
                    was_symlink,
                    depth: depth - 1,
                });
            } else {
                children.push(Work::File {
                    path: child_path,
                    relative: child_relative,
                    was_symlink,
                });
            }
        }

        // Sort for deterministic output, then push in reverse so the stack
        // pops children in name order.
        children.sort_by(|a, b| work_relative(b).cmp(work_relative(a)));
        self.stack.extend(children);

        Ok(())
    }
}

fn work_relative(work: &Work) -> &str {
    match work {
        Work::Dir { relative, .. } | Work::File { relative, .. } => relative,
    }
}

fn base_name(relative: &str, path: &Path) -> String {
    if relative.is_empty() {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        relative.rsplit('/').next().unwrap_or(relative).to_string()
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let work = self.stack.pop()?;

            match work {
                Work::Dir {
                    path,
                    relative,
                    was_symlink,
                    depth,
                } => {
                    // Descend unless depth is exhausted or the directory is
                    // pruned by the exclude matcher.
                    if depth >= 1 && !self.walker.exclude.is_match(&relative) {
                        if let Err(error) = self.expand_directory(&path, &relative, depth) {
                            return Some(Err(error));
                        }
                    }

                    if self.walker.include_directories && self.walker.should_include(&relative) {
                        let name = base_name(&relative, &path);
                        return Some(Ok(FileEntry {
                            absolute: path,
                            relative,
                            name,
                            is_file: false,
                            is_directory: true,
                            is_symlink: was_symlink,
                        }));
                    }
                }
                Work::File {
                    path,
                    relative,
                    was_symlink,
                } => {
                    if self.walker.include_files && self.walker.should_include(&relative) {
                        let name = base_name(&relative, &path);
                        return Some(Ok(FileEntry {
                            absolute: path,
                            relative,
                            name,
                            is_file: true,
                            is_directory: false,
                            is_symlink: was_symlink,
                        }));
                    }
                }
            }
        }
    }
}
