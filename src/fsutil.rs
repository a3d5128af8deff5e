//! Small filesystem helpers shared across the pipeline.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Check whether a directory is empty, treating a missing directory as
/// empty.
pub fn directory_is_empty(directory: &Path) -> bool {
    match fs::read_dir(directory) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// Ensure the directory exists and remove everything inside it.
pub fn empty_dir(directory: &Path) -> Result<()> {
    fs::create_dir_all(directory)?;

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}

/// Recursively copy a directory tree.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Move a directory, falling back to copy-and-remove when a plain rename
/// crosses filesystems.
pub fn move_dir(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }

    copy_dir_recursive(source, destination)?;
    fs::remove_dir_all(source)?;
    Ok(())
}
