//! Materializing a resolved repository into a directory.
//!
//! Two strategies exist. Providers with a tarball endpoint (github, gitlab,
//! bitbucket) stream-download a gzipped archive and extract the entries that
//! survive the path-traversal guard. The rest (sourcehut) are cloned with
//! the external `git` binary, checked out at the resolved hash, and stripped
//! of version-control metadata.
//!
//! Both strategies assume the caller has already consulted the cache: fetch
//! only runs on a cache miss, into a destination derived from the cache key.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::{Result, ScaffoldError};
use crate::fsutil::move_dir;
use crate::repository::reference::{FetchMode, Provider, ResolvedReference};

/// Download timeout for tarball fetches.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Materialize a resolved reference into `destination`.
pub fn fetch(resolved: &ResolvedReference, destination: &Path) -> Result<()> {
    match resolved.reference.fetch_mode {
        FetchMode::Archive => fetch_archive(resolved, destination),
        FetchMode::Clone => fetch_clone(resolved, destination),
    }
}

/// The provider-specific tarball URL for a resolved reference.
pub fn archive_url(resolved: &ResolvedReference) -> String {
    let url = &resolved.reference.https_url;
    let hash = &resolved.commit_hash;

    match resolved.reference.provider {
        Provider::Gitlab => format!("{url}/repository/archive.tar.gz?ref={hash}"),
        Provider::Bitbucket => format!("{url}/get/{hash}.tar.gz"),
        _ => format!("{url}/archive/{hash}.tar.gz"),
    }
}

/// The leading path component(s) every extractable entry must live under:
/// `{name}-{hash}` plus the requested subdirectory, if any.
pub fn archive_prefix(resolved: &ResolvedReference) -> String {
    format!(
        "{}-{}{}",
        resolved.reference.name,
        resolved.commit_hash,
        resolved.reference.subdirectory.as_deref().unwrap_or("")
    )
}

fn fetch_archive(resolved: &ResolvedReference, destination: &Path) -> Result<()> {
    let url = archive_url(resolved);
    let prefix = archive_prefix(resolved);
    download_archive(&url, &prefix, destination)
}

/// Download a gzipped tarball from `url` and extract the entries under
/// `prefix` into `destination`.
pub fn download_archive(url: &str, prefix: &str, destination: &Path) -> Result<()> {
    tracing::debug!("downloading {}", url);

    let client = reqwest::blocking::Client::builder()
        .user_agent("scaffold")
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|error| fetch_failed(url, error))?;

    let response = client.get(url).send().map_err(|error| fetch_failed(url, error))?;

    if !response.status().is_success() {
        return Err(ScaffoldError::FetchFailed {
            url: url.to_string(),
            message: format!("HTTP {}", response.status()),
        });
    }

    extract_tarball(GzDecoder::new(response), prefix, destination)
        .map_err(|error| fetch_failed(url, error))
}

fn fetch_failed(url: &str, error: impl std::fmt::Display) -> ScaffoldError {
    ScaffoldError::FetchFailed {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Extract the tar entries under `prefix` into `destination`.
///
/// An entry is accepted only when its lexically normalized path — with the
/// prefix stripped — does not escape the destination; everything else is
/// silently skipped. This is the path-traversal guard.
pub fn extract_tarball<R: Read>(
    reader: R,
    prefix: &str,
    destination: &Path,
) -> std::result::Result<(), std::io::Error> {
    let mut archive = Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let Some(relative) = strip_archive_prefix(&path, prefix) else {
            tracing::debug!("skipping tar entry outside prefix: {}", path.display());
            continue;
        };

        let target = destination.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target)?;
            }
            EntryType::Regular => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = File::create(&target)?;
                io::copy(&mut entry, &mut file)?;
            }
            // Links, fifos, and metadata entries are not materialized.
            _ => continue,
        }
    }

    Ok(())
}

/// Lexically normalize an entry path and strip the archive prefix.
///
/// Returns `None` when the entry is absolute, escapes upward, or does not
/// live under the prefix.
fn strip_archive_prefix(path: &Path, prefix: &str) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                // A parent component beyond the top is an escape.
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    normalized
        .strip_prefix(prefix)
        .map(Path::to_path_buf)
        .ok()
}

fn fetch_clone(resolved: &ResolvedReference, destination: &Path) -> Result<()> {
    let reference = &resolved.reference;
    let ssh_url = &reference.ssh_url;

    // With a subdirectory request the clone is staged in a temporary
    // directory and only the subdirectory's contents move into place.
    let staging = match reference.subdirectory {
        Some(_) => Some(tempfile::tempdir()?),
        None => None,
    };
    let clone_root = staging
        .as_ref()
        .map(|dir| dir.path().to_path_buf())
        .unwrap_or_else(|| destination.to_path_buf());

    if let Some(parent) = clone_root.parent() {
        fs::create_dir_all(parent)?;
    }

    run_git(
        ssh_url,
        Command::new("git")
            .args(["clone", ssh_url.as_str()])
            .arg(&clone_root),
    )?;
    run_git(
        ssh_url,
        Command::new("git")
            .args(["checkout", resolved.commit_hash.as_str()])
            .current_dir(&clone_root),
    )?;

    let git_dir = clone_root.join(".git");
    if git_dir.exists() {
        fs::remove_dir_all(&git_dir)?;
    }

    if let Some(subdirectory) = &reference.subdirectory {
        let source = clone_root.join(subdirectory.trim_start_matches('/'));
        move_dir(&source, destination)?;
    }

    Ok(())
}

fn run_git(url: &str, command: &mut Command) -> Result<()> {
    let output = command.output().map_err(|error| ScaffoldError::FetchFailed {
        url: url.to_string(),
        message: error.to_string(),
    })?;

    if !output.status.success() {
        return Err(ScaffoldError::FetchFailed {
            url: url.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}
