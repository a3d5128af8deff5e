//! Integration tests for content acquisition: tarball extraction over HTTP
//! and clone-mode fetches against local bare repositories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use flate2::write::GzEncoder;
use flate2::Compression;
use httpmock::prelude::*;
use tempfile::TempDir;

use scaffold::cache::{Cache, RepositoryCache};
use scaffold::repository::fetch::{download_archive, fetch};
use scaffold::repository::{
    list_remote_refs, parse_git_url, resolve_ref, FetchMode, Provider, RemoteRef,
    RepositoryReference, ResolvedReference,
};

// Serialize git-process tests to avoid flaky failures under parallel
// execution.
static GIT_LOCK: Mutex<()> = Mutex::new(());

fn gzipped_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *contents).unwrap();
    }

    let tarball = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    std::io::Write::write_all(&mut encoder, &tarball).unwrap();
    encoder.finish().unwrap()
}

/// A tarball with one entry whose raw header path escapes upward.
fn gzipped_tarball_with_escape() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    let mut add = |path: &str, contents: &[u8]| {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, contents).unwrap();
    };
    add("repo-abc123/keep.txt", b"keep");

    // `tar::Builder` refuses `..`, so write the header bytes directly.
    let evil = b"repo-abc123/../../evil.txt";
    let mut header = tar::Header::new_gnu();
    {
        let gnu = header.as_gnu_mut().unwrap();
        gnu.name[..evil.len()].copy_from_slice(evil);
    }
    header.set_size(7);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, &b"escaped"[..]).unwrap();

    let tarball = builder.into_inner().unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    std::io::Write::write_all(&mut encoder, &tarball).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn downloads_and_extracts_a_tarball() {
    let server = MockServer::start();
    let body = gzipped_tarball(&[
        ("repo-abc123/README.md", b"hello"),
        ("repo-abc123/src/lib.rs", b"pub fn x() {}"),
    ]);

    server.mock(|when, then| {
        when.method(GET).path("/archive.tar.gz");
        then.status(200).body(&body);
    });

    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("out");

    download_archive(
        &server.url("/archive.tar.gz"),
        "repo-abc123",
        &destination,
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("README.md")).unwrap(),
        "hello"
    );
    assert_eq!(
        fs::read_to_string(destination.join("src/lib.rs")).unwrap(),
        "pub fn x() {}"
    );
}

#[test]
fn subdirectory_prefix_limits_extraction() {
    let server = MockServer::start();
    let body = gzipped_tarball(&[
        ("repo-abc123/docs/guide.md", b"docs"),
        ("repo-abc123/src/lib.rs", b"code"),
    ]);

    server.mock(|when, then| {
        when.method(GET).path("/archive.tar.gz");
        then.status(200).body(&body);
    });

    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("out");

    download_archive(
        &server.url("/archive.tar.gz"),
        "repo-abc123/docs",
        &destination,
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("guide.md")).unwrap(),
        "docs"
    );
    assert!(!destination.join("lib.rs").exists());
    assert!(!destination.join("src").exists());
}

#[test]
fn malicious_tar_entry_is_never_written() {
    let server = MockServer::start();
    let body = gzipped_tarball_with_escape();

    server.mock(|when, then| {
        when.method(GET).path("/archive.tar.gz");
        then.status(200).body(&body);
    });

    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("nested").join("out");

    download_archive(
        &server.url("/archive.tar.gz"),
        "repo-abc123",
        &destination,
    )
    .unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("keep.txt")).unwrap(),
        "keep"
    );
    assert!(!destination.join("evil.txt").exists());
    assert!(!temp.path().join("evil.txt").exists());
    assert!(!temp.path().join("nested/evil.txt").exists());
}

#[test]
fn http_error_is_a_fetch_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing.tar.gz");
        then.status(404);
    });

    let temp = TempDir::new().unwrap();
    let result = download_archive(
        &server.url("/missing.tar.gz"),
        "repo-abc123",
        &temp.path().join("out"),
    );

    match result {
        Err(scaffold::ScaffoldError::FetchFailed { message, .. }) => {
            assert!(message.contains("404"));
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

// --- Local bare repo git tests ---

/// Create a bare git repo with an initial commit containing a small tree.
/// Returns the bare repo path and the commit hash.
fn create_bare_repo(parent: &Path) -> (PathBuf, String) {
    let bare_path = parent.join("test-repo.git");
    let work_dir = parent.join("work");
    fs::create_dir_all(&work_dir).unwrap();

    let run = |args: &[&str], cwd: &Path| {
        let output = Command::new("git").args(args).current_dir(cwd).output().unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    };

    run(
        &[
            "init",
            "--bare",
            "--initial-branch=main",
            bare_path.to_str().unwrap(),
        ],
        parent,
    );
    run(
        &["clone", bare_path.to_str().unwrap(), work_dir.to_str().unwrap()],
        parent,
    );
    run(&["config", "user.name", "Test"], &work_dir);
    run(&["config", "user.email", "test@test.com"], &work_dir);

    fs::create_dir_all(work_dir.join("docs")).unwrap();
    fs::write(work_dir.join("README.md"), "# fixture\n").unwrap();
    fs::write(work_dir.join("docs/guide.md"), "guide\n").unwrap();

    run(&["add", "."], &work_dir);
    run(&["commit", "-m", "Initial commit"], &work_dir);
    run(&["tag", "v1.0.0"], &work_dir);
    run(&["push", "origin", "HEAD:main"], &work_dir);
    run(&["push", "origin", "v1.0.0"], &work_dir);

    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(&work_dir)
        .output()
        .unwrap();
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();

    (bare_path, hash)
}

/// A sourcehut-shaped reference whose URLs point at a local bare repo.
fn local_clone_reference(bare_path: &Path, subdirectory: Option<&str>) -> RepositoryReference {
    let mut reference = parse_git_url("git.sr.ht/~tester/test-repo").unwrap();
    reference.https_url = bare_path.to_string_lossy().into_owned();
    reference.ssh_url = bare_path.to_string_lossy().into_owned();
    reference.subdirectory = subdirectory.map(String::from);
    reference
}

#[test]
fn lists_and_classifies_remote_refs() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let (bare_path, hash) = create_bare_repo(temp.path());

    let refs = list_remote_refs(&bare_path.to_string_lossy()).unwrap();

    assert!(refs.contains(&RemoteRef::Head { hash: hash.clone() }));
    assert!(refs.contains(&RemoteRef::Named {
        kind: "branch".to_string(),
        name: "main".to_string(),
        hash: hash.clone(),
    }));
    assert!(refs.iter().any(|r| matches!(
        r,
        RemoteRef::Named { kind, name, .. } if kind == "tag" && name == "v1.0.0"
    )));
}

#[test]
fn resolves_head_branch_and_tag_against_a_real_remote() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let (bare_path, hash) = create_bare_repo(temp.path());

    for requested in ["HEAD", "main", "v1.0.0"] {
        let mut reference = local_clone_reference(&bare_path, None);
        reference.git_ref = requested.to_string();

        assert_eq!(resolve_ref(&reference).unwrap(), hash, "{requested}");
    }
}

#[test]
fn clone_mode_checks_out_and_prunes_metadata() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let (bare_path, hash) = create_bare_repo(temp.path());

    let resolved = ResolvedReference {
        reference: local_clone_reference(&bare_path, None),
        commit_hash: hash,
    };
    assert_eq!(resolved.reference.fetch_mode, FetchMode::Clone);

    let destination = temp.path().join("cloned");
    fetch(&resolved, &destination).unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("README.md")).unwrap(),
        "# fixture\n"
    );
    assert!(!destination.join(".git").exists());
}

#[test]
fn clone_mode_extracts_a_requested_subdirectory() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let (bare_path, hash) = create_bare_repo(temp.path());

    let resolved = ResolvedReference {
        reference: local_clone_reference(&bare_path, Some("/docs")),
        commit_hash: hash,
    };

    let destination = temp.path().join("docs-only");
    fetch(&resolved, &destination).unwrap();

    assert_eq!(
        fs::read_to_string(destination.join("guide.md")).unwrap(),
        "guide\n"
    );
    assert!(!destination.join("README.md").exists());
}

#[test]
fn cache_round_trip_skips_the_second_fetch() {
    let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let temp = TempDir::new().unwrap();
    let (bare_path, hash) = create_bare_repo(temp.path());

    let cache_root = temp.path().join("cache");
    let mut cache = RepositoryCache::new(Some(cache_root)).unwrap();
    cache.load().unwrap();

    let resolved = ResolvedReference {
        reference: local_clone_reference(&bare_path, None),
        commit_hash: hash.clone(),
    };

    let key = cache.key_for(&hash, &resolved.reference);
    let destination = cache.download_path(&key);
    assert!(!cache.has_key(&key));

    fetch(&resolved, &destination).unwrap();

    // A fresh scan sees the fetched snapshot; the same inputs produce the
    // same key and the same destination, so no second fetch is needed.
    cache.load().unwrap();
    assert!(cache.has_key(&key));
    assert_eq!(cache.download_path(&key), destination);
    assert_eq!(cache.key_for(&hash, &resolved.reference), key);
}

#[test]
fn provider_archive_urls_are_stable() {
    let resolved = ResolvedReference {
        reference: parse_git_url("owner/name").unwrap(),
        commit_hash: "abc123".to_string(),
    };
    assert_eq!(resolved.reference.provider, Provider::Github);
    assert_eq!(
        scaffold::repository::fetch::archive_url(&resolved),
        "https://github.com/owner/name/archive/abc123.tar.gz"
    );
}
