//! Remote reference listing and resolution.
//!
//! Listing shells out to `git ls-remote` (protocol work stays in the
//! external `git` binary) and parses one `(hash, ref path)` pair per
//! line. Resolution walks the candidates looking for an exact match first
//! (HEAD pointer, ref name, full hash) and only then falls back to
//! short-hash matching, where more than one distinct matching commit is an
//! ambiguity error.

use std::process::Command;

use crate::error::{Result, ScaffoldError};
use crate::repository::reference::RepositoryReference;

/// One reference advertised by the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRef {
    /// The repository's `HEAD` pointer.
    Head { hash: String },
    /// A named reference parsed from a `refs/<kind>/<name>` path. `heads`
    /// maps to `branch` and `tags` to `tag`; any other kind (for example
    /// `pull`) passes through verbatim.
    Named {
        kind: String,
        name: String,
        hash: String,
    },
}

impl RemoteRef {
    fn hash(&self) -> &str {
        match self {
            RemoteRef::Head { hash } => hash,
            RemoteRef::Named { hash, .. } => hash,
        }
    }
}

/// List the references the remote advertises for a repository.
pub fn list_remote_refs(url: &str) -> Result<Vec<RemoteRef>> {
    let output = Command::new("git")
        .args(["ls-remote", url])
        .output()
        .map_err(|error| ScaffoldError::RemoteTransport {
            url: url.to_string(),
            cause: anyhow::Error::new(error).context("failed to run git ls-remote"),
        })?;

    if !output.status.success() {
        return Err(ScaffoldError::RemoteTransport {
            url: url.to_string(),
            cause: anyhow::anyhow!(
                "git ls-remote exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut refs = Vec::new();

    for line in stdout.lines() {
        if line.is_empty() {
            continue;
        }

        let reference = parse_ls_remote_line(line).map_err(|cause| {
            ScaffoldError::RemoteTransport {
                url: url.to_string(),
                cause,
            }
        })?;

        refs.push(reference);
    }

    Ok(refs)
}

/// Parse one `<hash>\t<ref path>` line of `git ls-remote` output.
fn parse_ls_remote_line(line: &str) -> std::result::Result<RemoteRef, anyhow::Error> {
    let (hash, ref_path) = line
        .split_once('\t')
        .ok_or_else(|| anyhow::anyhow!("invalid ls-remote line: {line}"))?;

    if hash.is_empty() || ref_path.is_empty() {
        anyhow::bail!("invalid hash: {hash} and ref: {ref_path}");
    }

    if ref_path == "HEAD" {
        return Ok(RemoteRef::Head {
            hash: hash.to_string(),
        });
    }

    let Some(rest) = ref_path.strip_prefix("refs/") else {
        anyhow::bail!("could not parse ref: {ref_path}");
    };
    let Some((kind, name)) = rest.split_once('/') else {
        anyhow::bail!("could not parse ref: {ref_path}");
    };

    let kind = match kind {
        "heads" => "branch",
        "tags" => "tag",
        other => other,
    };

    Ok(RemoteRef::Named {
        kind: kind.to_string(),
        name: name.to_string(),
        hash: hash.to_string(),
    })
}

/// Resolve the requested ref of a repository reference to a commit hash.
pub fn resolve_ref(reference: &RepositoryReference) -> Result<String> {
    let refs = list_remote_refs(&reference.https_url)?;
    resolve_from(reference, &refs)
}

/// Resolve against an already-listed candidate set.
///
/// Resolution order per candidate, first match wins: the requested ref is
/// `HEAD` and the candidate is the HEAD pointer; the requested ref equals
/// the candidate's name; the requested ref equals the candidate's full
/// hash. Only when no exact match exists does short-hash matching apply.
pub fn resolve_from(reference: &RepositoryReference, refs: &[RemoteRef]) -> Result<String> {
    let requested = reference.git_ref.as_str();

    for candidate in refs {
        let exact = match candidate {
            RemoteRef::Head { .. } => requested == "HEAD",
            RemoteRef::Named { name, .. } => requested == name,
        };

        if exact || requested == candidate.hash() {
            return Ok(candidate.hash().to_string());
        }
    }

    // Short-hash fallback over all non-HEAD refs, regardless of kind.
    let mut matches: Vec<String> = Vec::new();

    if requested.len() > 4 {
        for candidate in refs {
            if matches!(candidate, RemoteRef::Head { .. }) {
                continue;
            }

            let hash = candidate.hash();
            if hash.starts_with(requested) && !matches.iter().any(|m| m == hash) {
                matches.push(hash.to_string());
            }
        }
    }

    match matches.len() {
        0 => Err(ScaffoldError::RefNotFound {
            reference: requested.to_string(),
            url: reference.https_url.clone(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(ScaffoldError::AmbiguousRef {
            reference: requested.to_string(),
            matches,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::parse_git_url;

    fn reference(git_ref: &str) -> RepositoryReference {
        parse_git_url(&format!("owner/name#{git_ref}")).unwrap()
    }

    fn head(hash: &str) -> RemoteRef {
        RemoteRef::Head {
            hash: hash.to_string(),
        }
    }

    fn named(kind: &str, name: &str, hash: &str) -> RemoteRef {
        RemoteRef::Named {
            kind: kind.to_string(),
            name: name.to_string(),
            hash: hash.to_string(),
        }
    }

    #[test]
    fn parses_head_line() {
        let parsed = parse_ls_remote_line("1234567890abcdef\tHEAD").unwrap();
        assert_eq!(parsed, head("1234567890abcdef"));
    }

    #[test]
    fn classifies_heads_and_tags() {
        assert_eq!(
            parse_ls_remote_line("abc\trefs/heads/main").unwrap(),
            named("branch", "main", "abc")
        );
        assert_eq!(
            parse_ls_remote_line("abc\trefs/tags/v1.0.0").unwrap(),
            named("tag", "v1.0.0", "abc")
        );
    }

    #[test]
    fn other_kinds_pass_through_verbatim() {
        assert_eq!(
            parse_ls_remote_line("abc\trefs/pull/42/head").unwrap(),
            named("pull", "42/head", "abc")
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_ls_remote_line("no-tab-here").is_err());
        assert!(parse_ls_remote_line("abc\tnot-a-ref-path").is_err());
    }

    #[test]
    fn head_request_resolves_to_head_pointer() {
        let refs = vec![head("aaa111"), named("branch", "main", "bbb222")];
        let hash = resolve_from(&parse_git_url("owner/name").unwrap(), &refs).unwrap();
        assert_eq!(hash, "aaa111");
    }

    #[test]
    fn named_ref_resolves_by_name() {
        let refs = vec![
            head("aaa111"),
            named("branch", "main", "bbb222"),
            named("tag", "v1.2.3", "ccc333"),
        ];
        assert_eq!(resolve_from(&reference("v1.2.3"), &refs).unwrap(), "ccc333");
        assert_eq!(resolve_from(&reference("main"), &refs).unwrap(), "bbb222");
    }

    #[test]
    fn full_hash_resolves_to_itself() {
        let refs = vec![named("branch", "main", "bbb222")];
        assert_eq!(resolve_from(&reference("bbb222"), &refs).unwrap(), "bbb222");
    }

    #[test]
    fn short_hash_resolves_when_unique() {
        let refs = vec![
            named("branch", "main", "abcdef1234567890"),
            named("tag", "v1.0", "fedcba0987654321"),
        ];
        assert_eq!(
            resolve_from(&reference("abcde"), &refs).unwrap(),
            "abcdef1234567890"
        );
    }

    #[test]
    fn short_hash_under_five_chars_is_not_matched() {
        let refs = vec![named("branch", "main", "abcdef1234567890")];
        let result = resolve_from(&reference("abcd"), &refs);
        assert!(matches!(result, Err(ScaffoldError::RefNotFound { .. })));
    }

    #[test]
    fn ambiguous_short_hash_names_all_matches() {
        let refs = vec![
            named("branch", "main", "abcde1111111"),
            named("tag", "v1.0", "abcde2222222"),
        ];
        let result = resolve_from(&reference("abcde"), &refs);

        match result {
            Err(ScaffoldError::AmbiguousRef { matches, .. }) => {
                assert_eq!(matches, vec!["abcde1111111", "abcde2222222"]);
            }
            other => panic!("expected AmbiguousRef, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_hashes_from_several_refs_are_not_ambiguous() {
        // A tag and a branch can point at the same commit.
        let refs = vec![
            named("branch", "main", "abcde1111111"),
            named("tag", "v1.0", "abcde1111111"),
        ];
        assert_eq!(
            resolve_from(&reference("abcde"), &refs).unwrap(),
            "abcde1111111"
        );
    }

    #[test]
    fn exact_match_wins_over_short_hash() {
        // A branch literally named like a short hash resolves by name.
        let refs = vec![
            named("branch", "abcde", "1234512345123"),
            named("tag", "v1.0", "abcde99999"),
        ];
        assert_eq!(
            resolve_from(&reference("abcde"), &refs).unwrap(),
            "1234512345123"
        );
    }

    #[test]
    fn missing_ref_reports_not_found() {
        let refs = vec![head("aaa111"), named("branch", "main", "bbb222")];
        let result = resolve_from(&reference("does-not-exist"), &refs);
        assert!(matches!(result, Err(ScaffoldError::RefNotFound { .. })));
    }

    #[test]
    fn unreachable_remote_wraps_url() {
        let reference = parse_git_url("owner/name").unwrap();
        let mut unreachable = reference.clone();
        unreachable.https_url = "file:///definitely/not/a/repository".to_string();

        let result = resolve_ref(&unreachable);
        match result {
            Err(ScaffoldError::RemoteTransport { url, .. }) => {
                assert_eq!(url, "file:///definitely/not/a/repository");
            }
            other => panic!("expected RemoteTransport, got {other:?}"),
        }
    }
}
