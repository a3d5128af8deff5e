//! Parsing repository shorthands and URLs into structured references.
//!
//! All of the following spellings normalize to the same reference:
//!
//! ```text
//! test_org/test_repo
//! github:test_org/test_repo
//! git@github.com:test_org/test_repo
//! https://github.com/test_org/test_repo.git
//! ```
//!
//! with optional `/subdir` segments and an optional `#ref` suffix. Parsing
//! is an explicit grammar of ordered alternatives (`git@` / explicit host /
//! `provider:` / bare) rather than one monolithic pattern; every
//! alternative produces the same normalized [`RepositoryReference`].
//!
//! An unsupported provider yields `None` — never a partial result.

/// The supported git hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Github,
    Gitlab,
    Bitbucket,
    Sourcehut,
}

impl Provider {
    /// Resolve a site name (an explicit host or a `provider:` prefix) to a
    /// supported provider. Trailing `.com`/`.org` suffixes are stripped
    /// before the lookup.
    pub fn from_site(site: &str) -> Option<Self> {
        let normalized = site
            .strip_suffix(".com")
            .or_else(|| site.strip_suffix(".org"))
            .unwrap_or(site);

        match normalized {
            "github" => Some(Provider::Github),
            "gitlab" => Some(Provider::Gitlab),
            "bitbucket" => Some(Provider::Bitbucket),
            "git.sr.ht" => Some(Provider::Sourcehut),
            _ => None,
        }
    }

    /// The short site name used in cache keys.
    pub fn site(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Gitlab => "gitlab",
            Provider::Bitbucket => "bitbucket",
            Provider::Sourcehut => "git.sr.ht",
        }
    }

    /// The canonical domain for https and ssh URLs.
    pub fn domain(&self) -> &'static str {
        match self {
            Provider::Github => "github.com",
            Provider::Gitlab => "gitlab.com",
            Provider::Bitbucket => "bitbucket.org",
            Provider::Sourcehut => "git.sr.ht",
        }
    }

    /// How content for this provider is acquired: providers with a tarball
    /// endpoint download an archive, the rest are cloned.
    pub fn fetch_mode(&self) -> FetchMode {
        match self {
            Provider::Github | Provider::Gitlab | Provider::Bitbucket => FetchMode::Archive,
            Provider::Sourcehut => FetchMode::Clone,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.site())
    }
}

/// The two content-acquisition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Tarball download and extraction.
    Archive,
    /// Full clone, checkout, and metadata prune.
    Clone,
}

/// A parsed repository reference. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    pub provider: Provider,
    pub owner: String,
    pub name: String,
    /// Requested subdirectory within the repository, with a leading `/`.
    pub subdirectory: Option<String>,
    /// The requested ref; defaults to `HEAD`.
    pub git_ref: String,
    /// Canonical `https://{domain}/{owner}/{name}` form.
    pub https_url: String,
    /// Canonical `git@{domain}:{owner}/{name}` form.
    pub ssh_url: String,
    pub fetch_mode: FetchMode,
}

/// A reference resolved to a concrete commit. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub reference: RepositoryReference,
    pub commit_hash: String,
}

/// Parse a repository source string.
///
/// Returns `None` when the string does not match the grammar or names an
/// unsupported provider; callers surface this as a resolution error with
/// the original source string.
pub fn parse_git_url(source: &str) -> Option<RepositoryReference> {
    let (body, git_ref) = split_ref(source);
    let (site, path) = split_site(body)?;

    let provider = match &site {
        Some(site) => Provider::from_site(site)?,
        None => Provider::Github,
    };

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());

    let owner = segments.next()?;
    let name = segments.next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);

    if owner.is_empty() || name.is_empty() || has_whitespace(owner) || has_whitespace(name) {
        return None;
    }

    let subdirectory: Vec<&str> = segments.collect();
    if subdirectory.iter().any(|segment| has_whitespace(segment)) {
        return None;
    }
    let subdirectory = if subdirectory.is_empty() {
        None
    } else {
        Some(format!("/{}", subdirectory.join("/")))
    };

    let domain = provider.domain();
    let https_url = format!("https://{domain}/{owner}/{name}");
    let ssh_url = format!("git@{domain}:{owner}/{name}");

    Some(RepositoryReference {
        provider,
        owner: owner.to_string(),
        name: name.to_string(),
        subdirectory,
        git_ref,
        https_url,
        ssh_url,
        fetch_mode: provider.fetch_mode(),
    })
}

/// Split the optional `#ref` suffix; an absent or empty ref means `HEAD`.
fn split_ref(source: &str) -> (&str, String) {
    match source.split_once('#') {
        Some((body, reference)) if !reference.is_empty() => (body, reference.to_string()),
        Some((body, _)) => (body, "HEAD".to_string()),
        None => (source, "HEAD".to_string()),
    }
}

/// Extract the optional site prefix, in order of alternatives:
/// `git@host:path`, `[https://]host/path` (host must contain a dot),
/// `provider:path`, bare `path`.
fn split_site(body: &str) -> Option<(Option<String>, &str)> {
    if let Some(rest) = body.strip_prefix("git@") {
        let (host, path) = rest.split_once(':')?;
        if host.is_empty() || host.contains('/') {
            return None;
        }
        return Some((Some(host.to_string()), path));
    }

    let (explicit_scheme, rest) = match body.strip_prefix("https://") {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let head = rest.split('/').next().unwrap_or(rest);

    if !head.contains(':') && head.contains('.') && rest.len() > head.len() {
        // An explicit host followed by a path.
        return Some((Some(head.to_string()), &rest[head.len() + 1..]));
    }

    if explicit_scheme {
        // `https://` demands a dotted host.
        return None;
    }

    if let Some((site, path)) = rest.split_once(':') {
        if !site.contains('/') {
            return Some((Some(site.to_string()), path));
        }
    }

    Some((None, rest))
}

fn has_whitespace(value: &str) -> bool {
    value.chars().any(char::is_whitespace)
}
