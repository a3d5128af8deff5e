//! Pattern matching for include/exclude file selection.
//!
//! A [`Matcher`] compiles a list of [`MatchSpec`]s into a single decision
//! function over slash-separated relative paths. Literal strings match by
//! equality, glob strings compile through [`globset`] (a leading `!` negates
//! the glob), regular expressions test directly, and predicates are invoked
//! as-is.
//!
//! Evaluation short-circuits: a negated match excludes immediately, and in
//! first-match-wins mode ([`MatcherOptions::disable_negation`]) any match
//! accepts immediately. Dot files, junk files, and extension filtering are
//! applied before any spec is evaluated.

mod junk;

pub use junk::is_junk;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::Result;

/// A predicate over a candidate relative path.
pub type MatchPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// A single include or exclude specification.
pub enum MatchSpec {
    /// A literal path or a glob pattern. A pattern with glob metacharacters
    /// is compiled as a glob; a leading `!` negates it. Anything else must
    /// match by exact equality.
    Pattern(String),
    /// A regular expression tested against the candidate path.
    Regex(regex::Regex),
    /// An arbitrary predicate function.
    Predicate(MatchPredicate),
}

impl std::fmt::Debug for MatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSpec::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            MatchSpec::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            MatchSpec::Predicate(_) => f.debug_tuple("Predicate").finish(),
        }
    }
}

impl From<&str> for MatchSpec {
    fn from(pattern: &str) -> Self {
        MatchSpec::Pattern(pattern.to_string())
    }
}

impl From<String> for MatchSpec {
    fn from(pattern: String) -> Self {
        MatchSpec::Pattern(pattern)
    }
}

impl From<regex::Regex> for MatchSpec {
    fn from(regex: regex::Regex) -> Self {
        MatchSpec::Regex(regex)
    }
}

/// Options controlling how specs are compiled and evaluated.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    /// Match paths containing dot-prefixed segments.
    pub dot: bool,

    /// Match OS/editor junk files.
    pub junk: bool,

    /// When set, only paths ending in one of these extensions can match.
    pub extensions: Option<Vec<String>>,

    /// Treat a leading `!` as a literal character instead of negation. In
    /// this mode the first matching spec accepts immediately.
    pub disable_negation: bool,

    /// Expand globs ending in `/` by appending a recursive `**/*` suffix.
    pub expand_globs: bool,

    /// Compile globs case-insensitively.
    pub case_insensitive: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            dot: false,
            junk: false,
            extensions: None,
            disable_negation: false,
            expand_globs: false,
            case_insensitive: false,
        }
    }
}

enum Compiled {
    Literal(String),
    Glob { matcher: GlobMatcher, negated: bool },
    Regex(regex::Regex),
    Predicate(MatchPredicate),
}

/// A compiled set of match specs.
pub struct Matcher {
    specs: Vec<Compiled>,
    options: MatcherOptions,
}

/// Whether a pattern string contains glob syntax (or leading negation).
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.starts_with('!')
        || pattern
            .chars()
            .any(|c| matches!(c, '*' | '?' | '[' | ']' | '{' | '}'))
}

impl Matcher {
    /// Compile the provided specs into a matcher.
    pub fn compile(specs: Vec<MatchSpec>, options: MatcherOptions) -> Result<Self> {
        let mut compiled = Vec::with_capacity(specs.len());

        for spec in specs {
            compiled.push(match spec {
                MatchSpec::Pattern(pattern) if !is_glob_pattern(&pattern) => {
                    Compiled::Literal(pattern)
                }
                MatchSpec::Pattern(pattern) => {
                    let negated = !options.disable_negation && pattern.starts_with('!');
                    let mut glob = if negated {
                        pattern[1..].to_string()
                    } else {
                        pattern
                    };

                    if options.expand_globs && glob.ends_with('/') {
                        glob.push_str("**/*");
                    }

                    let matcher = GlobBuilder::new(&glob)
                        .case_insensitive(options.case_insensitive)
                        .build()
                        .map_err(|error| {
                            anyhow::anyhow!("invalid glob pattern '{}': {}", glob, error)
                        })?
                        .compile_matcher();

                    Compiled::Glob { matcher, negated }
                }
                MatchSpec::Regex(regex) => Compiled::Regex(regex),
                MatchSpec::Predicate(predicate) => Compiled::Predicate(predicate),
            });
        }

        Ok(Self {
            specs: compiled,
            options,
        })
    }

    /// Whether the matcher has no specs at all (and therefore never matches).
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Evaluate the matcher against a slash-separated relative path.
    pub fn is_match(&self, source: &str) -> bool {
        if self.specs.is_empty() {
            return false;
        }

        if !self.options.dot && source.split('/').any(|part| part.starts_with('.')) {
            return false;
        }

        let base_name = source.rsplit('/').next().unwrap_or(source);
        if !self.options.junk && (is_junk(source) || is_junk(base_name)) {
            return false;
        }

        if let Some(extensions) = &self.options.extensions {
            if !extensions.iter().any(|ext| source.ends_with(ext.as_str())) {
                return false;
            }
        }

        let mut any_match = false;

        for spec in &self.specs {
            let (matched, negated) = match spec {
                Compiled::Literal(literal) => (literal == source, false),
                Compiled::Glob { matcher, negated } => (matcher.is_match(source), *negated),
                Compiled::Regex(regex) => (regex.is_match(source), false),
                Compiled::Predicate(predicate) => (predicate(source), false),
            };

            if matched && self.options.disable_negation {
                return true;
            }

            if matched && negated {
                return false;
            }

            any_match = matched || any_match;
        }

        any_match
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("specs", &self.specs.len())
            .field("options", &self.options)
            .finish()
    }
}
