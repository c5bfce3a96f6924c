//! Special path classification for a single mount.
//!
//! Patterns come from a backend's declared [`Paths`](crate::logical::Paths).
//! A trailing `*` marks a prefix pattern; it is stripped before storage.

use super::prefix_map::PrefixMap;

const WILDCARD: char = '*';
const SEPARATOR: char = '/';

/// How a stored pattern must relate to the path being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
}

/// The pattern selected for a path, tagged with its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMatch<'a> {
    ExactMatch(&'a str),
    PrefixMatch(&'a str),
}

impl PatternMatch<'_> {
    /// Whether the selected pattern really covers `path`.
    pub fn accepts(&self, path: &str) -> bool {
        match self {
            Self::ExactMatch(pattern) => *pattern == path,
            Self::PrefixMatch(pattern) => path.starts_with(pattern),
        }
    }
}

/// Immutable set of exact and prefix patterns.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: PrefixMap<MatchMode>,
}

impl PathMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = PrefixMap::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match pattern.strip_suffix(WILDCARD) {
                Some(prefix) => map.insert(prefix, MatchMode::Prefix),
                None => map.insert(pattern, MatchMode::Exact),
            };
        }
        Self { patterns: map }
    }

    /// Longest stored pattern that is a prefix of `path`.
    pub fn lookup(&self, path: &str) -> Option<PatternMatch<'_>> {
        self.patterns.longest_prefix(path).map(|(pattern, mode)| match mode {
            MatchMode::Exact => PatternMatch::ExactMatch(pattern),
            MatchMode::Prefix => PatternMatch::PrefixMatch(pattern),
        })
    }

    /// Only the longest pattern is consulted; if it is exact and differs from
    /// `path`, shorter prefix patterns do not get a second chance.
    pub fn matches(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|found| found.accepts(path))
    }

    /// Like [`matches`](Self::matches), but a prefix pattern ending in `/`
    /// also covers the bare directory name, so `secret/*` matches `secret`
    /// the same way routing treats `foo` as `foo/`.
    ///
    /// Only root classification uses this; widening the unauthenticated set
    /// would skip authentication for paths the backend never declared.
    pub fn matches_dir(&self, path: &str) -> bool {
        if self.matches(path) {
            return true;
        }
        if path.is_empty() || path.ends_with(SEPARATOR) {
            return false;
        }
        let dir = format!("{}{}", path, SEPARATOR);
        matches!(self.lookup(&dir), Some(PatternMatch::PrefixMatch(pattern)) if pattern == dir)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
