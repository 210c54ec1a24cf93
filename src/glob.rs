//! Glob patterns over project-relative paths.
//!
//! Ignore rules, passthrough declarations, and collection membership are all
//! written as globs relative to the input directory and compiled with
//! [`wax`]. The usual syntax applies:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `*` | any run of characters within one path segment |
//! | `?` | exactly one character within one path segment |
//! | `**` | zero or more whole path segments |
//! | `{a,b}` | alternatives |
//!
//! A leading `./` and a trailing `/` are ignored, so `./docs/` and `docs` are
//! the same pattern. On top of plain matching, [`Pattern::matches_within`]
//! lets a directory pattern claim everything below it.

use std::path::Path;
use thiserror::Error;
use wax::{Glob, Pattern as _};

/// Characters that make a pattern more than a literal path.
const META: [char; 9] = ['*', '?', '$', '[', ']', '{', '}', '<', '>'];

#[derive(Error, Debug)]
pub enum GlobError {
    #[error("Empty glob pattern")]
    Empty,
    #[error("Glob pattern must be relative: {0}")]
    Absolute(String),
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Build {
        pattern: String,
        source: wax::BuildError,
    },
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    glob: Glob<'static>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let trimmed = pattern.trim();
        if trimmed.starts_with('/') {
            return Err(GlobError::Absolute(pattern.to_string()));
        }
        let normalized = trimmed.trim_start_matches("./").trim_end_matches('/');
        if normalized.is_empty() {
            return Err(GlobError::Empty);
        }

        let glob = Glob::new(normalized)
            .map_err(|source| GlobError::Build {
                pattern: pattern.to_string(),
                source,
            })?
            .into_owned();

        Ok(Self {
            source: pattern.to_string(),
            glob,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern has no wildcards or alternatives.
    pub fn is_literal(&self) -> bool {
        !self.source.contains(META)
    }

    /// Match the whole path.
    pub fn matches_path(&self, path: &Path) -> bool {
        self.glob.is_match(path)
    }

    /// Match the path itself or any of its ancestor directories.
    ///
    /// This is how directory declarations like `docs` or `assets/` claim
    /// every file underneath them.
    pub fn matches_within(&self, path: &Path) -> bool {
        path.ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.glob.is_match(p))
    }
}

/// An ordered list of patterns, matched as a union.
#[derive(Debug, Clone, Default)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

impl GlobSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, GlobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(path))
    }

    pub fn matches_within(&self, path: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_within(path))
    }
}
