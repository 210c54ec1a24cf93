//! Passthrough registrar.
//!
//! Declarations name files that skip template processing and are copied to
//! the output tree unchanged, at the same path relative to the input root.
//! A declaration may be an exact file (`favicon.ico`), a directory
//! (`assets/`, which claims everything below it), or a glob
//! (`works/**/*.{jpg,png}`).

use crate::glob::{GlobError, GlobSet, Pattern};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Passthrough {
    globs: GlobSet,
}

impl Passthrough {
    pub fn new<I, S>(declarations: I) -> Result<Self, GlobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            globs: GlobSet::new(declarations)?,
        })
    }

    /// Whether a file (relative to the input root) is claimed.
    pub fn matches(&self, rel_path: &Path) -> bool {
        self.globs.matches_within(rel_path)
    }

    /// Declarations that claimed none of `claimed`.
    ///
    /// Literal declarations in this list point at something that does not
    /// exist; globs may legitimately match nothing.
    pub fn unmatched<'a>(&'a self, claimed: &[String]) -> Vec<&'a Pattern> {
        self.globs
            .patterns()
            .iter()
            .filter(|p| !claimed.iter().any(|c| p.matches_within(Path::new(c))))
            .collect()
    }

    /// Log declarations that matched nothing.
    pub fn report_unmatched(&self, claimed: &[String]) {
        for pattern in self.unmatched(claimed) {
            if pattern.is_literal() {
                log::warn!("passthrough '{}' matched no files", pattern.as_str());
            } else {
                log::debug!("passthrough glob '{}' matched no files", pattern.as_str());
            }
        }
    }
}

/// Copy claimed files from `input` to the same relative paths under `output`.
///
/// Returns the number of files copied.
pub fn copy_files(input: &Path, output: &Path, files: &[String]) -> std::io::Result<usize> {
    files.par_iter().try_for_each(|rel| {
        let src = input.join(rel);
        let dst = output.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, &dst)?;
        log::debug!("copied {rel}");
        Ok::<(), std::io::Error>(())
    })?;
    Ok(files.len())
}
