//! Shared test utilities.
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path(), &SiteConfig::default()).unwrap();
//! let post = doc_by_path(&manifest, "writings/first-light.md");
//! assert_eq!(post.url.as_deref(), Some("/writings/first-light/"));
//! ```

use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::scan::{Manifest, derive_url};
use crate::types::{Document, Permalink, TemplateFormat};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_tree(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).unwrap();
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(dst.join(rel))?;
        } else {
            std::fs::copy(entry.path(), dst.join(rel))?;
        }
    }
    Ok(())
}

// =========================================================================
// Builders
// =========================================================================

/// A bare document at `input_path` with a derived url and no front matter.
pub fn doc(input_path: &str) -> Document {
    let (url, file_slug) = derive_url(input_path);
    let format = Path::new(input_path)
        .extension()
        .and_then(|e| TemplateFormat::from_extension(&e.to_string_lossy()))
        .unwrap_or(TemplateFormat::Markdown);
    Document {
        input_path: input_path.to_string(),
        url: Some(url),
        file_slug,
        format,
        title: None,
        date: None,
        year: None,
        featured: false,
        draft: false,
        layout: None,
        permalink: Permalink::Derived,
        data: serde_json::Map::new(),
        body: String::new(),
    }
}

// =========================================================================
// Lookups
// =========================================================================

/// Find a document by input path. Panics if missing.
pub fn doc_by_path<'a>(manifest: &'a Manifest, input_path: &str) -> &'a Document {
    manifest
        .documents
        .iter()
        .find(|d| d.input_path == input_path)
        .unwrap_or_else(|| {
            let paths: Vec<&str> = manifest
                .documents
                .iter()
                .map(|d| d.input_path.as_str())
                .collect();
            panic!("document '{input_path}' not found. Available: {paths:?}")
        })
}

/// Input paths of a collection, in order.
pub fn input_paths<'a>(items: &[&'a Document]) -> Vec<&'a str> {
    items.iter().map(|d| d.input_path.as_str()).collect()
}
