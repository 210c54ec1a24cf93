//! Collection builder.
//!
//! Three named views over the discovered documents, each recomputed from
//! scratch on every build:
//!
//! | Collection | Members | Order |
//! |------------|---------|-------|
//! | `writings` | writings glob | `date` descending |
//! | `works` | works glob, minus drafts in production | featured first, then `year` descending |
//! | `vignettes` | vignettes glob | `date` descending |
//!
//! Undated documents sort after every dated one; a missing `year` counts as
//! 0. Every sort is `sort_by` (stable), and discovery hands documents over in
//! input-path order, so ties come out in the same order on every build.
//!
//! An `all` collection (every document, oldest first) is provided for
//! templates that want it.

use crate::config::{BuildMode, CollectionsConfig};
use crate::glob::{GlobError, GlobSet};
use crate::types::Document;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// Names exposed under `collections.*` in templates, in display order.
pub const COLLECTION_NAMES: &[&str] = &["writings", "works", "vignettes"];

/// Writings: newest first.
pub fn writings<'a>(docs: &'a [Document], area: &GlobSet) -> Vec<&'a Document> {
    let mut items = members(docs, area);
    items.sort_by(|a, b| by_date_desc(a, b));
    items
}

/// Works: featured first, then newest year; drafts hidden in production.
pub fn works<'a>(docs: &'a [Document], area: &GlobSet, mode: BuildMode) -> Vec<&'a Document> {
    let mut items: Vec<&Document> = members(docs, area)
        .into_iter()
        .filter(|d| !(mode.is_production() && d.draft))
        .collect();
    items.sort_by(|a, b| by_featured_then_year(a, b));
    items
}

/// Vignettes: newest first.
pub fn vignettes<'a>(docs: &'a [Document], area: &GlobSet) -> Vec<&'a Document> {
    let mut items = members(docs, area);
    items.sort_by(|a, b| by_date_desc(a, b));
    items
}

fn members<'a>(docs: &'a [Document], area: &GlobSet) -> Vec<&'a Document> {
    docs.iter()
        .filter(|d| area.matches_path(Path::new(&d.input_path)))
        .collect()
}

/// Descending date, undated last.
pub fn by_date_desc(a: &Document, b: &Document) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending date, undated last.
pub fn by_date_asc(a: &Document, b: &Document) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Featured before non-featured, then descending year (missing = 0).
pub fn by_featured_then_year(a: &Document, b: &Document) -> Ordering {
    b.featured
        .cmp(&a.featured)
        .then_with(|| b.year.unwrap_or(0).cmp(&a.year.unwrap_or(0)))
}

/// All collections for one build.
#[derive(Debug)]
pub struct Collections<'a> {
    pub all: Vec<&'a Document>,
    pub writings: Vec<&'a Document>,
    pub works: Vec<&'a Document>,
    pub vignettes: Vec<&'a Document>,
    /// Works drafts dropped in production; their pages are not written.
    pub hidden: Vec<&'a Document>,
}

impl<'a> Collections<'a> {
    pub fn build(
        docs: &'a [Document],
        config: &CollectionsConfig,
        mode: BuildMode,
    ) -> Result<Self, GlobError> {
        let globs = config.globs()?;

        let works = works(docs, &globs.works, mode);
        let hidden: Vec<&Document> = members(docs, &globs.works)
            .into_iter()
            .filter(|d| !works.iter().any(|w| std::ptr::eq(*w, *d)))
            .collect();
        if !hidden.is_empty() {
            log::info!("{} draft works hidden in {} mode", hidden.len(), mode.as_str());
        }

        let mut all: Vec<&Document> = docs
            .iter()
            .filter(|d| !hidden.iter().any(|h| std::ptr::eq(*h, *d)))
            .collect();
        all.sort_by(|a, b| by_date_asc(a, b));

        Ok(Self {
            all,
            writings: writings(docs, &globs.writings),
            works,
            vignettes: vignettes(docs, &globs.vignettes),
            hidden,
        })
    }

    /// Look up a collection by template name.
    pub fn get(&self, name: &str) -> Option<&[&'a Document]> {
        match name {
            "all" => Some(&self.all),
            "writings" => Some(&self.writings),
            "works" => Some(&self.works),
            "vignettes" => Some(&self.vignettes),
            _ => None,
        }
    }

    /// Whether a document belongs to one of the named collections.
    pub fn is_member(&self, doc: &Document) -> bool {
        COLLECTION_NAMES.iter().any(|name| {
            self.get(name)
                .is_some_and(|items| items.iter().any(|d| std::ptr::eq(*d, doc)))
        })
    }

    pub fn is_hidden(&self, doc: &Document) -> bool {
        self.hidden.iter().any(|d| std::ptr::eq(*d, doc))
    }

    /// The `collections` object for templates.
    ///
    /// `contents` maps input paths to rendered content; items without an
    /// entry carry `content: null`.
    pub fn to_value(&self, contents: &HashMap<String, String>) -> Value {
        let item = |d: &&Document| d.item_value(contents.get(&d.input_path).map(String::as_str));
        let mut map = Map::new();
        map.insert("all".into(), Value::Array(self.all.iter().map(item).collect()));
        for name in COLLECTION_NAMES {
            if let Some(items) = self.get(name) {
                map.insert((*name).into(), Value::Array(items.iter().map(item).collect()));
            }
        }
        Value::Object(map)
    }
}
