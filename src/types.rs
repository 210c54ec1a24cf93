//! Shared types passed between discovery, collection building, and rendering.

use crate::dates;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// How a document's body is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    /// Template engine, then markdown → HTML.
    Markdown,
    /// Template engine only.
    Html,
    /// Template engine only. Also used for `.njk` files, whose syntax Tera
    /// shares for everything a portfolio template needs.
    Tera,
}

impl TemplateFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(TemplateFormat::Markdown),
            "html" | "htm" => Some(TemplateFormat::Html),
            "tera" | "njk" => Some(TemplateFormat::Tera),
            _ => None,
        }
    }
}

/// Output location override from front matter.
#[derive(Debug, Clone, PartialEq)]
pub enum Permalink {
    /// URL derived from the input path.
    Derived,
    /// `permalink: /some/where/`
    Custom(String),
    /// `permalink: false`: rendered for collections, never written.
    Disabled,
}

/// A content document: one template file with its front matter.
///
/// Created once by [`crate::scan`] and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the input directory, `/`-separated.
    pub input_path: String,
    /// Page identity. `None` when the permalink is disabled.
    pub url: Option<String>,
    /// File stem, or the parent directory name for `index.*` files.
    pub file_slug: String,
    pub format: TemplateFormat,
    pub title: Option<String>,
    /// `None` when missing or unparseable.
    pub date: Option<DateTime<Utc>>,
    pub year: Option<i64>,
    pub featured: bool,
    pub draft: bool,
    pub layout: Option<String>,
    pub permalink: Permalink,
    /// The complete front matter.
    pub data: Map<String, Value>,
    /// Template source after the front matter.
    pub body: String,
}

impl Document {
    /// The `page` object exposed to templates.
    pub fn page_value(&self) -> Value {
        json!({
            "url": self.url,
            "input_path": self.input_path,
            "file_slug": self.file_slug,
            "date": self.date.as_ref().map(dates::format_iso),
        })
    }

    /// This document as a collection item, optionally carrying its rendered
    /// content.
    pub fn item_value(&self, content: Option<&str>) -> Value {
        json!({
            "url": self.url,
            "input_path": self.input_path,
            "file_slug": self.file_slug,
            "date": self.date.as_ref().map(dates::format_iso),
            "data": self.data,
            "content": content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::doc;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            TemplateFormat::from_extension("MD"),
            Some(TemplateFormat::Markdown)
        );
        assert_eq!(
            TemplateFormat::from_extension("html"),
            Some(TemplateFormat::Html)
        );
        assert_eq!(
            TemplateFormat::from_extension("tera"),
            Some(TemplateFormat::Tera)
        );
        assert_eq!(
            TemplateFormat::from_extension("njk"),
            Some(TemplateFormat::Tera)
        );
        assert_eq!(TemplateFormat::from_extension("css"), None);
    }

    #[test]
    fn item_value_shape() {
        let mut d = doc("writings/first.md");
        d.date = dates::parse_date("2025-01-15");
        d.data.insert("title".into(), json!("First"));

        let item = d.item_value(Some("<p>hi</p>"));
        assert_eq!(item["url"], "/writings/first/");
        assert_eq!(item["date"], "2025-01-15T00:00:00.000Z");
        assert_eq!(item["data"]["title"], "First");
        assert_eq!(item["content"], "<p>hi</p>");
    }

    #[test]
    fn undated_page_value_has_null_date() {
        let d = doc("vignettes/quiet.md");
        let page = d.page_value();
        assert!(page["date"].is_null());
        assert_eq!(page["file_slug"], "quiet");
    }
}
