//! Page rendering and output.
//!
//! Stage 2 and 3 of the build. Takes the discovered documents and their
//! collections and produces the final static site.
//!
//! ## Templates
//!
//! Everything is rendered by a single [`Tera`] instance:
//!
//! - template files in the includes directory, registered by their relative
//!   path (`{% include "nav.html" %}`); stylesheets and other assets that
//!   live beside them are left to passthrough
//! - files in the layouts directory (by default `_includes/layouts`); a
//!   layout may name its own parent with a `layout:` key in front matter
//! - every document body
//!
//! Autoescaping is off. Bodies, layouts, and shortcodes produce HTML, and
//! `content` is inserted into layouts as-is.
//!
//! ## Render Order
//!
//! Collection members are rendered first, without layouts, so their output
//! can be attached to collection items as `content`. Every document is then
//! rendered again through its layout chain with the complete collections,
//! which is what listing pages and feeds iterate over.
//!
//! ## Context
//!
//! | Key | Value |
//! |-----|-------|
//! | *(global data)* | one key per file in the data directory |
//! | *(front matter)* | every front matter key of the document |
//! | `page` | `url`, `input_path`, `file_slug`, `date` |
//! | `collections` | `all`, `writings`, `works`, `vignettes` |
//! | `site_mode` | `"development"` or `"production"` |
//! | `content` | rendered body, inside layouts only |
//!
//! ## Output Structure
//!
//! ```text
//! _site/
//! ├── index.html                     # passthrough, copied as-is
//! ├── writings/
//! │   ├── index.html                 # writings/index.tera
//! │   └── first-light/index.html     # writings/first-light.md
//! ├── _includes/styles/base.css      # passthrough inside the includes dir
//! └── feed.xml                       # permalink: /feed.xml
//! ```

use crate::collections::Collections;
use crate::config::{BuildMode, SiteConfig};
use crate::glob::GlobError;
use crate::library;
use crate::markdown;
use crate::passthrough;
use crate::scan::{self, Manifest, ScanError};
use crate::types::{Document, TemplateFormat};
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::error::Error as _;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Invalid glob: {0}")]
    Glob(#[from] GlobError),
    #[error("Template error: {0}")]
    Template(String),
    #[error("Failed to render {path}: {message}")]
    Render { path: String, message: String },
    #[error("Unknown layout '{layout}' referenced by {from}")]
    UnknownLayout { layout: String, from: String },
    #[error("Layout cycle: {0}")]
    LayoutCycle(String),
}

/// One rendered document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub input_path: String,
    /// `None` for documents with `permalink: false`.
    pub url: Option<String>,
    pub html: String,
}

/// What a build wrote.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// `(input_path, output path relative to the output dir)`, in input order.
    pub pages: Vec<(String, String)>,
    /// Rendered but not written (`permalink: false`).
    pub unwritten: Vec<String>,
    pub copied: usize,
}

#[derive(Debug, Clone)]
struct Layout {
    parent: Option<String>,
}

/// Template engine loaded with includes, layouts, document bodies, and the
/// filter/shortcode library.
pub struct Renderer {
    tera: Tera,
    /// Keyed by path relative to the layouts directory.
    layouts: BTreeMap<String, Layout>,
    mode: BuildMode,
}

impl Renderer {
    pub fn new(
        root: &Path,
        config: &SiteConfig,
        documents: &[Document],
        mode: BuildMode,
    ) -> Result<Self, GenerateError> {
        let input = root.join(&config.dirs.input);
        let includes_dir = input.join(&config.dirs.includes);
        let layouts_dir = input.join(&config.dirs.layouts);
        let mut sources: Vec<(String, String)> = Vec::new();

        for (rel, raw) in read_template_dir(&includes_dir, |path| {
            !path.starts_with(&layouts_dir)
                && path
                    .extension()
                    .is_some_and(|ext| config.is_template_format(&ext.to_string_lossy()))
        })? {
            sources.push((rel, raw));
        }

        let mut layouts = BTreeMap::new();
        for (rel, raw) in read_template_dir(&layouts_dir, |_| true)? {
            let (front_matter, body) = scan::split_front_matter(&raw);
            let data = scan::parse_front_matter(front_matter, &rel)?;
            let parent = data.get("layout").and_then(Value::as_str).map(String::from);
            sources.push((layout_template(&rel), body.to_string()));
            layouts.insert(rel, Layout { parent });
        }

        for doc in documents {
            sources.push((document_template(doc), doc.body.clone()));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        library::install(&mut tera);
        tera.add_raw_templates(sources)
            .map_err(|e| GenerateError::Template(error_chain(&e)))?;

        let renderer = Self {
            tera,
            layouts,
            mode,
        };
        renderer.check_layouts()?;
        log::debug!(
            "loaded {} layouts, {} templates",
            renderer.layouts.len(),
            renderer.tera.get_template_names().count()
        );
        Ok(renderer)
    }

    /// Every layout's parent chain must resolve and terminate.
    fn check_layouts(&self) -> Result<(), GenerateError> {
        for (name, layout) in &self.layouts {
            self.layout_chain(&layout_template(name), layout.parent.as_deref())?;
        }
        Ok(())
    }

    /// Resolve `first` and its ancestors to layout keys, innermost first.
    fn layout_chain(&self, from: &str, first: Option<&str>) -> Result<Vec<&str>, GenerateError> {
        let mut chain: Vec<&str> = Vec::new();
        let mut from = from.to_string();
        let mut next = first;
        while let Some(name) = next {
            let key = self
                .resolve_layout(name)
                .ok_or_else(|| GenerateError::UnknownLayout {
                    layout: name.to_string(),
                    from: from.clone(),
                })?;
            if chain.contains(&key) {
                let mut names: Vec<&str> = chain.clone();
                names.push(key);
                return Err(GenerateError::LayoutCycle(names.join(" -> ")));
            }
            chain.push(key);
            from = layout_template(key);
            next = self.layouts.get(key).and_then(|l| l.parent.as_deref());
        }
        Ok(chain)
    }

    /// Look a layout up by relative path, with or without its extension.
    fn resolve_layout(&self, name: &str) -> Option<&str> {
        let name = name.trim_start_matches('/');
        if let Some((key, _)) = self.layouts.get_key_value(name) {
            return Some(key);
        }
        self.layouts
            .keys()
            .find(|k| strip_extension(k) == name)
            .map(String::as_str)
    }

    /// Render every visible document.
    ///
    /// Works drafts hidden by the current mode are skipped entirely. Pages
    /// come back in input order.
    pub fn render_site(
        &self,
        manifest: &Manifest,
        collections: &Collections,
    ) -> Result<Vec<RenderedPage>, GenerateError> {
        let docs: Vec<&Document> = manifest
            .documents
            .iter()
            .filter(|d| !collections.is_hidden(d))
            .collect();

        let bare = collections.to_value(&HashMap::new());
        let contents: HashMap<String, String> = docs
            .par_iter()
            .filter(|d| collections.is_member(d))
            .map(|doc| {
                let ctx = self.context(doc, &bare, &manifest.data);
                Ok((doc.input_path.clone(), self.render_content(doc, &ctx)?))
            })
            .collect::<Result<_, GenerateError>>()?;
        log::debug!("rendered {} collection members", contents.len());

        let full = collections.to_value(&contents);
        docs.par_iter()
            .map(|doc| {
                let mut ctx = self.context(doc, &full, &manifest.data);
                let content = match contents.get(&doc.input_path) {
                    Some(content) => content.clone(),
                    None => self.render_content(doc, &ctx)?,
                };
                let html = self.apply_layouts(doc, &mut ctx, content)?;
                log::debug!("rendered {}", doc.input_path);
                Ok(RenderedPage {
                    input_path: doc.input_path.clone(),
                    url: doc.url.clone(),
                    html,
                })
            })
            .collect()
    }

    fn context(&self, doc: &Document, collections: &Value, data: &Map<String, Value>) -> Context {
        let mut ctx = Context::new();
        for (key, value) in data.iter().chain(doc.data.iter()) {
            ctx.insert(key.as_str(), value);
        }
        ctx.insert("page", &doc.page_value());
        ctx.insert("collections", collections);
        ctx.insert("site_mode", self.mode.as_str());
        ctx
    }

    /// Body through the template engine, then markdown for `.md` documents.
    fn render_content(&self, doc: &Document, ctx: &Context) -> Result<String, GenerateError> {
        let rendered = self
            .tera
            .render(&document_template(doc), ctx)
            .map_err(|e| render_error(&doc.input_path, &e))?;
        Ok(match doc.format {
            TemplateFormat::Markdown => markdown::markdown_to_html(&rendered),
            TemplateFormat::Html | TemplateFormat::Tera => rendered,
        })
    }

    fn apply_layouts(
        &self,
        doc: &Document,
        ctx: &mut Context,
        mut content: String,
    ) -> Result<String, GenerateError> {
        for key in self.layout_chain(&doc.input_path, doc.layout.as_deref())? {
            ctx.insert("content", &content);
            content = self
                .tera
                .render(&layout_template(key), ctx)
                .map_err(|e| render_error(&doc.input_path, &e))?;
        }
        Ok(content)
    }
}

/// Output file for a page url, relative to the output directory.
///
/// `/a/b/` → `a/b/index.html`, `/` → `index.html`, `/feed.xml` → `feed.xml`.
/// Only plain path segments are kept, so the result never leaves the output
/// directory.
pub fn url_to_output_path(url: &str) -> PathBuf {
    let mut path: PathBuf = Path::new(url)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if path.as_os_str().is_empty() || url.ends_with('/') {
        path.push("index.html");
    }
    path
}

/// Write rendered pages and copy passthrough files into `output`.
pub fn write_site(
    input: &Path,
    output: &Path,
    pages: &[RenderedPage],
    passthrough_files: &[String],
) -> Result<BuildReport, GenerateError> {
    fs::create_dir_all(output)?;

    let written: Vec<(String, String)> = pages
        .par_iter()
        .filter_map(|page| page.url.as_deref().map(|url| (page, url_to_output_path(url))))
        .map(|(page, rel)| {
            let dest = output.join(&rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &page.html)?;
            Ok((
                page.input_path.clone(),
                rel.to_string_lossy().replace('\\', "/"),
            ))
        })
        .collect::<Result<_, std::io::Error>>()?;

    let unwritten: Vec<String> = pages
        .iter()
        .filter(|p| p.url.is_none())
        .map(|p| p.input_path.clone())
        .collect();

    let copied = passthrough::copy_files(input, output, passthrough_files)?;
    log::info!(
        "wrote {} pages, copied {} files to {}",
        written.len(),
        copied,
        output.display()
    );

    Ok(BuildReport {
        pages: written,
        unwritten,
        copied,
    })
}

/// Read the files under `dir` accepted by `keep` as `(relative path,
/// contents)`. A missing directory has no templates.
fn read_template_dir(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<(String, String)>, GenerateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut templates = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !keep(entry.path()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        templates.push((rel, fs::read_to_string(entry.path())?));
    }
    Ok(templates)
}

fn document_template(doc: &Document) -> String {
    format!("doc:{}", doc.input_path)
}

fn layout_template(rel: &str) -> String {
    format!("layout:{rel}")
}

fn strip_extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => path,
    }
}

fn render_error(path: &str, err: &tera::Error) -> GenerateError {
    GenerateError::Render {
        path: path.to_string(),
        message: error_chain(err),
    }
}

/// Tera keeps the useful part of an error in its source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
