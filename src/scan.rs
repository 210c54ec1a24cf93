//! Content discovery.
//!
//! Stage 1 of the build. Walks the input directory and sorts every file into
//! one of three buckets:
//!
//! - **ignored**: matched by the ignore rules, dotfiles, and the output
//!   directory
//! - **passthrough**: claimed by a passthrough declaration, copied verbatim
//! - **documents**: files whose extension is a configured template format
//!
//! The includes, layouts, and data directories are read by the renderer and
//! never hold documents. Passthrough declarations still apply inside them
//! (`_includes/styles/`).
//!
//! Anything else is skipped with a debug log line.
//!
//! ## Front Matter
//!
//! A document may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Atlas
//! year: 2024
//! featured: true
//! ---
//! Body text, itself a template.
//! ```
//!
//! `date`, `year`, `featured`, `draft`, `layout`, and `permalink` are lifted
//! into typed fields on [`Document`]; the full mapping stays available to
//! templates.
//!
//! ## URLs
//!
//! - `writings/first-light.md` → `/writings/first-light/`
//! - `writings/index.tera` → `/writings/`
//! - `index.md` → `/`
//! - `permalink: /feed.xml` overrides, `permalink: false` suppresses output
//!
//! Two documents resolving to the same URL is an error.

use crate::config::SiteConfig;
use crate::dates;
use crate::glob::{GlobError, GlobSet};
use crate::passthrough::Passthrough;
use crate::types::{Document, Permalink, TemplateFormat};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid glob: {0}")]
    Glob(#[from] GlobError),
    #[error("Input directory not found: {0}")]
    MissingInput(PathBuf),
    #[error("Invalid front matter in {path}: {source}")]
    FrontMatter {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Front matter in {0} must be a mapping")]
    FrontMatterShape(String),
    #[error("Invalid data file {path}: {message}")]
    DataFile { path: String, message: String },
    #[error("Permalink '{permalink}' in {path} leaves the output directory")]
    PermalinkEscapes { path: String, permalink: String },
    #[error("Duplicate output url {url}: {first} and {second}")]
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },
}

/// Everything discovery found, in input-path order.
#[derive(Debug, Default)]
pub struct Manifest {
    pub documents: Vec<Document>,
    /// Passthrough files relative to the input root.
    pub passthrough: Vec<String>,
    /// Global data from the data directory, keyed by file stem.
    pub data: Map<String, Value>,
}

/// Discover documents, passthrough files, and global data under the
/// project's input directory.
pub fn scan(root: &Path, config: &SiteConfig) -> Result<Manifest, ScanError> {
    let input = root.join(&config.dirs.input);
    if !input.is_dir() {
        return Err(ScanError::MissingInput(input));
    }

    let ignores = GlobSet::new(&config.ignores)?;
    let passthrough = Passthrough::new(&config.passthrough)?;
    let output = output_dir(root, &input, config);
    let reserved = reserved_dirs(config);

    let mut documents = Vec::new();
    let mut copies = Vec::new();

    let walker = WalkDir::new(&input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned(e, &input, output.as_deref(), &ignores));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_slash_path(entry.path(), &input);
        let rel_path = Path::new(&rel);

        if ignores.matches_within(rel_path) {
            log::debug!("ignored {rel}");
            continue;
        }
        if passthrough.matches(rel_path) {
            copies.push(rel);
            continue;
        }
        if reserved.iter().any(|r| rel_path.starts_with(r)) {
            continue;
        }

        let format = rel_path
            .extension()
            .map(|e| e.to_string_lossy())
            .filter(|e| config.is_template_format(e))
            .and_then(|e| TemplateFormat::from_extension(&e));
        match format {
            Some(format) => documents.push(read_document(entry.path(), rel, format)?),
            None => log::debug!("skipping non-template file {rel}"),
        }
    }

    passthrough.report_unmatched(&copies);
    check_unique_urls(&documents)?;

    let data = load_global_data(&input.join(&config.dirs.data))?;

    log::info!(
        "discovered {} documents, {} passthrough files",
        documents.len(),
        copies.len()
    );

    Ok(Manifest {
        documents,
        passthrough: copies,
        data,
    })
}

/// Directories (relative to input) that are never page sources.
fn reserved_dirs(config: &SiteConfig) -> Vec<PathBuf> {
    [
        &config.dirs.includes,
        &config.dirs.layouts,
        &config.dirs.data,
    ]
    .into_iter()
    .map(|d| normalize_dir(Path::new(d)))
    .collect()
}

/// The output directory relative to input, when it sits inside the input
/// tree.
fn output_dir(root: &Path, input: &Path, config: &SiteConfig) -> Option<PathBuf> {
    root.join(&config.dirs.output)
        .strip_prefix(input)
        .ok()
        .map(normalize_dir)
}

fn normalize_dir(dir: &Path) -> PathBuf {
    dir.components().filter(|c| *c != Component::CurDir).collect()
}

fn is_pruned(entry: &DirEntry, input: &Path, output: Option<&Path>, ignores: &GlobSet) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    let rel = PathBuf::from(relative_slash_path(entry.path(), input));
    output.is_some_and(|o| o == rel) || ignores.matches_within(&rel)
}

fn relative_slash_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_document(
    path: &Path,
    input_path: String,
    format: TemplateFormat,
) -> Result<Document, ScanError> {
    let raw = fs::read_to_string(path)?;
    let (front_matter, body) = split_front_matter(&raw);
    let data = parse_front_matter(front_matter, &input_path)?;

    let permalink = match data.get("permalink") {
        Some(Value::String(p)) => Permalink::Custom(normalize_permalink(p, &input_path)?),
        Some(Value::Bool(false)) => Permalink::Disabled,
        _ => Permalink::Derived,
    };
    let (derived_url, file_slug) = derive_url(&input_path);
    let url = match &permalink {
        Permalink::Derived => Some(derived_url),
        Permalink::Custom(p) => Some(p.clone()),
        Permalink::Disabled => None,
    };

    Ok(Document {
        url,
        file_slug,
        format,
        title: data.get("title").and_then(Value::as_str).map(String::from),
        date: extract_date(&data, &input_path),
        year: extract_year(&data, &input_path),
        featured: data.get("featured").and_then(Value::as_bool).unwrap_or(false),
        draft: data.get("draft").and_then(Value::as_bool).unwrap_or(false),
        layout: data.get("layout").and_then(Value::as_str).map(String::from),
        permalink,
        body: body.to_string(),
        data,
        input_path,
    })
}

/// Split a `---` fenced YAML block off the start of a file.
///
/// Returns `(None, raw)` when there is no complete fence.
pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, raw)
}

/// Parse a front matter block into a mapping. Empty or absent yields `{}`.
pub fn parse_front_matter(yaml: Option<&str>, path: &str) -> Result<Map<String, Value>, ScanError> {
    let Some(yaml) = yaml.filter(|y| !y.trim().is_empty()) else {
        return Ok(Map::new());
    };
    let value: Value = serde_yaml::from_str(yaml).map_err(|source| ScanError::FrontMatter {
        path: path.to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ScanError::FrontMatterShape(path.to_string())),
    }
}

fn extract_date(data: &Map<String, Value>, path: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match data.get("date") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = dates::parse_date(s);
            if parsed.is_none() {
                log::warn!("{path}: unparseable date '{s}', treating as undated");
            }
            parsed
        }
        Some(other) => {
            log::warn!("{path}: date must be a string, got {other}; treating as undated");
            None
        }
    }
}

fn extract_year(data: &Map<String, Value>, path: &str) -> Option<i64> {
    match data.get("year") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => {
            let parsed = s.trim().parse().ok();
            if parsed.is_none() {
                log::warn!("{path}: unparseable year '{s}', treating as 0");
            }
            parsed
        }
        Some(other) => {
            log::warn!("{path}: year must be a number, got {other}; treating as 0");
            None
        }
    }
}

/// Root a permalink at `/`. `..` segments are refused so every page lands
/// inside the output directory.
fn normalize_permalink(permalink: &str, path: &str) -> Result<String, ScanError> {
    let trimmed = permalink.trim();
    if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ScanError::PermalinkEscapes {
            path: path.to_string(),
            permalink: permalink.to_string(),
        });
    }
    Ok(if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    })
}

/// Derive `(url, file_slug)` from an input path.
pub fn derive_url(input_path: &str) -> (String, String) {
    let mut parts: Vec<&str> = input_path.split('/').filter(|s| !s.is_empty()).collect();
    let file = parts.pop().unwrap_or_default();
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem == "index" {
        let slug = parts.last().map(|s| s.to_string()).unwrap_or_default();
        let url = if parts.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", parts.join("/"))
        };
        (url, slug)
    } else {
        parts.push(&stem);
        (format!("/{}/", parts.join("/")), stem.clone())
    }
}

fn check_unique_urls(documents: &[Document]) -> Result<(), ScanError> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for doc in documents {
        let Some(url) = doc.url.as_deref() else {
            continue;
        };
        if let Some(first) = seen.insert(url, &doc.input_path) {
            return Err(ScanError::DuplicateUrl {
                url: url.to_string(),
                first: first.to_string(),
                second: doc.input_path.clone(),
            });
        }
    }
    Ok(())
}

/// Load `*.json`, `*.yaml`, and `*.yml` files from the data directory.
fn load_global_data(dir: &Path) -> Result<Map<String, Value>, ScanError> {
    let mut data = Map::new();
    if !dir.is_dir() {
        return Ok(data);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for path in files {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content = fs::read_to_string(&path)?;
        let parsed = match ext.as_str() {
            "json" => serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string()),
            _ => continue,
        };
        let value = parsed.map_err(|message| ScanError::DataFile {
            path: path.display().to_string(),
            message,
        })?;
        let key = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        data.insert(key, value);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{doc_by_path, setup_fixtures};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scan_default(root: &Path) -> Manifest {
        scan(root, &SiteConfig::default()).unwrap()
    }

    // =========================================================================
    // Front matter
    // =========================================================================

    #[test]
    fn split_front_matter_basic() {
        let (fm, body) = split_front_matter("---\ntitle: A\n---\nBody\n");
        assert_eq!(fm, Some("title: A\n"));
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn split_front_matter_crlf_and_bom() {
        let (fm, body) = split_front_matter("\u{feff}---\r\ntitle: A\r\n---\r\nBody");
        assert_eq!(fm, Some("title: A\r\n"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn split_front_matter_absent_or_unclosed() {
        assert_eq!(split_front_matter("# Heading"), (None, "# Heading"));
        assert_eq!(
            split_front_matter("---\ntitle: A\nno close"),
            (None, "---\ntitle: A\nno close")
        );
    }

    #[test]
    fn split_front_matter_empty_block() {
        assert_eq!(split_front_matter("---\n---\nBody"), (Some(""), "Body"));
    }

    #[test]
    fn front_matter_fields_are_typed() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "works/atlas.md",
            "---\ntitle: Atlas\nyear: 2023\nfeatured: true\ndraft: false\nlayout: work.html\n---\nText",
        );
        let manifest = scan_default(tmp.path());
        let d = doc_by_path(&manifest, "works/atlas.md");
        assert_eq!(d.title.as_deref(), Some("Atlas"));
        assert_eq!(d.year, Some(2023));
        assert!(d.featured);
        assert!(!d.draft);
        assert_eq!(d.layout.as_deref(), Some("work.html"));
        assert_eq!(d.body, "Text");
        assert_eq!(d.format, TemplateFormat::Markdown);
    }

    #[test]
    fn string_year_is_parsed() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "works/a.md", "---\nyear: \"2021\"\n---\n");
        let manifest = scan_default(tmp.path());
        assert_eq!(doc_by_path(&manifest, "works/a.md").year, Some(2021));
    }

    #[test]
    fn malformed_date_is_treated_as_missing() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "writings/a.md", "---\ndate: someday\n---\n");
        let manifest = scan_default(tmp.path());
        assert_eq!(doc_by_path(&manifest, "writings/a.md").date, None);
    }

    #[test]
    fn invalid_yaml_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "writings/a.md", "---\ntitle: [unclosed\n---\n");
        let result = scan(tmp.path(), &SiteConfig::default());
        assert!(matches!(result, Err(ScanError::FrontMatter { .. })));
    }

    #[test]
    fn non_mapping_front_matter_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "writings/a.md", "---\n- one\n- two\n---\n");
        let result = scan(tmp.path(), &SiteConfig::default());
        assert!(matches!(result, Err(ScanError::FrontMatterShape(_))));
    }

    // =========================================================================
    // URLs
    // =========================================================================

    #[test]
    fn derive_url_cases() {
        assert_eq!(
            derive_url("writings/first-light.md"),
            ("/writings/first-light/".to_string(), "first-light".to_string())
        );
        assert_eq!(
            derive_url("writings/index.tera"),
            ("/writings/".to_string(), "writings".to_string())
        );
        assert_eq!(derive_url("index.md"), ("/".to_string(), String::new()));
        assert_eq!(
            derive_url("about.html"),
            ("/about/".to_string(), "about".to_string())
        );
    }

    #[test]
    fn permalink_overrides_and_disables() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "feed.tera", "---\npermalink: feed.xml\n---\n");
        write(tmp.path(), "hidden.md", "---\npermalink: false\n---\n");
        let manifest = scan_default(tmp.path());

        let feed = doc_by_path(&manifest, "feed.tera");
        assert_eq!(feed.url.as_deref(), Some("/feed.xml"));
        assert_eq!(feed.permalink, Permalink::Custom("/feed.xml".into()));

        let hidden = doc_by_path(&manifest, "hidden.md");
        assert_eq!(hidden.url, None);
        assert_eq!(hidden.permalink, Permalink::Disabled);
    }

    #[test]
    fn permalink_with_parent_segments_is_error() {
        for permalink in ["/../escaped.html", "notes/../../up/", "..\\win.html"] {
            let tmp = TempDir::new().unwrap();
            write(tmp.path(), "page.md", &format!("---\npermalink: '{permalink}'\n---\n"));
            match scan(tmp.path(), &SiteConfig::default()) {
                Err(ScanError::PermalinkEscapes { path, .. }) => assert_eq!(path, "page.md"),
                other => panic!("expected escape error for {permalink}, got {other:?}"),
            }
        }
    }

    #[test]
    fn permalink_dots_inside_names_are_fine() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.md", "---\npermalink: /notes..old/index.html\n---\n");
        let manifest = scan_default(tmp.path());
        assert_eq!(
            doc_by_path(&manifest, "page.md").url.as_deref(),
            Some("/notes..old/index.html")
        );
    }

    #[test]
    fn duplicate_urls_are_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "about.md", "About");
        write(tmp.path(), "about/index.html", "About again");
        let result = scan(tmp.path(), &SiteConfig::default());
        assert!(matches!(result, Err(ScanError::DuplicateUrl { .. })));
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn fixtures_classification() {
        let tmp = setup_fixtures();
        let manifest = scan_default(tmp.path());

        let paths: Vec<&str> = manifest
            .documents
            .iter()
            .map(|d| d.input_path.as_str())
            .collect();

        // ignored by policy
        assert!(!paths.contains(&"README.md"));
        assert!(!paths.iter().any(|p| p.starts_with("docs/")));
        assert!(!paths.contains(&"CLAUDE.md"));
        assert!(!paths.iter().any(|p| p.starts_with("components/")));
        assert!(!paths.contains(&"writings.html"));
        assert!(!paths.iter().any(|p| p.contains("mockup")));
        // reserved directories are not pages
        assert!(!paths.iter().any(|p| p.starts_with("_includes/")));
        assert!(!paths.iter().any(|p| p.starts_with("_data/")));
        // passthrough files are not pages
        assert!(!paths.contains(&"index.html"));

        assert!(paths.contains(&"writings/first-light.md"));
        assert!(paths.contains(&"works/index.njk"));

        assert!(manifest.passthrough.contains(&"index.html".to_string()));
        assert!(
            manifest
                .passthrough
                .contains(&"assets/css/site.css".to_string())
        );
        assert!(
            manifest
                .passthrough
                .contains(&"vignettes/morning.jpg".to_string())
        );
        // passthrough reaches into the includes directory
        assert!(
            manifest
                .passthrough
                .contains(&"_includes/styles/base.css".to_string())
        );
    }

    #[test]
    fn documents_are_in_path_order() {
        let tmp = setup_fixtures();
        let manifest = scan_default(tmp.path());
        let paths: Vec<&String> = manifest.documents.iter().map(|d| &d.input_path).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn dotfiles_and_output_dir_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".hidden/page.md", "x");
        write(tmp.path(), "_site/old/index.html", "x");
        write(tmp.path(), "page.md", "x");
        let manifest = scan_default(tmp.path());
        let paths: Vec<&str> = manifest
            .documents
            .iter()
            .map(|d| d.input_path.as_str())
            .collect();
        assert_eq!(paths, vec!["page.md"]);
    }

    #[test]
    fn non_template_files_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "notes.txt", "x");
        write(tmp.path(), "page.md", "x");
        let manifest = scan_default(tmp.path());
        assert_eq!(manifest.documents.len(), 1);
        assert!(manifest.passthrough.is_empty());
    }

    #[test]
    fn template_formats_restrict_discovery() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.md", "x");
        write(tmp.path(), "b.html", "x");
        let mut config = SiteConfig::default();
        config.template_formats = vec!["md".into()];
        let manifest = scan(tmp.path(), &config).unwrap();
        assert_eq!(manifest.documents.len(), 1);
        assert_eq!(manifest.documents[0].input_path, "a.md");
    }

    #[test]
    fn missing_input_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.dirs.input = "src".into();
        assert!(matches!(
            scan(tmp.path(), &config),
            Err(ScanError::MissingInput(_))
        ));
    }

    // =========================================================================
    // Global data
    // =========================================================================

    #[test]
    fn global_data_loaded_by_stem() {
        let tmp = setup_fixtures();
        let manifest = scan_default(tmp.path());
        assert_eq!(manifest.data["metadata"]["title"], "Fixture Folio");
        assert_eq!(manifest.data["links"][0]["label"], "Mail");
    }

    #[test]
    fn invalid_data_file_is_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "_data/broken.json", "{ nope");
        let result = scan(tmp.path(), &SiteConfig::default());
        assert!(matches!(result, Err(ScanError::DataFile { .. })));
    }
}
