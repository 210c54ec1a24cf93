//! Build policy.
//!
//! Loads, validates, and merges `config.toml` from the project root. User
//! values are layered on top of the stock defaults, so a config file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! template_formats = ["md", "njk", "html", "tera"]
//!
//! ignores = ["docs/", "node_modules/", "README.md", ...]
//! passthrough = ["index.html", "assets/", ...]
//!
//! [dirs]
//! input = "."           # Content root, relative to the project root
//! output = "_site"      # Build output, relative to the project root
//! includes = "_includes" # Relative to input
//! layouts = "_includes/layouts" # Relative to input
//! data = "_data"        # Relative to input
//!
//! [collections]
//! writings = "writings/**/*.md"
//! works = "works/**/*.md"
//! vignettes = "vignettes/**/*.md"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Build Mode
//!
//! [`BuildMode`] is not part of the file: it comes from `FOLIO_ENV` or the
//! `--production` flag and is handed to the collection builder explicitly.

use crate::glob::{GlobError, GlobSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid glob in config: {0}")]
    Glob(#[from] GlobError),
}

/// File name of the project configuration, looked up in the project root.
pub const CONFIG_FILE: &str = "config.toml";

/// Template source formats the renderer understands.
pub const SUPPORTED_FORMATS: &[&str] = &["md", "njk", "html", "tera"];

/// Execution mode for a build.
///
/// Production hides drafts from the works collection and from the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    /// Environment variable that selects the mode.
    pub const ENV_VAR: &'static str = "FOLIO_ENV";

    /// Interpret the raw value of [`BuildMode::ENV_VAR`].
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("production") => BuildMode::Production,
            _ => BuildMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// File extensions processed as templates.
    pub template_formats: Vec<String>,
    /// Globs (relative to input) excluded from processing entirely.
    pub ignores: Vec<String>,
    /// Globs (relative to input) copied verbatim to the output tree.
    pub passthrough: Vec<String>,
    /// Directory layout.
    pub dirs: DirsConfig,
    /// Membership globs for the named collections.
    pub collections: CollectionsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            template_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
            ignores: [
                "docs/",
                "node_modules/",
                "CLAUDE.md",
                "README.md",
                "**/*-mockup.html",
                "writings.html",
                "works.html",
                "vignettes.html",
                "components/",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            passthrough: [
                "index.html",
                "assets/",
                "_includes/styles/",
                "writings/**/*.{jpg,jpeg,png,gif,svg,webp}",
                "works/**/*.{jpg,jpeg,png,gif,svg,webp,mp4,webm}",
                "vignettes/**/*.{jpg,jpeg,png,gif,svg,webp,mp4,webm}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dirs: DirsConfig::default(),
            collections: CollectionsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template_formats.is_empty() {
            return Err(ConfigError::Validation(
                "template_formats must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .template_formats
            .iter()
            .find(|f| !SUPPORTED_FORMATS.contains(&f.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "template_formats: unsupported format '{bad}' (expected one of {})",
                SUPPORTED_FORMATS.join(", ")
            )));
        }
        for (key, value) in [
            ("dirs.input", &self.dirs.input),
            ("dirs.output", &self.dirs.output),
            ("dirs.includes", &self.dirs.includes),
            ("dirs.layouts", &self.dirs.layouts),
            ("dirs.data", &self.dirs.data),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.dirs.output == self.dirs.input {
            return Err(ConfigError::Validation(
                "dirs.output must differ from dirs.input".into(),
            ));
        }

        GlobSet::new(&self.ignores)?;
        GlobSet::new(&self.passthrough)?;
        self.collections.globs()?;
        Ok(())
    }

    /// Whether files with this extension are rendered as templates.
    pub fn is_template_format(&self, ext: &str) -> bool {
        self.template_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(ext))
    }
}

/// Directory roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsConfig {
    pub input: String,
    pub output: String,
    pub includes: String,
    pub layouts: String,
    pub data: String,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            input: ".".to_string(),
            output: "_site".to_string(),
            includes: "_includes".to_string(),
            layouts: "_includes/layouts".to_string(),
            data: "_data".to_string(),
        }
    }
}

/// Membership glob per named collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionsConfig {
    pub writings: String,
    pub works: String,
    pub vignettes: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            writings: "writings/**/*.md".to_string(),
            works: "works/**/*.md".to_string(),
            vignettes: "vignettes/**/*.md".to_string(),
        }
    }
}

/// Compiled membership globs, one per collection.
#[derive(Debug, Clone)]
pub struct CollectionGlobs {
    pub writings: GlobSet,
    pub works: GlobSet,
    pub vignettes: GlobSet,
}

impl CollectionsConfig {
    pub fn globs(&self) -> Result<CollectionGlobs, GlobError> {
        Ok(CollectionGlobs {
            writings: GlobSet::new([&self.writings])?,
            works: GlobSet::new([&self.works])?,
            vignettes: GlobSet::new([&self.vignettes])?,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value,
/// so arrays like `ignores` are replaced wholesale rather than appended.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    log::debug!(
        "loaded config: input={} output={}",
        config.dirs.input,
        config.dirs.output
    );
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Arrays replace the defaults wholesale; tables merge key by key.
# Unknown keys will cause an error.

# File extensions rendered as templates. Markdown and HTML bodies go through
# the template engine first, then markdown is converted to HTML. `njk` files
# are rendered as Tera templates.
template_formats = ["md", "njk", "html", "tera"]

# Paths (globs relative to dirs.input) excluded from processing.
ignores = [
    # Documentation with example shortcode syntax
    "docs/",
    "node_modules/",
    # Project meta-documents
    "CLAUDE.md",
    "README.md",
    # Visual mockups
    "**/*-mockup.html",
    # Listing pages now generated from collections
    "writings.html",
    "works.html",
    "vignettes.html",
    # Reusable HTML fragments, not standalone pages
    "components/",
]

# Paths (globs relative to dirs.input) copied verbatim to the output.
passthrough = [
    "index.html",
    "assets/",
    # Stylesheets live next to the includes but are served as files
    "_includes/styles/",
    "writings/**/*.{jpg,jpeg,png,gif,svg,webp}",
    "works/**/*.{jpg,jpeg,png,gif,svg,webp,mp4,webm}",
    "vignettes/**/*.{jpg,jpeg,png,gif,svg,webp,mp4,webm}",
]

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[dirs]
input = "."            # relative to the project root
output = "_site"       # relative to the project root
includes = "_includes" # relative to input
layouts = "_includes/layouts" # relative to input
data = "_data"         # relative to input

# ---------------------------------------------------------------------------
# Collections (membership globs, relative to dirs.input)
# ---------------------------------------------------------------------------
[collections]
writings = "writings/**/*.md"    # newest first
works = "works/**/*.md"          # featured first, then newest year
vignettes = "vignettes/**/*.md"  # newest first
"##
}
