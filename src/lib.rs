//! # Folio
//!
//! A static site builder for a personal portfolio of writings, works, and
//! vignettes. Content is markdown, HTML, and Tera (`.njk`/`.tera`) files with
//! YAML front matter; pages are rendered with
//! [Tera](https://keats.github.io/tera/) templates and written to a plain
//! static tree.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      input/     →  Manifest        (filesystem → documents, passthrough, data)
//! 2. Render    Manifest   →  RenderedPage[]  (collections, templates, markdown)
//! 3. Write     pages      →  _site/          (pages + verbatim passthrough copies)
//! ```
//!
//! Every stage is recomputed from scratch on each invocation. Nothing is
//! cached between builds.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the input directory, parses front matter, loads global data |
//! | [`generate`] | Stages 2 and 3: renders every document through Tera and its layouts, writes the output |
//! | [`config`] | Build policy: `config.toml` loading, stock defaults, validation, build mode |
//! | [`passthrough`] | Passthrough registrar: files copied verbatim instead of rendered |
//! | [`collections`] | Collection builder: `writings`, `works`, `vignettes` ordering and visibility |
//! | [`filters`] | Template filters as plain functions: dates, reading time, padding, neighbors |
//! | [`markdown`] | Markdown to HTML with heading anchors |
//! | [`shortcodes`] | Fixed-structure HTML fragments: `figure`, `video` |
//! | [`library`] | The name → function tables installed into the template engine |
//! | [`glob`] | Path glob matching for ignores, passthrough, and collection membership |
//! | [`dates`] | Front matter date parsing and display formats |
//! | [`types`] | Shared types (`Document`) passed between stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Collections Are Pure Functions
//!
//! A collection is a filtered, stably sorted `Vec<&Document>` computed from
//! the discovered documents and the build mode. The builder never reads the
//! environment; `main` resolves the mode once and passes it down.
//!
//! ## Filters and Shortcodes Are a Lookup Table
//!
//! Template helpers are ordinary Rust functions listed by name in
//! [`library::FILTERS`] and [`library::SHORTCODES`]. The renderer installs
//! both tables into its Tera instance when it is built. Shortcode HTML is
//! produced with [Maud](https://maud.lambda.xyz/), so its structure is
//! checked at compile time and interpolated text is escaped.
//!
//! ## Passthrough Wins Over Rendering
//!
//! A file claimed by a passthrough declaration is copied byte-for-byte even
//! when its extension is a template format. The hand-written `index.html`
//! landing page relies on this.

pub mod collections;
pub mod config;
pub mod dates;
pub mod filters;
pub mod generate;
pub mod glob;
pub mod library;
pub mod markdown;
pub mod output;
pub mod passthrough;
pub mod scan;
pub mod shortcodes;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
