//! Markdown to HTML.
//!
//! Document bodies are rendered by the template engine first and converted
//! here afterwards, so shortcode output arrives as raw HTML and passes
//! through unchanged.
//!
//! Enabled extensions: tables, footnotes, strikethrough, smart punctuation,
//! and `{#id .class}` heading attributes.
//!
//! ## Heading Anchors
//!
//! Second to fourth level headings get a stable `id` and become links to
//! themselves:
//!
//! ```html
//! <h2 id="field-notes" tabindex="-1"><a class="header-anchor" href="#field-notes">Field Notes</a></h2>
//! ```
//!
//! An explicit `{#id}` wins over the generated slug. Repeated slugs within a
//! page get `-1`, `-2`, ... suffixes.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use pulldown_cmark_escape::escape_html;
use std::collections::HashSet;

const ANCHORED: [HeadingLevel; 3] = [HeadingLevel::H2, HeadingLevel::H3, HeadingLevel::H4];

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let parser = Parser::new_ext(markdown, options);
    let events = anchor_headings(parser);

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Lowercase alphanumerics joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// A heading whose events are buffered until its end tag, so the slug can
/// be computed from its full text.
struct OpenHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    text: String,
    inner: Vec<Event<'a>>,
}

impl<'a> OpenHeading<'a> {
    fn push(&mut self, event: Event<'a>) {
        if let Event::Text(t) | Event::Code(t) = &event {
            self.text.push_str(t);
        }
        self.inner.push(event);
    }

    fn finish(self, taken: &mut HashSet<String>, out: &mut Vec<Event<'a>>) {
        let slug = match &self.id {
            Some(id) => {
                taken.insert(id.to_string());
                id.to_string()
            }
            None => {
                let base = slugify(&self.text);
                if base.is_empty() {
                    out.push(Event::Start(Tag::Heading {
                        level: self.level,
                        id: None,
                        classes: self.classes,
                        attrs: self.attrs,
                    }));
                    out.extend(self.inner);
                    out.push(Event::End(TagEnd::Heading(self.level)));
                    return;
                }
                unique_slug(taken, &base)
            }
        };

        let n = self.level as u8;
        let mut open = format!("<h{n} id=\"{}\" tabindex=\"-1\"", escape_attr(&slug));
        if !self.classes.is_empty() {
            let classes: Vec<&str> = self.classes.iter().map(|c| c.as_ref()).collect();
            open.push_str(&format!(" class=\"{}\"", escape_attr(&classes.join(" "))));
        }
        for (key, value) in &self.attrs {
            match value {
                Some(v) => open.push_str(&format!(" {}=\"{}\"", key, escape_attr(v))),
                None => open.push_str(&format!(" {key}")),
            }
        }
        open.push_str(&format!(
            "><a class=\"header-anchor\" href=\"#{}\">",
            escape_attr(&slug)
        ));

        out.push(Event::Html(open.into()));
        out.extend(self.inner);
        out.push(Event::Html(format!("</a></h{n}>\n").into()));
    }
}

fn anchor_headings<'a>(parser: Parser<'a>) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut taken = HashSet::new();
    let mut open: Option<OpenHeading<'a>> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) if ANCHORED.contains(&level) => {
                open = Some(OpenHeading {
                    level,
                    id,
                    classes,
                    attrs,
                    text: String::new(),
                    inner: Vec::new(),
                });
            }
            Event::End(TagEnd::Heading(level)) if open.as_ref().is_some_and(|h| h.level == level) => {
                if let Some(heading) = open.take() {
                    heading.finish(&mut taken, &mut events);
                }
            }
            event => match open.as_mut() {
                Some(heading) => heading.push(event),
                None => events.push(event),
            },
        }
    }

    events
}

fn unique_slug(taken: &mut HashSet<String>, base: &str) -> String {
    let mut slug = base.to_string();
    let mut n = 1;
    while !taken.insert(slug.clone()) {
        slug = format!("{base}-{n}");
        n += 1;
    }
    slug
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    // writing into a String cannot fail
    let _ = escape_html(&mut out, value);
    out
}
