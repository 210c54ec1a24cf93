//! The filter and shortcode tables handed to the template engine.
//!
//! Each entry is a name and a plain function pointer. [`install`] walks both
//! tables once when the renderer is built; nothing is registered anywhere
//! else. The adapters here only translate template values into the typed
//! arguments of [`crate::filters`] and [`crate::shortcodes`].
//!
//! | Filter | Template usage |
//! |--------|----------------|
//! | `formatDate` | `{{ page.date \| formatDate }}` |
//! | `isoDate` | `{{ page.date \| isoDate }}` |
//! | `readingTime` | `{{ content \| readingTime }}` |
//! | `pad` | `{{ loop.index \| pad(width=3) }}` |
//! | `getPreviousCollectionItem` | `{{ collections.writings \| getPreviousCollectionItem(page=page) }}` |
//! | `getNextCollectionItem` | `{{ collections.writings \| getNextCollectionItem(url="/a/") }}` |
//!
//! | Shortcode | Template usage |
//! |-----------|----------------|
//! | `figure` | `{{ figure(src="a.jpg", alt="…", caption="…", class="wide") }}` |
//! | `video` | `{{ video(src="a.mp4", poster="p.jpg", autoplay=true, loop=true, muted=false) }}` |

use crate::dates;
use crate::filters;
use crate::shortcodes::{self, VideoOptions};
use std::collections::HashMap;
use tera::{Tera, Value};

pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;
pub type ShortcodeFn = fn(&HashMap<String, Value>) -> tera::Result<Value>;

pub const FILTERS: &[(&str, FilterFn)] = &[
    ("formatDate", format_date),
    ("isoDate", iso_date),
    ("readingTime", reading_time),
    ("pad", pad),
    ("getPreviousCollectionItem", previous_collection_item),
    ("getNextCollectionItem", next_collection_item),
];

pub const SHORTCODES: &[(&str, ShortcodeFn)] = &[("figure", figure), ("video", video)];

/// Register every filter and shortcode on `tera`.
pub fn install(tera: &mut Tera) {
    for (name, filter) in FILTERS {
        tera.register_filter(name, *filter);
    }
    for (name, shortcode) in SHORTCODES {
        tera.register_function(name, *shortcode);
    }
}

// ============================================================================
// Filters
// ============================================================================

fn format_date(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let date = value.as_str().and_then(dates::parse_date);
    Ok(Value::String(filters::format_date(date.as_ref())))
}

fn iso_date(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let date = value.as_str().and_then(dates::parse_date);
    Ok(Value::String(filters::iso_date(date.as_ref())))
}

fn reading_time(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(filters::reading_time(
        value.as_str().unwrap_or_default(),
    )))
}

fn pad(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let width = args.get("width").and_then(Value::as_u64).unwrap_or(2) as usize;
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(filters::pad(text, width)))
}

fn previous_collection_item(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let found = lookup_args(value, args)
        .and_then(|(items, current)| filters::previous_item(items, current, item_url));
    Ok(found.cloned().unwrap_or(Value::Null))
}

fn next_collection_item(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let found = lookup_args(value, args)
        .and_then(|(items, current)| filters::next_item(items, current, item_url));
    Ok(found.cloned().unwrap_or(Value::Null))
}

/// The collection and current url for the neighbor filters. The current
/// page is given either as `page=<page object>` or `url="<url>"`.
fn lookup_args<'a>(
    value: &'a Value,
    args: &'a HashMap<String, Value>,
) -> Option<(&'a [Value], &'a str)> {
    let items = value.as_array()?;
    let current = args
        .get("url")
        .and_then(Value::as_str)
        .or_else(|| args.get("page").and_then(item_url))?;
    Some((items.as_slice(), current))
}

fn item_url(item: &Value) -> Option<&str> {
    item.get("url").and_then(Value::as_str)
}

// ============================================================================
// Shortcodes
// ============================================================================

fn figure(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let src = required_str(args, "figure", "src")?;
    let markup = shortcodes::figure(
        src,
        optional_str(args, "alt"),
        optional_str(args, "caption"),
        optional_str(args, "class"),
    );
    Ok(Value::String(markup.into_string()))
}

fn video(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let src = required_str(args, "video", "src")?;
    let options = VideoOptions {
        poster: args.get("poster").and_then(Value::as_str),
        autoplay: flag(args, "autoplay", false),
        looped: flag(args, "loop", false),
        muted: flag(args, "muted", true),
    };
    Ok(Value::String(shortcodes::video(src, &options).into_string()))
}

fn required_str<'a>(
    args: &'a HashMap<String, Value>,
    shortcode: &str,
    key: &str,
) -> tera::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg(format!("{shortcode}: missing required argument `{key}`")))
}

fn optional_str<'a>(args: &'a HashMap<String, Value>, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Boolean argument. Accepts `true`/`false` and their string forms.
fn flag(args: &HashMap<String, Value>, key: &str, default: bool) -> bool {
    match args.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s != "false" && !s.is_empty(),
        Some(Value::Null) | None => default,
        Some(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tera::Context;

    fn render(template: &str, context: &Context) -> tera::Result<String> {
        let mut tera = Tera::default();
        install(&mut tera);
        tera.add_raw_template("t", template)?;
        tera.render("t", context)
    }

    fn collection() -> Value {
        json!([
            {"url": "/writings/c/", "data": {"title": "C"}},
            {"url": "/writings/b/", "data": {"title": "B"}},
            {"url": "/writings/a/", "data": {"title": "A"}},
        ])
    }

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn tables_have_unique_names() {
        let mut names: Vec<&str> = FILTERS
            .iter()
            .map(|(n, _)| *n)
            .chain(SHORTCODES.iter().map(|(n, _)| *n))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 8);
    }

    #[test]
    fn format_date_null_is_empty() {
        assert_eq!(format_date(&Value::Null, &HashMap::new()).unwrap(), "");
        assert_eq!(format_date(&json!("garbage"), &HashMap::new()).unwrap(), "");
        assert_eq!(
            format_date(&json!("2025-01-15"), &HashMap::new()).unwrap(),
            "Jan 15, 2025"
        );
    }

    #[test]
    fn iso_date_from_string() {
        assert_eq!(
            iso_date(&json!("2025-01-15"), &HashMap::new()).unwrap(),
            "2025-01-15T00:00:00.000Z"
        );
        assert_eq!(iso_date(&Value::Null, &HashMap::new()).unwrap(), "");
    }

    #[test]
    fn reading_time_of_missing_content() {
        assert_eq!(
            reading_time(&Value::Null, &HashMap::new()).unwrap(),
            "1 min read"
        );
    }

    #[test]
    fn pad_default_and_explicit_width() {
        assert_eq!(pad(&json!(7), &HashMap::new()).unwrap(), "07");
        assert_eq!(pad(&json!(123), &HashMap::new()).unwrap(), "123");
        assert_eq!(pad(&json!(5), &args(&[("width", json!(3))])).unwrap(), "005");
        assert_eq!(pad(&json!("4"), &HashMap::new()).unwrap(), "04");
    }

    #[test]
    fn neighbors_by_page_object() {
        let items = collection();
        let page = args(&[("page", json!({"url": "/writings/b/"}))]);
        assert_eq!(
            previous_collection_item(&items, &page).unwrap()["url"],
            "/writings/c/"
        );
        assert_eq!(
            next_collection_item(&items, &page).unwrap()["url"],
            "/writings/a/"
        );
    }

    #[test]
    fn neighbors_at_edges_are_null() {
        let items = collection();
        let first = args(&[("url", json!("/writings/c/"))]);
        let last = args(&[("url", json!("/writings/a/"))]);
        assert!(previous_collection_item(&items, &first).unwrap().is_null());
        assert!(next_collection_item(&items, &last).unwrap().is_null());
    }

    #[test]
    fn neighbors_without_page_or_collection_are_null() {
        let items = collection();
        assert!(next_collection_item(&items, &HashMap::new()).unwrap().is_null());
        let page = args(&[("page", json!({"url": null}))]);
        assert!(next_collection_item(&items, &page).unwrap().is_null());
        let url = args(&[("url", json!("/writings/b/"))]);
        assert!(next_collection_item(&Value::Null, &url).unwrap().is_null());
    }

    #[test]
    fn figure_requires_src() {
        let err = figure(&args(&[("alt", json!("x"))])).unwrap_err();
        assert!(err.to_string().contains("src"));
    }

    #[test]
    fn video_flags_from_arguments() {
        let html = video(&args(&[
            ("src", json!("a.webm")),
            ("autoplay", json!(true)),
            ("loop", json!("true")),
            ("muted", json!(false)),
        ]))
        .unwrap();
        let html = html.as_str().unwrap();
        assert!(html.contains(" autoplay"));
        assert!(html.contains(" loop"));
        assert!(!html.contains("muted"));
    }

    #[test]
    fn installed_filters_render() {
        let mut ctx = Context::new();
        ctx.insert("date", "2025-01-15");
        ctx.insert("n", &7);
        ctx.insert("content", "<p>a few words</p>");
        let out = render(
            "{{ date | formatDate }}|{{ n | pad }}|{{ n | pad(width=4) }}|{{ content | readingTime }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "Jan 15, 2025|07|0007|1 min read");
    }

    #[test]
    fn installed_neighbor_filters_render() {
        let mut ctx = Context::new();
        ctx.insert("items", &collection());
        ctx.insert("page", &json!({"url": "/writings/c/"}));
        let template = concat!(
            "{% set prev = items | getPreviousCollectionItem(page=page) %}",
            "{% set next = items | getNextCollectionItem(page=page) %}",
            "{% if prev %}prev={{ prev.url }}{% else %}no-prev{% endif %} ",
            "{% if next %}next={{ next.data.title }}{% endif %}",
        );
        assert_eq!(render(template, &ctx).unwrap(), "no-prev next=B");
    }

    #[test]
    fn installed_shortcodes_render() {
        let out = render(
            r#"{{ figure(src="a.jpg", alt="alt text", caption="", class="") }}"#,
            &Context::new(),
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<figure><img src="a.jpg" alt="alt text" loading="lazy" decoding="async"></figure>"#
        );
    }

    #[test]
    fn missing_shortcode_src_fails_render() {
        assert!(render(r#"{{ video(poster="p.jpg") }}"#, &Context::new()).is_err());
    }
}
