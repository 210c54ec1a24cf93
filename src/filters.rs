//! Template filters as plain functions.
//!
//! Every function here is pure and total: absent input produces a safe
//! default instead of an error. The Tera adapters in [`crate::library`]
//! convert template values into these typed arguments.

use crate::dates;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

/// Words per minute used by [`reading_time`].
pub const WORDS_PER_MINUTE: usize = 200;

/// `Jan 15, 2025`, or `""` when there is no date.
pub fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(dates::format_short).unwrap_or_default()
}

/// `2025-01-15T00:00:00.000Z`, or `""` when there is no date.
pub fn iso_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(dates::format_iso).unwrap_or_default()
}

/// Estimated reading time of rendered content: `"N min read"`.
///
/// Tags are stripped, the remaining text is split on whitespace, and the
/// token count is divided by [`WORDS_PER_MINUTE`], rounding up. Never less
/// than one minute.
pub fn reading_time(content: &str) -> String {
    let words = strip_html_tags(content).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Left-pad with `0` to at least `width` characters. Never truncates.
pub fn pad(value: impl Display, width: usize) -> String {
    format!("{value:0>width$}")
}

/// The item before the one whose url is `current`.
pub fn previous_item<'a, T>(
    items: &'a [T],
    current: &str,
    url_of: impl Fn(&T) -> Option<&str>,
) -> Option<&'a T> {
    let pos = items.iter().position(|i| url_of(i) == Some(current))?;
    pos.checked_sub(1).and_then(|p| items.get(p))
}

/// The item after the one whose url is `current`.
pub fn next_item<'a, T>(
    items: &'a [T],
    current: &str,
    url_of: impl Fn(&T) -> Option<&str>,
) -> Option<&'a T> {
    let pos = items.iter().position(|i| url_of(i) == Some(current))?;
    items.get(pos + 1)
}

/// Replace every complete `<...>` tag with a space.
///
/// Replacing rather than deleting keeps `<p>a</p><p>b</p>` at two words. A
/// `<` with no closing `>` is text and stays.
pub fn strip_html_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}
