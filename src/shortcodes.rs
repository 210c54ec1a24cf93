//! HTML shortcodes.
//!
//! Both fragments have a fixed structure that stylesheets and visual
//! regression snapshots depend on. Attribute order and nesting must not
//! change.
//!
//! ```html
//! <figure class="wide"><img src="a.jpg" alt="Alt" loading="lazy" decoding="async"><figcaption>Caption</figcaption></figure>
//!
//! <video poster="p.jpg" autoplay loop muted playsinline><source src="a.mp4" type="video/mp4">Your browser does not support the video tag.</video>
//! ```
//!
//! Each fragment is emitted on a single line so a shortcode on its own line
//! in markdown stays one raw HTML block. Attribute values are escaped by
//! maud; the figure caption is trusted HTML.

use maud::{Markup, PreEscaped, html};
use std::path::Path;

/// Fallback text rendered inside `<video>` for browsers without support.
pub const VIDEO_FALLBACK: &str = "Your browser does not support the video tag.";

/// Captioned, lazily loaded image.
///
/// Empty `caption` omits `<figcaption>`; empty `class` omits the attribute.
/// The caption is inserted as HTML so it can carry links and emphasis.
pub fn figure(src: &str, alt: &str, caption: &str, class: &str) -> Markup {
    let class = (!class.is_empty()).then_some(class);
    html! {
        figure class=[class] {
            img src=(src) alt=(alt) loading="lazy" decoding="async";
            @if !caption.is_empty() {
                figcaption { (PreEscaped(caption)) }
            }
        }
    }
}

/// Playback options for [`video`].
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOptions<'a> {
    pub poster: Option<&'a str>,
    pub autoplay: bool,
    pub looped: bool,
    pub muted: bool,
}

impl Default for VideoOptions<'_> {
    fn default() -> Self {
        Self {
            poster: None,
            autoplay: false,
            looped: false,
            muted: true,
        }
    }
}

/// Inline video with a single `<source>` and fallback text.
pub fn video(src: &str, options: &VideoOptions) -> Markup {
    let poster = options.poster.filter(|p| !p.is_empty());
    html! {
        video poster=[poster] autoplay[options.autoplay] loop[options.looped] muted[options.muted] playsinline {
            source src=(src) type=(video_mime_type(src));
            (VIDEO_FALLBACK)
        }
    }
}

/// MIME type for a video source, by extension. Defaults to `video/mp4`.
pub fn video_mime_type(src: &str) -> &'static str {
    let ext = Path::new(src.split(['?', '#']).next().unwrap_or(src))
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "webm" => "video/webm",
        "ogv" | "ogg" => "video/ogg",
        "mov" => "video/quicktime",
        _ => "video/mp4",
    }
}
