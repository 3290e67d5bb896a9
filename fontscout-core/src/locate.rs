//! Discovery of `<link rel="stylesheet">` references in HTML.
//!
//! Scans `<link>` tags and reads their attributes individually instead of
//! trying to pin the attribute order in one pattern, so `href` before `rel`
//! and `rel` before `href` both match. Accepts only `rel="stylesheet"`
//! (case-insensitive) where the href ends in `.css`, optionally followed by
//! a query string.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*>").expect("valid regex"));

// One attribute; the same quote character must open and close the value.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static CSS_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.css(\?.*)?$").expect("valid regex"));

/// Whether a URL (raw or resolved) still looks like a stylesheet reference:
/// path ends in `.css`, optionally with a query string.
pub fn looks_like_css(url: &str) -> bool {
    CSS_HREF_RE.is_match(url)
}

/// Collect candidate stylesheet URLs from `html`, in document order, with
/// duplicates and empty hrefs discarded. Returned values are raw and may be
/// relative; callers resolve them before fetching.
pub fn find_stylesheets(html: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut found = Vec::new();

    for tag in LINK_TAG_RE.find_iter(html) {
        let mut rel: Option<String> = None;
        let mut href: Option<String> = None;
        for attr in ATTR_RE.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            match attr[1].to_ascii_lowercase().as_str() {
                "rel" => rel = Some(value.to_string()),
                "href" => href = Some(value.to_string()),
                _ => {}
            }
        }

        let is_stylesheet = rel
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("stylesheet"));
        if !is_stylesheet {
            continue;
        }
        let Some(href) = href else { continue };
        if href.is_empty() || !looks_like_css(&href) {
            continue;
        }
        if seen.insert(href.clone()) {
            found.push(href);
        }
    }

    found
}
