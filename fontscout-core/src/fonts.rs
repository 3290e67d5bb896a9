//! `font-family` extraction from HTML and CSS text.
//!
//! Works on raw text with regexes rather than a CSS parser: a declaration is
//! `font-family`, optional whitespace, `:`, then everything up to the next
//! `;` or `}`. That holds for inline `style=` attributes, `<style>` blocks,
//! and stylesheet bodies alike.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Generic/system keywords never reported as discovered fonts.
pub const IGNORED_FAMILIES: &[&str] = &[
    "sans-serif",
    "inherit",
    "serif",
    "blink",
    "blinkmacsystemfont",
    "system-ui",
    "figtree",
    "star",
    "-apple-system",
];

static FONT_FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-family\s*:\s*([^;}]+)").expect("valid regex"));

// Matches the simple, non-nested case only; a var() with nested parens in its
// fallback is left alone.
static VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\s*\([^)]+\)").expect("valid regex"));

static IMPORTANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*!important\s*$").expect("valid regex"));

/// Set of discovered font names, deduplicated case-insensitively while
/// preserving the first-seen title-cased spelling and insertion order.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-normalized name. Returns `false` when a
    /// case-insensitive duplicate was already present.
    pub fn insert(&mut self, name: String) -> bool {
        if self.seen.insert(name.to_lowercase()) {
            self.names.push(name);
            true
        } else {
            false
        }
    }

    pub fn merge(&mut self, other: FontSet) {
        for name in other.names {
            self.insert(name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Scan markup or CSS for `font-family` declarations and collect the
/// declared names.
pub fn extract_fonts(text: &str) -> FontSet {
    let mut out = FontSet::new();
    for caps in FONT_FAMILY_RE.captures_iter(text) {
        let value = &caps[1];
        // Drop var() indirection entirely; whatever it resolves to is not
        // knowable from static text.
        let value = VAR_RE.replace_all(value, "");
        // A font-family value is a comma-separated fallback list.
        for piece in value.split(',') {
            if let Some(name) = normalize_family(piece) {
                out.insert(name);
            }
        }
    }
    out
}

/// Clean one fallback-list entry; `None` when it is empty or ignored.
fn normalize_family(piece: &str) -> Option<String> {
    let trimmed = piece.trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"');
    let trimmed = IMPORTANT_RE.replace(trimmed, "");
    let lower = trimmed.to_lowercase();
    if lower.is_empty() || IGNORED_FAMILIES.contains(&lower.as_str()) {
        return None;
    }
    Some(title_case(&trimmed))
}

/// Capitalize the first letter of each whitespace-separated word, leaving
/// the rest of the word untouched ("open sans" -> "Open Sans", "ARIAL"
/// stays "ARIAL").
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}
