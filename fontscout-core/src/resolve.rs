//! Resolution of possibly-relative stylesheet URLs against a base page URL.
//!
//! `url::Url::join` exists, but stylesheet hrefs in the wild include things
//! like `..//x.css` and `./a/../b.css` that we want collapsed exactly the
//! same way regardless of how the base was spelled, so the combination and
//! segment normalization are explicit here. Absolute candidates pass through
//! untouched.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The base page URL could not be parsed into scheme + host.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// The combined URL did not parse as a valid absolute URL.
    #[error("unresolvable candidate {candidate:?} against base {base:?}")]
    Unresolvable { base: String, candidate: String },
}

/// Resolve `candidate` (as found in markup) to an absolute URL given the
/// page it was found on.
pub fn resolve(base: &str, candidate: &str) -> Result<Url, ResolveError> {
    // Already absolute (has a scheme): pass through unchanged.
    if let Ok(abs) = Url::parse(candidate) {
        return Ok(abs);
    }

    // Scheme-relative: adopt the base's scheme, falling back to https when
    // the base does not yield one.
    if let Some(rest) = candidate.strip_prefix("//") {
        let scheme = Url::parse(base)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        return Url::parse(&format!("{scheme}://{rest}")).map_err(|_| {
            ResolveError::Unresolvable {
                base: base.to_string(),
                candidate: candidate.to_string(),
            }
        });
    }

    let parsed = Url::parse(base).map_err(|_| ResolveError::InvalidBaseUrl(base.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ResolveError::InvalidBaseUrl(base.to_string()))?;

    let combined = if candidate.starts_with('/') {
        // Root-relative.
        candidate.to_string()
    } else {
        // Relative to the directory of the base path.
        format!("{}/{}", dirname(parsed.path()), candidate)
    };

    let mut authority = host.to_string();
    if let Some(port) = parsed.port() {
        authority.push_str(&format!(":{port}"));
    }

    let resolved = format!(
        "{}://{}/{}",
        parsed.scheme(),
        authority,
        collapse_segments(&combined)
    );
    Url::parse(&resolved).map_err(|_| ResolveError::Unresolvable {
        base: base.to_string(),
        candidate: candidate.to_string(),
    })
}

/// Path up to (not including) the final `/`-separated component.
fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Split on `/`, drop empty and `.` segments, and let `..` pop the previous
/// retained segment. Popping past the root is a no-op.
fn collapse_segments(path: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            other => kept.push(other),
        }
    }
    kept.join("/")
}
