//! Discovery orchestrator: fetch the page, extract fonts, chase stylesheets,
//! merge, persist.
//!
//! One logical sequence per run; stylesheets are fetched one at a time. A
//! stylesheet that fails to resolve or fetch is skipped with a logged note
//! and never aborts the run. Persistence failures are reported as a warning
//! on an otherwise-successful result.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use fontscout_http::{FetchOpts, Fetcher};
use fontscout_store::SiteStore;

use crate::fonts::{extract_fonts, FontSet};
use crate::locate::{find_stylesheets, looks_like_css};
use crate::progress::ProgressSink;
use crate::resolve::resolve;

static HAS_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:f|ht)tps?://").expect("valid regex"));

#[derive(Debug, Error)]
pub enum DiscoverError {
    /// Malformed input URL; surfaced to the caller, never retried.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    /// At least one font was found somewhere, even if some stylesheets failed.
    Success,
    /// The primary page returned non-200 or a transport error.
    Unreachable,
    /// The page was reachable but declared no (non-ignored) fonts.
    NoFonts,
}

/// Outcome of one discovery run. Immutable once produced; re-running the
/// same URL produces a fresh result that replaces the stored one.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub url: String,
    pub status: DiscoveryStatus,
    pub fonts: Vec<String>,
    /// Set when the result could not be persisted; discovery itself still
    /// succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_warning: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoverySettings {
    pub page_timeout: Duration,
    pub stylesheet_timeout: Duration,
    /// Kept off by default to match the sites this tool is pointed at;
    /// see `fontscout.yaml` to turn verification on.
    pub verify_tls: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(30),
            stylesheet_timeout: Duration::from_secs(60),
            verify_tls: false,
        }
    }
}

pub struct Discoverer {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn SiteStore>,
    settings: DiscoverySettings,
}

impl Discoverer {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn SiteStore>) -> Self {
        Self {
            fetcher,
            store,
            settings: DiscoverySettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run discovery for one target URL, reporting each step to `progress`.
    pub async fn discover(
        &self,
        target_url: &str,
        progress: &dyn ProgressSink,
    ) -> Result<DiscoveryResult, DiscoverError> {
        let page_url = normalize_target(target_url)?;
        let url_key = page_url.to_string();

        progress.set(&format!("Starting font discovery for {url_key}"));
        tracing::info!(url = %url_key, "discover.start");

        progress.set(&format!("Attempting to access site at {url_key}"));
        let page = match self
            .fetcher
            .get(
                &page_url,
                FetchOpts {
                    timeout: self.settings.page_timeout,
                    verify_tls: self.settings.verify_tls,
                },
            )
            .await
        {
            Ok(outcome) if outcome.is_ok() => outcome,
            Ok(outcome) => {
                tracing::warn!(url = %url_key, status = %outcome.status, "discover.page.bad_status");
                progress.set(&format!(
                    "Unable to access the site. Status code: {}",
                    outcome.status.as_u16()
                ));
                return Ok(DiscoveryResult {
                    url: url_key,
                    status: DiscoveryStatus::Unreachable,
                    fonts: Vec::new(),
                    persist_warning: None,
                });
            }
            Err(err) => {
                tracing::warn!(url = %url_key, error = %err, "discover.page.unreachable");
                progress.set("Unable to access the site");
                return Ok(DiscoveryResult {
                    url: url_key,
                    status: DiscoveryStatus::Unreachable,
                    fonts: Vec::new(),
                    persist_warning: None,
                });
            }
        };

        progress.set("Extracting fonts from page");
        let mut fonts = extract_fonts(&page.body);
        tracing::info!(url = %url_key, count = fonts.len(), "discover.page.fonts");

        progress.set("Searching for linked stylesheets");
        let candidates = find_stylesheets(&page.body);
        tracing::info!(url = %url_key, count = candidates.len(), "discover.stylesheets.found");

        for candidate in candidates {
            self.process_stylesheet(&url_key, &candidate, &mut fonts, progress)
                .await;
        }

        if fonts.is_empty() {
            tracing::info!(url = %url_key, "discover.no_fonts");
            progress.set("No fonts discovered");
            return Ok(DiscoveryResult {
                url: url_key,
                status: DiscoveryStatus::NoFonts,
                fonts: Vec::new(),
                persist_warning: None,
            });
        }

        progress.set(&format!(
            "Font discovery completed. Total fonts found: {}",
            fonts.len()
        ));
        tracing::info!(url = %url_key, count = fonts.len(), "discover.done");

        let fonts = fonts.into_names();
        let persist_warning = self.persist(&url_key, &fonts).await;

        Ok(DiscoveryResult {
            url: url_key,
            status: DiscoveryStatus::Success,
            fonts,
            persist_warning,
        })
    }

    /// Resolve, re-validate, fetch, and extract one stylesheet candidate.
    /// Failures are logged and swallowed; one bad stylesheet must not abort
    /// discovery.
    async fn process_stylesheet(
        &self,
        base_url: &str,
        candidate: &str,
        fonts: &mut FontSet,
        progress: &dyn ProgressSink,
    ) {
        let resolved = match resolve(base_url, candidate) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(candidate, error = %err, "discover.stylesheet.resolve_failed");
                return;
            }
        };

        // The resolved form can stop looking like a CSS reference (e.g. an
        // absolute candidate pointing elsewhere); re-check before fetching.
        if !looks_like_css(resolved.as_str()) {
            tracing::info!(url = %resolved, "discover.stylesheet.skip_invalid");
            return;
        }

        progress.set(&format!("Processing stylesheet: {resolved}"));
        let outcome = self
            .fetcher
            .get(
                &resolved,
                FetchOpts {
                    timeout: self.settings.stylesheet_timeout,
                    verify_tls: self.settings.verify_tls,
                },
            )
            .await;

        match outcome {
            Ok(outcome) if outcome.is_ok() => {
                let found = extract_fonts(&outcome.body);
                tracing::info!(url = %resolved, count = found.len(), "discover.stylesheet.fonts");
                fonts.merge(found);
            }
            Ok(outcome) => {
                tracing::warn!(url = %resolved, status = %outcome.status, "discover.stylesheet.fetch_failed");
            }
            Err(err) => {
                tracing::warn!(url = %resolved, error = %err, "discover.stylesheet.fetch_failed");
            }
        }
    }

    /// Replace any prior record for the URL with this font list, keeping
    /// exactly one live record. Returns a warning message on failure instead
    /// of an error: the discovery result is still valid.
    async fn persist(&self, url: &str, fonts: &[String]) -> Option<String> {
        let result = async {
            let existing = self.store.find(url).await?;
            for record in &existing {
                self.store.delete(record.id).await?;
            }
            let id = self.store.put(url, fonts).await?;
            tracing::info!(url, id, replaced = existing.len(), "discover.persisted");
            Ok::<_, fontscout_store::StoreError>(())
        }
        .await;

        match result {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(url, error = %err, "discover.persist_failed");
                Some(format!("failed to store result: {err}"))
            }
        }
    }
}

/// Prepend `https://` to scheme-less input, then require a well-formed
/// host-bearing URL.
fn normalize_target(input: &str) -> Result<Url, DiscoverError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DiscoverError::InvalidUrl(input.to_string()));
    }
    let candidate = if HAS_SCHEME_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate).map_err(|_| DiscoverError::InvalidUrl(input.to_string()))?;
    if url.host_str().is_none() {
        return Err(DiscoverError::InvalidUrl(input.to_string()));
    }
    Ok(url)
}
