//! HTTP fetch collaborator for font discovery.
//!
//! - [`Fetcher`] trait: `get(url, opts) -> FetchOutcome | FetchError`
//! - [`HttpFetcher`]: reqwest-backed implementation with a browser-like
//!   user-agent, capped redirect following, and a per-request TLS toggle
//! - Non-2xx responses are *not* errors here: the outcome carries the status
//!   code and the caller decides what a 404 means for its run
//!
//! There are deliberately no retries in this client; a failed discovery is
//! retried by the caller as a whole, never per request.
//!
//! Observability: structured `tracing` events for request start
//! (`http.request.start`), completion (`http.response`), and transport
//! failures (`http.network_error`), each tagged with a request id.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

/// User-agent sent by default; some sites serve different (or no) CSS to
/// clients that do not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Maximum redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

/// A completed HTTP exchange: status plus the full response body.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Per-request tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct FetchOpts {
    pub timeout: Duration,
    /// When `false`, certificate errors on the target site are ignored.
    pub verify_tls: bool,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            verify_tls: false,
        }
    }
}

/// Capability seam for anything that can fetch a URL.
///
/// The discovery orchestrator only talks to this trait, so tests can swap in
/// a canned-response fake without any network.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &Url, opts: FetchOpts) -> Result<FetchOutcome, FetchError>;
}

/// Reqwest-backed [`Fetcher`].
///
/// TLS verification is a client-level property in reqwest, so we hold two
/// pre-built clients and pick one per request based on `opts.verify_tls`.
#[derive(Clone)]
pub struct HttpFetcher {
    verifying: Client,
    lax: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, max_redirects: usize) -> Result<Self, FetchError> {
        let base = |accept_invalid: bool| {
            Client::builder()
                .user_agent(user_agent.to_string())
                .redirect(Policy::limited(max_redirects))
                .connect_timeout(Duration::from_secs(5))
                .danger_accept_invalid_certs(accept_invalid)
                .build()
                .map_err(|e| FetchError::Build(e.to_string()))
        };
        Ok(Self {
            verifying: base(false)?,
            lax: base(true)?,
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        // Building with known-good settings only fails if TLS backend init
        // fails, which is unrecoverable anyway.
        Self::new(DEFAULT_USER_AGENT, MAX_REDIRECTS).expect("default client build")
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &Url, opts: FetchOpts) -> Result<FetchOutcome, FetchError> {
        let client = if opts.verify_tls {
            &self.verifying
        } else {
            &self.lax
        };

        // Lightweight request id without extra deps
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        tracing::debug!(
            req_id=%req_id,
            host_path=%format!("{}{}", url.domain().unwrap_or("-"), url.path()),
            timeout_ms=opts.timeout.as_millis() as u64,
            verify_tls=opts.verify_tls,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = client
            .get(url.clone())
            .timeout(opts.timeout)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(
                    req_id=%req_id,
                    url=%url,
                    message=%err,
                    "http.network_error"
                );
                FetchError::Network {
                    url: url.to_string(),
                    message: err.to_string(),
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|err| {
            tracing::warn!(
                req_id=%req_id,
                url=%url,
                message=%err,
                "http.network_error.body"
            );
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        })?;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            body_len=body.len(),
            "http.response"
        );
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&body),
            "http.response.body_snippet"
        );

        Ok(FetchOutcome { status, body })
    }
}

fn snip_body(body: &str) -> String {
    let mut snip = body.to_string();
    if snip.len() > 500 {
        let mut end = 500;
        while !snip.is_char_boundary(end) {
            end -= 1;
        }
        snip.truncate(end);
        snip.push_str("...");
    }
    snip
}
