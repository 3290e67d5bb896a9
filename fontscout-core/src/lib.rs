//! Font discovery core.
//!
//! - `fonts`: `font-family` extraction and the deduplicating [`fonts::FontSet`]
//! - `resolve`: relative-to-absolute stylesheet URL resolution
//! - `locate`: `<link rel="stylesheet">` discovery in HTML
//! - `progress`: the polling progress-sink seam
//! - `discover`: the orchestrator tying page fetch, extraction, and
//!   persistence together
//!
//! Network and storage are reached only through the `Fetcher` and `SiteStore`
//! traits, so everything here is testable without I/O.

pub mod discover;
pub mod fonts;
pub mod locate;
pub mod progress;
pub mod resolve;

pub use discover::{Discoverer, DiscoverError, DiscoverySettings, DiscoveryResult, DiscoveryStatus};
pub use fonts::{extract_fonts, FontSet};
pub use locate::find_stylesheets;
pub use progress::{NullProgress, ProgressSink, SharedProgress};
pub use resolve::{resolve, ResolveError};
