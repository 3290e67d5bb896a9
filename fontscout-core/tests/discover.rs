//! End-to-end orchestrator tests with canned fetch responses and an
//! in-process store. No network, no database file.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use fontscout_core::{Discoverer, DiscoveryStatus, NullProgress, ProgressSink, SharedProgress};
use fontscout_http::{FetchError, FetchOpts, FetchOutcome, Fetcher};
use fontscout_store::{MemoryStore, SiteRecord, SiteStore, StoreError};

enum Canned {
    Ok(u16, &'static str),
    TransportError,
}

/// Fetcher that serves canned bodies by exact URL and records every request.
struct FakeFetcher {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn new(responses: Vec<(&str, Canned)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(url, canned)| (url.to_string(), canned))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &Url, _opts: FetchOpts) -> Result<FetchOutcome, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some(Canned::Ok(status, body)) => Ok(FetchOutcome {
                status: reqwest::StatusCode::from_u16(*status).unwrap(),
                body: (*body).to_string(),
            }),
            Some(Canned::TransportError) | None => Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Store whose writes always fail, for the persistence-warning path.
struct BrokenStore;

#[async_trait]
impl SiteStore for BrokenStore {
    async fn find(&self, _url: &str) -> Result<Vec<SiteRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn put(&self, _url: &str, _fonts: &[String]) -> Result<i64, StoreError> {
        let bad_json = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        Err(StoreError::Payload(bad_json))
    }

    async fn delete(&self, _id: i64) -> Result<(), StoreError> {
        Ok(())
    }
}

fn discoverer(fetcher: FakeFetcher, store: Arc<dyn SiteStore>) -> Discoverer {
    Discoverer::new(Arc::new(fetcher), store)
}

#[tokio::test]
async fn inline_font_only_page_succeeds_with_one_write() {
    let fetcher = FakeFetcher::new(vec![(
        "https://site.test/",
        Canned::Ok(200, "<style>body { font-family: Roboto; }</style>"),
    )]);
    let store = Arc::new(MemoryStore::new());
    let result = discoverer(fetcher, store.clone())
        .discover("https://site.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.status, DiscoveryStatus::Success);
    assert_eq!(result.fonts, vec!["Roboto"]);
    assert!(result.persist_warning.is_none());

    let records = store.find("https://site.test/").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fonts, vec!["Roboto"]);
}

#[tokio::test]
async fn unreachable_site_is_reported_and_never_persisted() {
    let store = Arc::new(MemoryStore::new());

    for _ in 0..2 {
        let fetcher = FakeFetcher::new(vec![("https://down.test/", Canned::TransportError)]);
        let result = discoverer(fetcher, store.clone())
            .discover("down.test", &NullProgress)
            .await
            .unwrap();
        assert_eq!(result.status, DiscoveryStatus::Unreachable);
        assert!(result.fonts.is_empty());
    }

    assert!(store.find("https://down.test/").await.unwrap().is_empty());
}

#[tokio::test]
async fn non_200_page_is_unreachable() {
    let fetcher = FakeFetcher::new(vec![("https://gone.test/", Canned::Ok(404, "not here"))]);
    let store = Arc::new(MemoryStore::new());
    let result = discoverer(fetcher, store.clone())
        .discover("https://gone.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.status, DiscoveryStatus::Unreachable);
    assert!(store.find("https://gone.test/").await.unwrap().is_empty());
}

#[tokio::test]
async fn page_without_fonts_reports_no_fonts_and_writes_nothing() {
    let fetcher = FakeFetcher::new(vec![(
        "https://plain.test/",
        Canned::Ok(200, "<html><body>hello</body></html>"),
    )]);
    let store = Arc::new(MemoryStore::new());
    let result = discoverer(fetcher, store.clone())
        .discover("plain.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.status, DiscoveryStatus::NoFonts);
    assert!(store.find("https://plain.test/").await.unwrap().is_empty());
}

#[tokio::test]
async fn one_bad_stylesheet_does_not_abort_the_others() {
    let page = r#"
        <link rel="stylesheet" href="/a.css">
        <link rel="stylesheet" href="/broken.css">
        <link rel="stylesheet" href="/c.css">
    "#;
    let fetcher = FakeFetcher::new(vec![
        ("https://site.test/", Canned::Ok(200, page)),
        ("https://site.test/a.css", Canned::Ok(200, "p { font-family: Lato; }")),
        ("https://site.test/broken.css", Canned::TransportError),
        ("https://site.test/c.css", Canned::Ok(200, "p { font-family: Inter; }")),
    ]);
    let store = Arc::new(MemoryStore::new());
    let result = discoverer(fetcher, store)
        .discover("site.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.status, DiscoveryStatus::Success);
    assert_eq!(result.fonts, vec!["Lato", "Inter"]);
}

#[tokio::test]
async fn fonts_merge_case_insensitively_across_page_and_stylesheets() {
    let page = r#"
        <style>h1 { font-family: Arial; }</style>
        <link rel="stylesheet" href="main.css">
    "#;
    let fetcher = FakeFetcher::new(vec![
        ("https://site.test/", Canned::Ok(200, page)),
        (
            "https://site.test/main.css",
            Canned::Ok(200, "body { font-family: ARIAL, 'Open Sans'; }"),
        ),
    ]);
    let store = Arc::new(MemoryStore::new());
    let result = discoverer(fetcher, store)
        .discover("site.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.fonts, vec!["Arial", "Open Sans"]);
}

#[tokio::test]
async fn relative_stylesheets_are_fetched_absolute() {
    let page = r#"<link rel="stylesheet" href="../shared/fonts.css">"#;
    let fetcher = FakeFetcher::new(vec![
        ("https://site.test/blog/post/", Canned::Ok(200, page)),
        (
            "https://site.test/blog/shared/fonts.css",
            Canned::Ok(200, "p { font-family: Merriweather; }"),
        ),
    ]);
    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(fetcher);
    let result = Discoverer::new(fetcher.clone(), store)
        .discover("https://site.test/blog/post/", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.fonts, vec!["Merriweather"]);
    assert!(fetcher
        .calls()
        .contains(&"https://site.test/blog/shared/fonts.css".to_string()));
}

#[tokio::test]
async fn rerun_replaces_the_stored_record() {
    let store = Arc::new(MemoryStore::new());

    let fetcher = FakeFetcher::new(vec![(
        "https://site.test/",
        Canned::Ok(200, "<style>p { font-family: Lato; }</style>"),
    )]);
    discoverer(fetcher, store.clone())
        .discover("site.test", &NullProgress)
        .await
        .unwrap();
    let first = store.find("https://site.test/").await.unwrap();
    assert_eq!(first.len(), 1);

    let fetcher = FakeFetcher::new(vec![(
        "https://site.test/",
        Canned::Ok(200, "<style>p { font-family: Inter; }</style>"),
    )]);
    discoverer(fetcher, store.clone())
        .discover("site.test", &NullProgress)
        .await
        .unwrap();

    let second = store.find("https://site.test/").await.unwrap();
    assert_eq!(second.len(), 1);
    assert_ne!(second[0].id, first[0].id);
    assert_eq!(second[0].fonts, vec!["Inter"]);
}

#[tokio::test]
async fn persistence_failure_is_a_warning_not_an_error() {
    let fetcher = FakeFetcher::new(vec![(
        "https://site.test/",
        Canned::Ok(200, "<style>p { font-family: Lato; }</style>"),
    )]);
    let result = discoverer(fetcher, Arc::new(BrokenStore))
        .discover("site.test", &NullProgress)
        .await
        .unwrap();

    assert_eq!(result.status, DiscoveryStatus::Success);
    assert_eq!(result.fonts, vec!["Lato"]);
    assert!(result.persist_warning.is_some());
}

#[tokio::test]
async fn invalid_input_url_is_an_error() {
    let fetcher = FakeFetcher::new(vec![]);
    let err = discoverer(fetcher, Arc::new(MemoryStore::new()))
        .discover("   ", &NullProgress)
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn progress_slot_sees_the_final_step() {
    let fetcher = FakeFetcher::new(vec![(
        "https://site.test/",
        Canned::Ok(200, "<style>p { font-family: Lato; }</style>"),
    )]);
    let progress = SharedProgress::new();
    discoverer(fetcher, Arc::new(MemoryStore::new()))
        .discover("site.test", &progress)
        .await
        .unwrap();

    let last = progress.get();
    assert!(
        last.contains("Total fonts found: 1"),
        "unexpected final progress message: {last}"
    );
}
