//! HTTP surface for the discovery service.
//!
//! `POST /discover {"url": "..."}` runs a discovery and returns
//! `{status, fonts[]}`; `GET /progress` returns the latest step message for
//! pollers. The progress slot is shared across requests and overwritten per
//! step, matching the poll-for-progress UX of the form front end.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fontscout_config::FontscoutConfig;
use fontscout_core::{Discoverer, DiscoveryResult, ProgressSink, SharedProgress};
use fontscout_store::SqliteStore;

use crate::build_discoverer;

#[derive(Clone)]
struct AppState {
    discoverer: Arc<Discoverer>,
    progress: SharedProgress,
}

#[derive(Debug, Deserialize)]
struct DiscoverRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    message: String,
}

pub async fn serve(cfg: FontscoutConfig) -> Result<()> {
    let store = Arc::new(SqliteStore::connect(&cfg.store.database_url).await?);
    let discoverer = Arc::new(build_discoverer(&cfg, store)?);

    let state = AppState {
        discoverer,
        progress: SharedProgress::new(),
    };

    let app = Router::new()
        .route("/discover", post(discover))
        .route("/progress", get(progress))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind).await?;
    tracing::info!(addr = %cfg.server.bind, "server.listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn discover(
    State(state): State<AppState>,
    Json(req): Json<DiscoverRequest>,
) -> Result<Json<DiscoveryResult>, (StatusCode, String)> {
    state
        .discoverer
        .discover(&req.url, &state.progress)
        .await
        .map(Json)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))
}

async fn progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    Json(ProgressResponse {
        message: state.progress.get(),
    })
}
